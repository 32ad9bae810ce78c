use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::debug;

use super::Parser;
use crate::elements::ElementCategory;
use crate::error::ParseError;
use crate::keyword::normalize;
use crate::text::{is_dash, is_numeric, lenient_int};
use crate::token::{Token, TokenCategory, TokenFilter, TokenId};

const EPISODE_NUMBER_MAX: i64 = 1899;
const VOLUME_NUMBER_MAX: i64 = 20;

// ── Regex patterns (compiled once) ──────────────────────────────

static RE_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,4})[vV](\d)$").unwrap());

static RE_MULTI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,4})(?:[vV](\d))?[-~&+](\d{1,4})(?:[vV](\d))?$").unwrap()
});

static RE_SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^S?(\d{1,2})(?:-S?(\d{1,2}))?(?:x|[ ._\-x]?E)(\d{1,4})(?:-E?(\d{1,4}))?(?:[vV](\d))?$")
        .unwrap()
});

static RE_FRACTIONAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\.5$").unwrap());

static RE_NUMBER_SIGN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(\d{1,4})(?:[-~&+](\d{1,4}))?(?:[vV](\d))?$").unwrap()
});

static RE_JAPANESE_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,4})話$").unwrap());

static RE_VOLUME_SINGLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[vV](\d)$").unwrap());

static RE_VOLUME_MULTI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[-~&+](\d{1,2})(?:[vV](\d))?$").unwrap());

type NumberSearch<'a> = fn(&mut Parser<'a>, &[TokenId]) -> Result<bool, ParseError>;

fn is_valid_episode_number(number: &str) -> bool {
    lenient_int(number) <= EPISODE_NUMBER_MAX
}

fn is_valid_volume_number(number: &str) -> bool {
    number
        .parse::<i64>()
        .is_ok_and(|n| n <= VOLUME_NUMBER_MAX)
}

fn first_digit(s: &str) -> Option<usize> {
    s.find(|c: char| c.is_ascii_digit())
}

fn group<'t>(caps: &Captures<'t>, i: usize) -> Option<&'t str> {
    caps.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

impl<'a> Parser<'a> {
    /// Pass 3: find the episode number.
    ///
    /// Token-shape patterns run first; plain numbers are then tried by a
    /// chain of position heuristics until one of them sets a number.
    pub(super) fn search_for_episode_number(&mut self) -> Result<(), ParseError> {
        let candidates = self.unknown_ids();
        if candidates.is_empty() {
            return Ok(());
        }
        self.check_alt_number = self.elements.contains(ElementCategory::EpisodeNumber);

        if self.search_for_episode_patterns(&candidates)? {
            return Ok(());
        }
        if self.elements.contains(ElementCategory::EpisodeNumber) {
            return Ok(());
        }

        let numeric: Vec<TokenId> = candidates
            .into_iter()
            .filter(|&id| is_numeric(&self.tokens[id].content))
            .collect();
        if numeric.is_empty() {
            return Ok(());
        }

        let searches: [(&str, NumberSearch<'a>); 4] = [
            ("equivalent", Self::search_for_equivalent_numbers),
            ("separated", Self::search_for_separated_numbers),
            ("isolated", Self::search_for_isolated_episode_numbers),
            ("last", Self::search_for_last_number),
        ];
        for (rule, search) in searches {
            if search(self, &numeric)? {
                debug!(rule, episode = ?self.elements.episode_number, "Episode number found");
                return Ok(());
            }
        }
        Ok(())
    }

    fn search_for_episode_patterns(&mut self, ids: &[TokenId]) -> Result<bool, ParseError> {
        for &id in ids {
            let content = self.tokens[id].content.clone();
            let numeric_front = content.starts_with(|c: char| c.is_ascii_digit());

            if !numeric_front {
                if self.number_comes_after_prefix(ElementCategory::EpisodePrefix, id)? {
                    return Ok(true);
                }
                if self.number_comes_after_prefix(ElementCategory::VolumePrefix, id)? {
                    continue;
                }
                if self.number_comes_after_prefix(ElementCategory::AnimeSeasonPrefix, id)? {
                    continue;
                }
            } else if self.number_comes_before_another_number(id)? {
                return Ok(true);
            }

            if self.match_episode_pattern(&content, id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A keyword such as "EP" or "Vol" fused to its number.
    fn number_comes_after_prefix(
        &mut self,
        category: ElementCategory,
        id: TokenId,
    ) -> Result<bool, ParseError> {
        let content = self.tokens[id].content.clone();
        let Some(begin) = first_digit(&content) else {
            return Ok(false);
        };
        let (prefix, number) = content.split_at(begin);
        if self.keywords.find(&normalize(prefix), category).is_none() {
            return Ok(false);
        }

        match category {
            ElementCategory::EpisodePrefix => {
                if self.match_episode_pattern(number, id)? {
                    return Ok(true);
                }
                Ok(self.set_episode_number(number, id, false))
            }
            ElementCategory::VolumePrefix => {
                if self.match_volume_pattern(number, id) {
                    return Ok(true);
                }
                Ok(self.set_volume_number(number, id, false))
            }
            ElementCategory::AnimeSeasonPrefix => Ok(self.set_season_number(number, id)),
            _ => Ok(false),
        }
    }

    /// "01 & 02" or "01 of 24".
    fn number_comes_before_another_number(&mut self, id: TokenId) -> Result<bool, ParseError> {
        let Some(separator) = self.next_word(id)? else {
            return Ok(false);
        };
        let separator_text = self.tokens[separator].content.clone();
        if separator_text != "&" && separator_text != "of" {
            return Ok(false);
        }
        let Some(other) = self.next_word(separator)? else {
            return Ok(false);
        };
        if !is_numeric(&self.tokens[other].content) {
            return Ok(false);
        }

        let number = self.tokens[id].content.clone();
        self.set_episode_number(&number, id, false);
        if separator_text == "&" {
            let other_number = self.tokens[other].content.clone();
            self.set_episode_number(&other_number, other, false);
        }
        self.claim(separator);
        self.claim(other);
        Ok(true)
    }

    /// "Title 12 (24)": two bracket-separated numbers; the smaller one is the
    /// episode number and the other the alternative.
    fn search_for_equivalent_numbers(&mut self, ids: &[TokenId]) -> Result<bool, ParseError> {
        for &id in ids {
            let content = self.tokens[id].content.clone();
            if self.tokens.is_isolated(id)? || !is_valid_episode_number(&content) {
                return Ok(false);
            }

            let Some(bracket) = self.next_word(id)? else {
                continue;
            };
            if !self.tokens[bracket].is(TokenCategory::Bracket) {
                continue;
            }
            let Some(next) = self
                .tokens
                .next(bracket, TokenFilter::NOT_DELIMITER.enclosed())?
            else {
                continue;
            };
            let next_content = self.tokens[next].content.clone();
            if !self.tokens[next].is(TokenCategory::Unknown)
                || !self.tokens.is_isolated(next)?
                || !is_numeric(&next_content)
                || !is_valid_episode_number(&next_content)
            {
                continue;
            }

            let (Ok(other), Ok(this)) = (next_content.parse::<i64>(), content.parse::<i64>()) else {
                continue;
            };
            let ((episode, episode_id), (alt, alt_id)) = if other > this {
                ((content, id), (next_content, next))
            } else {
                ((next_content, next), (content, id))
            };
            self.set_episode_number(&episode, episode_id, false);
            self.elements.insert(ElementCategory::EpisodeNumberAlt, alt);
            self.claim(alt_id);
            return Ok(true);
        }
        Ok(false)
    }

    /// "Title - 05": a number right after a dash.
    fn search_for_separated_numbers(&mut self, ids: &[TokenId]) -> Result<bool, ParseError> {
        for &id in ids {
            let Some(prev) = self.previous_word(id)? else {
                return Ok(false);
            };
            if self.tokens[id].enclosed {
                continue;
            }
            let token = &self.tokens[prev];
            if token.is(TokenCategory::Unknown) && is_dash(&token.content) {
                let number = self.tokens[id].content.clone();
                if self.set_episode_number(&number, id, true) {
                    self.claim(prev);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// "Title [05]": a number alone inside its brackets.
    fn search_for_isolated_episode_numbers(&mut self, ids: &[TokenId]) -> Result<bool, ParseError> {
        for &id in ids {
            if !self.tokens[id].enclosed || !self.tokens.is_isolated(id)? {
                continue;
            }
            let number = self.tokens[id].content.clone();
            if self.set_episode_number(&number, id, true) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// "Title 05": the last free-standing number that is not part of the
    /// leading text.
    fn search_for_last_number(&mut self, ids: &[TokenId]) -> Result<bool, ParseError> {
        for &id in ids.iter().rev() {
            let position = self.tokens.position(id)?;
            if position == 0 || self.tokens[id].enclosed {
                continue;
            }
            let leading_only = self.tokens.iter().take(position).all(|(_, t)| {
                t.enclosed || t.is(TokenCategory::Delimiter)
            });
            if leading_only {
                continue;
            }
            if let Some(prev) = self.previous_word(id)? {
                let token = &self.tokens[prev];
                let word = token.content.to_uppercase();
                if token.is(TokenCategory::Unknown) && (word == "MOVIE" || word == "PART") {
                    continue;
                }
            }
            let number = self.tokens[id].content.clone();
            if self.set_episode_number(&number, id, true) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Record an episode number and claim its token.
    ///
    /// When an episode number was already known before this pass, the two
    /// are ranked: the smaller one stays the episode number and the larger
    /// becomes the alternative. An equal number is rejected.
    pub(super) fn set_episode_number(&mut self, number: &str, id: TokenId, validate: bool) -> bool {
        if validate && !is_valid_episode_number(number) {
            return false;
        }
        self.claim(id);

        let mut category = ElementCategory::EpisodeNumber;
        if self.check_alt_number {
            if let Some(existing) = self.elements.first(ElementCategory::EpisodeNumber) {
                let (new, old) = (lenient_int(number), lenient_int(&existing));
                if new > old {
                    category = ElementCategory::EpisodeNumberAlt;
                } else if new < old {
                    self.elements.remove(ElementCategory::EpisodeNumber, &existing);
                    self.elements.insert(ElementCategory::EpisodeNumberAlt, existing);
                } else {
                    return false;
                }
            }
        }

        self.elements.insert(category, number);
        true
    }

    fn set_volume_number(&mut self, number: &str, id: TokenId, validate: bool) -> bool {
        if validate && !is_valid_volume_number(number) {
            return false;
        }
        self.elements.insert(ElementCategory::VolumeNumber, number);
        self.claim(id);
        true
    }

    /// Pull a number out of the token after an episode or volume keyword.
    pub(super) fn check_extent_keyword(
        &mut self,
        category: ElementCategory,
        id: TokenId,
    ) -> Result<bool, ParseError> {
        let Some(next) = self.next_word(id)? else {
            return Ok(false);
        };
        let token = &self.tokens[next];
        if !token.is(TokenCategory::Unknown) || first_digit(&token.content).is_none() {
            return Ok(false);
        }
        let content = token.content.clone();

        match category {
            ElementCategory::EpisodeNumber => {
                if !self.match_episode_pattern(&content, next)? {
                    self.set_episode_number(&content, next, false);
                }
            }
            ElementCategory::VolumeNumber => {
                if !self.match_volume_pattern(&content, next) {
                    self.set_volume_number(&content, next, false);
                }
            }
            _ => return Ok(false),
        }
        self.claim(id);
        Ok(true)
    }

    /// Try every episode shape against one word, in fixed order.
    pub(super) fn match_episode_pattern(&mut self, word: &str, id: TokenId) -> Result<bool, ParseError> {
        if is_numeric(word) {
            return Ok(false);
        }
        let word = word.trim_matches(|c| c == ' ' || c == '-');
        if word.is_empty() {
            return Ok(false);
        }
        let front = word.starts_with(|c: char| c.is_ascii_digit());
        let back = word.ends_with(|c: char| c.is_ascii_digit());

        let matched = (front && back && self.match_single_episode(word, id))
            || (front && back && self.match_multi_episode(word, id))
            || (back && self.match_season_and_episode(word, id))
            || (!front && self.match_type_and_episode(word, id)?)
            || (front && back && self.match_fractional_episode(word, id))
            || (front && !back && self.match_partial_episode(word, id))
            || (back && self.match_number_sign(word, id))
            || (front && self.match_japanese_counter(word, id));
        Ok(matched)
    }

    /// "01v2"
    fn match_single_episode(&mut self, word: &str, id: TokenId) -> bool {
        let Some(caps) = RE_SINGLE.captures(word) else {
            return false;
        };
        debug!(episode = &caps[1], version = &caps[2], rule = "single", "Episode number matched");
        self.set_episode_number(&caps[1], id, false);
        self.elements
            .insert(ElementCategory::ReleaseVersion, &caps[2]);
        true
    }

    /// "01-12", "01v2-12v2"
    fn match_multi_episode(&mut self, word: &str, id: TokenId) -> bool {
        let Some(caps) = RE_MULTI.captures(word) else {
            return false;
        };
        let (lower, upper) = (&caps[1], &caps[3]);
        let (Ok(lo), Ok(hi)) = (lower.parse::<i64>(), upper.parse::<i64>()) else {
            return false;
        };
        if lo >= hi || !self.set_episode_number(lower, id, true) {
            return false;
        }
        debug!(episode = lower, to = upper, rule = "multi", "Episode number matched");
        self.set_episode_number(upper, id, false);
        for version in [group(&caps, 2), group(&caps, 4)].into_iter().flatten() {
            self.elements.insert(ElementCategory::ReleaseVersion, version);
        }
        true
    }

    /// "S01E05", "2x05", "S01-S02E03-E04"
    fn match_season_and_episode(&mut self, word: &str, id: TokenId) -> bool {
        let Some(caps) = RE_SEASON_EPISODE.captures(word) else {
            return false;
        };
        debug!(season = &caps[1], episode = &caps[3], rule = "season", "Episode number matched");
        self.elements.insert(ElementCategory::AnimeSeason, &caps[1]);
        if let Some(second) = group(&caps, 2) {
            self.elements.insert(ElementCategory::AnimeSeason, second);
        }
        self.set_episode_number(&caps[3], id, false);
        if let Some(last) = group(&caps, 4) {
            self.set_episode_number(last, id, false);
        }
        if let Some(version) = group(&caps, 5) {
            self.elements.insert(ElementCategory::ReleaseVersion, version);
        }
        true
    }

    /// "OVA2", "ED1": an anime type fused to a number. The token is split
    /// into a type token and the number.
    fn match_type_and_episode(&mut self, word: &str, id: TokenId) -> Result<bool, ParseError> {
        let Some(begin) = first_digit(word) else {
            return Ok(false);
        };
        let (prefix, number) = word.split_at(begin);
        let Some(keyword) = self.keywords.find(&normalize(prefix), ElementCategory::AnimeType)
        else {
            return Ok(false);
        };

        self.elements.insert(ElementCategory::AnimeType, prefix);
        let matched = self.match_episode_pattern(number, id)?
            || self.set_episode_number(number, id, true);
        if matched {
            debug!(anime_type = prefix, episode = number, rule = "type", "Episode number matched");
            let position = self.tokens.position(id)?;
            let enclosed = self.tokens[id].enclosed;
            self.tokens[id].content = number.to_string();
            let category = if keyword.is_identifiable() {
                TokenCategory::Identifier
            } else {
                TokenCategory::Unknown
            };
            self.tokens
                .insert_at(position, Token::new(category, prefix, enclosed))?;
        }
        Ok(true)
    }

    /// "07.5"
    fn match_fractional_episode(&mut self, word: &str, id: TokenId) -> bool {
        RE_FRACTIONAL.is_match(word) && self.set_episode_number(word, id, true)
    }

    /// "04a"
    fn match_partial_episode(&mut self, word: &str, id: TokenId) -> bool {
        let Some(begin) = word.find(|c: char| !c.is_ascii_digit()) else {
            return false;
        };
        let suffix = &word[begin..];
        suffix.len() == 1
            && "ABCabc".contains(suffix)
            && self.set_episode_number(word, id, true)
    }

    /// "#01", "#01-02", "#02v2"
    fn match_number_sign(&mut self, word: &str, id: TokenId) -> bool {
        let Some(caps) = RE_NUMBER_SIGN.captures(word) else {
            return false;
        };
        if !self.set_episode_number(&caps[1], id, true) {
            return false;
        }
        debug!(episode = &caps[1], rule = "number_sign", "Episode number matched");
        if let Some(second) = group(&caps, 2) {
            self.set_episode_number(second, id, true);
        }
        if let Some(version) = group(&caps, 3) {
            self.elements.insert(ElementCategory::ReleaseVersion, version);
        }
        true
    }

    /// "01話"
    fn match_japanese_counter(&mut self, word: &str, id: TokenId) -> bool {
        let Some(caps) = RE_JAPANESE_COUNTER.captures(word) else {
            return false;
        };
        self.set_episode_number(&caps[1], id, false)
    }

    fn match_volume_pattern(&mut self, word: &str, id: TokenId) -> bool {
        if is_numeric(word) {
            return false;
        }
        let word = word.trim_matches(|c| c == ' ' || c == '-');
        let front = word.starts_with(|c: char| c.is_ascii_digit());
        let back = word.ends_with(|c: char| c.is_ascii_digit());
        if !(front && back) {
            return false;
        }

        if let Some(caps) = RE_VOLUME_SINGLE.captures(word) {
            self.set_volume_number(&caps[1], id, false);
            self.elements
                .insert(ElementCategory::ReleaseVersion, &caps[2]);
            return true;
        }

        let Some(caps) = RE_VOLUME_MULTI.captures(word) else {
            return false;
        };
        let (Ok(lo), Ok(hi)) = (caps[1].parse::<i64>(), caps[2].parse::<i64>()) else {
            return false;
        };
        if lo >= hi || !self.set_volume_number(&caps[1], id, true) {
            return false;
        }
        self.set_volume_number(&caps[2], id, false);
        if let Some(version) = group(&caps, 3) {
            self.elements.insert(ElementCategory::ReleaseVersion, version);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;
    use crate::{parse, parse_with, Elements};

    fn run(filename: &str) -> Elements {
        parse(filename).unwrap()
    }

    #[test]
    fn test_version_suffix() {
        let e = run("Title - 01v2");
        assert_eq!(e.episode_number, vec!["01"]);
        assert_eq!(e.release_version, vec!["2"]);
    }

    #[test]
    fn test_multi_episode_range() {
        let e = run("Title 01-12");
        assert_eq!(e.episode_number, vec!["01", "12"]);
        assert_eq!(e.anime_title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_multi_episode_rejects_descending() {
        let e = run("Title 12-01");
        assert!(e.episode_number.is_empty());
    }

    #[test]
    fn test_season_and_episode() {
        let e = run("Title S01E05");
        assert_eq!(e.anime_season, vec!["01"]);
        assert_eq!(e.episode_number, vec!["05"]);

        let e = run("Title 2x05");
        assert_eq!(e.anime_season, vec!["2"]);
        assert_eq!(e.episode_number, vec!["05"]);

        let e = run("Title S01-S02E03-E04");
        assert_eq!(e.anime_season, vec!["01", "02"]);
        assert_eq!(e.episode_number, vec!["03", "04"]);
    }

    #[test]
    fn test_season_episode_separator_is_literal() {
        let e = run("Title 2xE05");
        assert_eq!(e.anime_season, vec!["2"]);
        assert_eq!(e.episode_number, vec!["05"]);

        let e = run("Title 2aE05");
        assert!(e.anime_season.is_empty());
        assert!(e.episode_number.is_empty());
    }

    #[test]
    fn test_type_fused_number() {
        let e = run("Title OVA2");
        assert_eq!(e.anime_type, vec!["OVA"]);
        assert_eq!(e.episode_number, vec!["2"]);
    }

    #[test]
    fn test_fractional_and_partial() {
        assert_eq!(run("Title 07.5").episode_number, vec!["07.5"]);
        assert_eq!(run("Title 04a").episode_number, vec!["04a"]);
    }

    #[test]
    fn test_number_sign() {
        let e = run("Title #02v3");
        assert_eq!(e.episode_number, vec!["02"]);
        assert_eq!(e.release_version, vec!["3"]);
    }

    #[test]
    fn test_japanese_counter() {
        let e = run("タイトル 01話");
        assert_eq!(e.episode_number, vec!["01"]);
    }

    #[test]
    fn test_episode_keyword() {
        let e = run("Title Episode 7");
        assert_eq!(e.episode_number, vec!["7"]);
        assert_eq!(e.anime_title.as_deref(), Some("Title"));

        let e = run("Title EP07");
        assert_eq!(e.episode_number, vec!["07"]);
    }

    #[test]
    fn test_volume_keyword() {
        let e = run("Title Vol 3");
        assert_eq!(e.volume_number, vec!["3"]);
        let e = run("Title Vol.01-02");
        assert_eq!(e.volume_number, vec!["01", "02"]);
    }

    #[test]
    fn test_number_of_number() {
        let e = run("Title 01 of 24");
        assert_eq!(e.episode_number, vec!["01"]);
    }

    #[test]
    fn test_equivalent_numbers() {
        let e = run("Title 12 (24)");
        assert_eq!(e.episode_number, vec!["12"]);
        assert_eq!(e.episode_number_alt, vec!["24"]);
    }

    #[test]
    fn test_isolated_number() {
        let e = run("Title [05]");
        assert_eq!(e.episode_number, vec!["05"]);
    }

    #[test]
    fn test_last_number_skips_movie() {
        let e = run("Title Movie 2");
        assert!(e.episode_number.is_empty());
        let e = run("Title 2");
        assert_eq!(e.episode_number, vec!["2"]);
    }

    #[test]
    fn test_year_not_episode() {
        let e = run("Title - 2020");
        assert!(e.episode_number.is_empty());
    }

    #[test]
    fn test_episode_parsing_can_be_disabled() {
        let options = ParseOptions {
            parse_episode_number: false,
            ..Default::default()
        };
        let e = parse_with("Title - 05", &options).unwrap();
        assert!(e.episode_number.is_empty());
    }
}
