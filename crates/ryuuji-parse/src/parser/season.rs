use tracing::debug;

use super::Parser;
use crate::elements::ElementCategory;
use crate::error::ParseError;
use crate::text::{is_numeric, ordinal_number};
use crate::token::TokenId;

impl Parser<'_> {
    /// A season keyword ("Season", "S") takes its number from a preceding
    /// ordinal ("2nd Season") or a following number ("Season 2").
    pub(super) fn check_anime_season_keyword(&mut self, id: TokenId) -> Result<bool, ParseError> {
        if let Some(prev) = self.previous_word(id)? {
            if let Some(n) = ordinal_number(&self.tokens[prev].content) {
                self.set_anime_season(prev, id, n.to_string());
                return Ok(true);
            }
        }

        if let Some(next) = self.next_word(id)? {
            if is_numeric(&self.tokens[next].content) {
                let number = self.tokens[next].content.clone();
                self.set_anime_season(id, next, number);
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn set_anime_season(&mut self, first: TokenId, second: TokenId, number: String) {
        debug!(season = %number, "Season keyword matched");
        self.elements.insert(ElementCategory::AnimeSeason, number);
        self.claim(first);
        self.claim(second);
    }

    /// Season number fused to its prefix, as in "S2".
    pub(super) fn set_season_number(&mut self, number: &str, id: TokenId) -> bool {
        if !is_numeric(number) {
            return false;
        }
        debug!(season = %number, "Season prefix matched");
        self.elements.insert(ElementCategory::AnimeSeason, number);
        self.claim(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;
    use crate::parse_with;

    #[test]
    fn test_season_after_keyword() {
        let e = parse_with("Title Season 2 - 05", &ParseOptions::default()).unwrap();
        assert_eq!(e.anime_season, vec!["2"]);
        assert_eq!(e.anime_title.as_deref(), Some("Title"));
        assert_eq!(e.episode_number, vec!["05"]);
    }

    #[test]
    fn test_season_from_ordinal() {
        let e = parse_with("Title 2nd Season - 05", &ParseOptions::default()).unwrap();
        assert_eq!(e.anime_season, vec!["2"]);
        assert_eq!(e.anime_title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_fused_season_prefix() {
        let e = parse_with("Title S2 - 05", &ParseOptions::default()).unwrap();
        assert_eq!(e.anime_season, vec!["2"]);
        assert_eq!(e.episode_number, vec!["05"]);
    }
}
