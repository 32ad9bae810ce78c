mod episode;
mod season;
mod title;

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::elements::{ElementCategory, Elements};
use crate::error::ParseError;
use crate::keyword::{normalize, KeywordTable};
use crate::options::ParseOptions;
use crate::text::{is_crc32, is_numeric, is_resolution};
use crate::token::{TokenCategory, TokenFilter, TokenId, TokenStream};

const ANIME_YEAR_MIN: i64 = 1900;
const ANIME_YEAR_MAX: i64 = 2050;

static RE_TILDE_EPISODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^~\s(\d{1,2})$").unwrap());

/// Runs the ordered heuristic passes over a token stream.
///
/// Each pass claims the tokens it uses (marks them `Identifier`) so that
/// later passes only see what is left.
pub struct Parser<'a> {
    keywords: &'a KeywordTable,
    options: &'a ParseOptions,
    tokens: TokenStream,
    elements: Elements,
    /// Set when the keyword pass already found an episode number; new
    /// numbers are then ranked against it instead of appended.
    check_alt_number: bool,
}

impl<'a> Parser<'a> {
    pub fn new(
        keywords: &'a KeywordTable,
        options: &'a ParseOptions,
        tokens: TokenStream,
        elements: Elements,
    ) -> Self {
        Self {
            keywords,
            options,
            tokens,
            elements,
            check_alt_number: false,
        }
    }

    pub fn parse(mut self) -> Result<Elements, ParseError> {
        self.search_for_keywords()?;
        self.search_for_isolated_numbers()?;
        if self.options.parse_episode_number {
            self.search_for_episode_number()?;
        }
        self.search_for_anime_title()?;
        if self.options.parse_release_group
            && !self.elements.contains(ElementCategory::ReleaseGroup)
        {
            self.search_for_release_group()?;
        }
        if self.options.parse_episode_title
            && self.elements.contains(ElementCategory::EpisodeNumber)
        {
            self.search_for_episode_title()?;
        }
        self.validate_elements();
        Ok(self.elements)
    }

    fn claim(&mut self, id: TokenId) {
        self.tokens[id].category = TokenCategory::Identifier;
    }

    fn unknown_ids(&self) -> Vec<TokenId> {
        self.tokens
            .iter()
            .filter(|(_, t)| t.is(TokenCategory::Unknown))
            .map(|(id, _)| id)
            .collect()
    }

    /// Pass 1: dictionary lookup, falling back to checksum and resolution
    /// shapes.
    fn search_for_keywords(&mut self) -> Result<(), ParseError> {
        for id in self.unknown_ids() {
            if !self.tokens[id].is(TokenCategory::Unknown) {
                continue;
            }
            let mut word = self.tokens[id].content.trim_matches(|c| c == ' ' || c == '-');
            if word.is_empty() || (word.len() != 8 && is_numeric(word)) {
                continue;
            }

            let keyword = self.keywords.find_any(&normalize(word));
            let category = match keyword {
                Some(kw) => {
                    let category = kw.category;
                    if category == ElementCategory::ReleaseGroup && !self.options.parse_release_group
                    {
                        continue;
                    }
                    if !category.is_searchable() || !kw.is_searchable() {
                        continue;
                    }
                    if category.is_singular() && self.elements.contains(category) {
                        continue;
                    }
                    match category {
                        ElementCategory::AnimeSeasonPrefix => {
                            self.check_anime_season_keyword(id)?;
                            continue;
                        }
                        ElementCategory::EpisodePrefix => {
                            if kw.is_valid() {
                                self.check_extent_keyword(ElementCategory::EpisodeNumber, id)?;
                            }
                            continue;
                        }
                        ElementCategory::VolumePrefix => {
                            self.check_extent_keyword(ElementCategory::VolumeNumber, id)?;
                            continue;
                        }
                        ElementCategory::ReleaseVersion => {
                            let mut chars = word.chars();
                            chars.next();
                            word = chars.as_str();
                        }
                        _ => {}
                    }
                    category
                }
                None if !self.elements.contains(ElementCategory::FileChecksum)
                    && is_crc32(word) =>
                {
                    ElementCategory::FileChecksum
                }
                None if !self.elements.contains(ElementCategory::VideoResolution)
                    && is_resolution(word) =>
                {
                    ElementCategory::VideoResolution
                }
                None => continue,
            };

            let word = word.to_string();
            debug!(?category, value = %word, "Keyword matched");
            self.elements.insert(category, word);
            if keyword.map_or(true, |kw| kw.is_identifiable()) {
                self.claim(id);
            }
        }
        Ok(())
    }

    /// Pass 2: bracket-isolated years and bare resolutions.
    fn search_for_isolated_numbers(&mut self) -> Result<(), ParseError> {
        for id in self.unknown_ids() {
            let Ok(n) = self.tokens[id].content.parse::<i64>() else {
                continue;
            };
            if !self.tokens.is_isolated(id)? {
                continue;
            }
            let content = self.tokens[id].content.clone();

            if (ANIME_YEAR_MIN..=ANIME_YEAR_MAX).contains(&n)
                && !self.elements.contains(ElementCategory::AnimeYear)
            {
                debug!(year = %content, "Isolated year");
                self.elements.insert(ElementCategory::AnimeYear, content);
                self.claim(id);
                continue;
            }
            if matches!(n, 480 | 720 | 1080)
                && !self.elements.contains(ElementCategory::VideoResolution)
            {
                debug!(resolution = %content, "Isolated resolution");
                self.elements.insert(ElementCategory::VideoResolution, content);
                self.claim(id);
            }
        }
        Ok(())
    }

    /// Final corrections once every pass has run.
    fn validate_elements(&mut self) {
        let Some(episode_title) = self.elements.episode_title.clone() else {
            return;
        };
        if let Some(caps) = RE_TILDE_EPISODE.captures(&episode_title) {
            debug!(episode = &caps[1], "Episode title was a tilde episode number");
            self.elements.erase(ElementCategory::EpisodeTitle);
            self.elements
                .insert(ElementCategory::EpisodeNumber, caps[1].to_string());
        }

        for anime_type in self.elements.anime_type.clone() {
            if anime_type == episode_title {
                self.elements.erase(ElementCategory::EpisodeTitle);
            } else if episode_title.contains(anime_type.as_str())
                && self
                    .keywords
                    .find(&normalize(&anime_type), ElementCategory::AnimeType)
                    .is_some()
            {
                self.elements.remove(ElementCategory::AnimeType, &anime_type);
            }
        }
    }

    /// Nearest non-delimiter neighbours, used by several passes.
    fn next_word(&self, id: TokenId) -> Result<Option<TokenId>, ParseError> {
        self.tokens.next(id, TokenFilter::NOT_DELIMITER)
    }

    fn previous_word(&self, id: TokenId) -> Result<Option<TokenId>, ParseError> {
        self.tokens.previous(id, TokenFilter::NOT_DELIMITER)
    }
}
