use tracing::debug;

use super::Parser;
use crate::elements::ElementCategory;
use crate::error::ParseError;
use crate::text::{is_dash, is_mostly_latin, trim_dashes_and_spaces};
use crate::token::{TokenCategory, TokenFilter, TokenId};

impl Parser<'_> {
    /// Pass 4: the anime title.
    ///
    /// The title starts at the first unclaimed text outside brackets and
    /// runs to the next claimed token; without one there is no title. When
    /// every remaining word is inside brackets, the first bracket group after
    /// a skipped group whose text is mostly Latin is taken instead, running
    /// to the next bracket or the end of the stream.
    pub(super) fn search_for_anime_title(&mut self) -> Result<(), ParseError> {
        let mut enclosed_title = false;
        let mut begin = self.tokens.first(TokenFilter::UNKNOWN.not_enclosed());

        if begin.is_none() {
            enclosed_title = true;
            let mut cursor = self.tokens.at(0);
            let mut skipped_previous_group = false;
            while let Some(from) = cursor {
                let Some(candidate) = self.tokens.next(from, TokenFilter::UNKNOWN)? else {
                    cursor = None;
                    break;
                };
                if skipped_previous_group && is_mostly_latin(&self.tokens[candidate].content) {
                    cursor = Some(candidate);
                    break;
                }
                cursor = self.tokens.next(candidate, TokenFilter::BRACKET)?;
                skipped_previous_group = true;
            }
            begin = cursor;
        }
        let Some(begin) = begin else {
            return Ok(());
        };

        let end_filter = if enclosed_title {
            TokenFilter::BRACKET_OR_IDENTIFIER
        } else {
            TokenFilter::IDENTIFIER
        };
        let mut end = self.tokens.next(begin, end_filter)?;

        if !enclosed_title {
            // An unclosed bracket inside the span ends the title at that bracket.
            let mut open = false;
            let mut last_bracket = end;
            for id in self.tokens.slice(TokenFilter::BRACKET, begin, end)? {
                last_bracket = Some(id);
                open = !open;
            }
            if open {
                end = last_bracket;
            }

            // Unbracketed text with nothing claimed after it is not a title.
            let Some(stop) = end else {
                return Ok(());
            };

            // Trailing bracket groups other than "(...)" are not part of the title.
            let mut tail = self.tokens.previous(stop, TokenFilter::NOT_DELIMITER)?;
            while let Some(t) = tail {
                let token = &self.tokens[t];
                if !token.is(TokenCategory::Bracket) || token.content == ")" {
                    break;
                }
                let Some(bracket) = self.tokens.previous(t, TokenFilter::BRACKET)? else {
                    break;
                };
                if self.tokens.distance(begin, Some(bracket))? <= 0 {
                    break;
                }
                end = Some(bracket);
                tail = self.tokens.previous(bracket, TokenFilter::NOT_DELIMITER)?;
            }
        }

        let end = match end {
            Some(end) => self.tokens.previous(end, TokenFilter::VALID)?,
            None => self.tokens.last(TokenFilter::ANY),
        };
        self.build_element(ElementCategory::AnimeTitle, begin, end, false)
    }

    /// Pass 5: a bracketed group that is not glued to other text.
    pub(super) fn search_for_release_group(&mut self) -> Result<(), ParseError> {
        let mut begin = self.tokens.first(TokenFilter::UNKNOWN.enclosed());
        while let Some(b) = begin {
            let Some(end) = self.tokens.next(b, TokenFilter::BRACKET_OR_IDENTIFIER)? else {
                return Ok(());
            };
            begin = self.tokens.next(end, TokenFilter::UNKNOWN.enclosed())?;
            if !self.tokens[end].is(TokenCategory::Bracket) {
                continue;
            }
            if let Some(prev) = self.previous_word(b)? {
                if !self.tokens[prev].is(TokenCategory::Bracket) {
                    continue;
                }
            }

            let end = self.tokens.previous(end, TokenFilter::VALID)?;
            return self.build_element(ElementCategory::ReleaseGroup, b, end, true);
        }
        Ok(())
    }

    /// Pass 6: the first unbracketed text left after the episode number.
    pub(super) fn search_for_episode_title(&mut self) -> Result<(), ParseError> {
        let mut begin = self.tokens.first(TokenFilter::UNKNOWN.not_enclosed());
        while let Some(b) = begin {
            let end = self
                .tokens
                .next(b, TokenFilter::BRACKET_OR_IDENTIFIER)?
                .or_else(|| self.tokens.last(TokenFilter::ANY));
            let Some(end) = end else {
                return Ok(());
            };
            let distance = self.tokens.distance(b, Some(end))?;
            if (0..=2).contains(&distance) && is_dash(&self.tokens[b].content) {
                begin = self.tokens.next(end, TokenFilter::UNKNOWN.not_enclosed())?;
                continue;
            }

            let end = if self.tokens[end].is(TokenCategory::Bracket) {
                self.tokens.previous(end, TokenFilter::VALID)?
            } else {
                Some(end)
            };
            return self.build_element(ElementCategory::EpisodeTitle, b, end, false);
        }
        Ok(())
    }

    /// Concatenate `begin..=end` into one element, claiming the text
    /// tokens it consumes.
    ///
    /// With `keep_delimiters` every delimiter is copied verbatim; otherwise
    /// inner delimiters become spaces (commas and ampersands are kept) and
    /// the result is trimmed of spaces and dashes.
    pub(super) fn build_element(
        &mut self,
        category: ElementCategory,
        begin: TokenId,
        end: Option<TokenId>,
        keep_delimiters: bool,
    ) -> Result<(), ParseError> {
        let mut element = String::new();
        for id in self.tokens.slice(TokenFilter::ANY, begin, end)? {
            let token = &self.tokens[id];
            match token.category {
                TokenCategory::Unknown => {
                    element.push_str(&token.content);
                    self.claim(id);
                }
                TokenCategory::Bracket => element.push_str(&token.content),
                TokenCategory::Delimiter => {
                    let at_edge = id == begin || Some(id) == end;
                    if keep_delimiters {
                        element.push_str(&token.content);
                    } else if !at_edge {
                        match token.content.as_str() {
                            "," | "&" => element.push_str(&token.content),
                            _ => element.push(' '),
                        }
                    }
                }
                TokenCategory::Identifier | TokenCategory::Invalid => {}
            }
        }

        let value = if keep_delimiters {
            element.as_str()
        } else {
            trim_dashes_and_spaces(&element)
        };
        let value = value.trim_matches(' ');
        if !value.is_empty() {
            debug!(?category, value, "Element built");
            self.elements.insert(category, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::options::ParseOptions;
    use crate::{parse, parse_with};

    #[test]
    fn test_title_stops_at_identifier() {
        let e = parse("Toradora! - 01 [BD]").unwrap();
        assert_eq!(e.anime_title.as_deref(), Some("Toradora!"));
    }

    #[test]
    fn test_unterminated_title_is_dropped() {
        let e = parse("Just A Title").unwrap();
        assert_eq!(e.anime_title, None);
        let e = parse("1").unwrap();
        assert_eq!(e.anime_title, None);
    }

    #[test]
    fn test_bracketed_title_runs_to_end() {
        let e = parse("[Group][Title").unwrap();
        assert_eq!(e.anime_title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_title_keeps_closed_brackets() {
        let e = parse("Title (TV) - 01").unwrap();
        assert_eq!(e.anime_title.as_deref(), Some("Title (TV)"));
    }

    #[test]
    fn test_title_pulls_back_open_bracket() {
        let e = parse("Title [Extra] 01 [BD]").unwrap();
        assert_eq!(e.anime_title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_title_from_brackets() {
        let e = parse("[Group][Title][01]").unwrap();
        assert_eq!(e.anime_title.as_deref(), Some("Title"));
        assert_eq!(e.episode_number, vec!["01"]);
    }

    #[test]
    fn test_release_group_keeps_delimiters() {
        let e = parse("[Foo_Bar] Title - 01").unwrap();
        assert_eq!(e.release_group.as_deref(), Some("Foo_Bar"));
    }

    #[test]
    fn test_release_group_disabled() {
        let options = ParseOptions {
            parse_release_group: false,
            ..Default::default()
        };
        let e = parse_with("[Group] Title - 01", &options).unwrap();
        assert_eq!(e.release_group, None);
        assert_eq!(e.anime_title.as_deref(), Some("Title"));
    }

    #[test]
    fn test_episode_title() {
        let e = parse("Title - 01 - The Beginning [720p]").unwrap();
        assert_eq!(e.episode_title.as_deref(), Some("The Beginning"));
    }

    #[test]
    fn test_episode_title_needs_episode() {
        let e = parse("Title [720p] Extra Words").unwrap();
        assert_eq!(e.episode_title, None);
    }

    #[test]
    fn test_episode_title_disabled() {
        let options = ParseOptions {
            parse_episode_title: false,
            ..Default::default()
        };
        let e = parse_with("Title - 01 - The Beginning", &options).unwrap();
        assert_eq!(e.episode_title, None);
    }

    #[test]
    fn test_comma_and_ampersand_kept_in_title() {
        let e = parse("Rock,Paper & Scissors - 01").unwrap();
        assert_eq!(e.anime_title.as_deref(), Some("Rock,Paper & Scissors"));
    }
}
