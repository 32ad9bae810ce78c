use crate::elements::Elements;
use crate::error::ParseError;
use crate::keyword::KeywordTable;
use crate::text::is_numeric;
use crate::token::{Token, TokenCategory, TokenFilter, TokenId, TokenStream};

/// Opening/closing bracket pairs, including CJK and fullwidth brackets.
const BRACKETS: &[(char, char)] = &[
    ('(', ')'),
    ('[', ']'),
    ('{', '}'),
    ('\u{300C}', '\u{300D}'), // 「」
    ('\u{300E}', '\u{300F}'), // 『』
    ('\u{3010}', '\u{3011}'), // 【】
    ('\u{FF08}', '\u{FF09}'), // （）
];

/// Splits a filename into a [`TokenStream`].
///
/// Pre-identified phrases found by [`KeywordTable::peek`] are written to
/// `elements` as a side effect.
pub struct Tokenizer<'a> {
    keywords: &'a KeywordTable,
    delimiters: &'a str,
    elements: &'a mut Elements,
    tokens: TokenStream,
}

/// Tokenize `filename`, splitting unbracketed text on `delimiters`.
pub fn tokenize(
    filename: &str,
    delimiters: &str,
    keywords: &KeywordTable,
    elements: &mut Elements,
) -> Result<TokenStream, ParseError> {
    Tokenizer::new(keywords, delimiters, elements).run(filename)
}

impl<'a> Tokenizer<'a> {
    pub fn new(keywords: &'a KeywordTable, delimiters: &'a str, elements: &'a mut Elements) -> Self {
        Self {
            keywords,
            delimiters,
            elements,
            tokens: TokenStream::new(),
        }
    }

    pub fn run(mut self, filename: &str) -> Result<TokenStream, ParseError> {
        self.tokenize_by_brackets(filename)?;
        if self.tokens.is_empty() {
            return Err(ParseError::EmptyStream);
        }
        tracing::trace!(tokens = self.tokens.len(), "Tokenized filename");
        Ok(self.tokens)
    }

    fn tokenize_by_brackets(&mut self, filename: &str) -> Result<(), ParseError> {
        let mut text = filename;
        let mut closing: Option<char> = None;

        while !text.is_empty() {
            let found = match closing {
                None => text.char_indices().find_map(|(i, c)| {
                    BRACKETS
                        .iter()
                        .find(|(open, _)| *open == c)
                        .map(|&(open, close)| (i, open, Some(close)))
                }),
                Some(close) => text.find(close).map(|i| (i, close, None)),
            };

            let Some((index, bracket, next_closing)) = found else {
                self.tokenize_segment(text, closing.is_some())?;
                break;
            };

            if index > 0 {
                self.tokenize_segment(&text[..index], closing.is_some())?;
            }
            self.tokens
                .push(Token::new(TokenCategory::Bracket, bracket.to_string(), true));
            closing = next_closing;
            text = &text[index + bracket.len_utf8()..];
        }
        Ok(())
    }

    /// Emit pre-identified phrases as identifiers and delimiter-split the
    /// text around them.
    fn tokenize_segment(&mut self, segment: &str, enclosed: bool) -> Result<(), ParseError> {
        let spans = self.keywords.peek(segment, self.elements);

        let mut last_end = 0;
        for span in spans {
            if span.begin < last_end {
                continue;
            }
            if span.begin > last_end {
                self.tokenize_by_delimiters(&segment[last_end..span.begin], enclosed)?;
            }
            self.tokens.push(Token::new(
                TokenCategory::Identifier,
                &segment[span.begin..span.end],
                enclosed,
            ));
            last_end = span.end;
        }
        if last_end < segment.len() {
            self.tokenize_by_delimiters(&segment[last_end..], enclosed)?;
        }
        Ok(())
    }

    fn tokenize_by_delimiters(&mut self, text: &str, enclosed: bool) -> Result<(), ParseError> {
        let first_new = self.tokens.len();
        let mut run_start = 0;
        for (i, c) in text.char_indices() {
            if !self.delimiters.contains(c) {
                continue;
            }
            if i > run_start {
                self.tokens.push(Token::new(
                    TokenCategory::Unknown,
                    &text[run_start..i],
                    enclosed,
                ));
            }
            self.tokens
                .push(Token::new(TokenCategory::Delimiter, c.to_string(), enclosed));
            run_start = i + c.len_utf8();
        }
        if run_start < text.len() {
            self.tokens
                .push(Token::new(TokenCategory::Unknown, &text[run_start..], enclosed));
        }
        normalize_delimiters(&mut self.tokens, first_new)
    }
}

/// A lone single-byte Unknown character other than a dash.
fn is_single_char(token: &Token) -> bool {
    token.is(TokenCategory::Unknown) && token.content.len() == 1 && token.content != "-"
}

fn is_category(tokens: &TokenStream, id: Option<TokenId>, category: TokenCategory) -> bool {
    id.is_some_and(|id| tokens[id].is(category))
}

/// Merge adjacent tokens around delimiters so that shapes like `A.B.C`,
/// `2&3` and `foo.bar baz` survive as single tokens, then drop the
/// merged-away tombstones.
///
/// Only delimiters at position `from` or later are inspected; earlier ones
/// were settled when their own text was split and are always cut off from
/// new text by a bracket or a pre-identified phrase.
pub fn normalize_delimiters(tokens: &mut TokenStream, from: usize) -> Result<(), ParseError> {
    use TokenCategory::{Bracket, Delimiter, Unknown};

    let ids: Vec<TokenId> = (from..tokens.len()).filter_map(|i| tokens.at(i)).collect();
    let mut merged = false;
    for id in ids {
        if !tokens[id].is(Delimiter) {
            continue;
        }
        let delimiter = tokens[id].content.clone();
        let prev = tokens.previous(id, TokenFilter::VALID)?;
        let next = tokens.next(id, TokenFilter::VALID)?;
        // Absorption only grows real text tokens.
        let absorbing = prev.filter(|&p| !tokens[p].is(Bracket) && !tokens[p].is(Delimiter));

        if delimiter != " " && delimiter != "_" {
            if let Some(p) = prev.filter(|&p| is_single_char(&tokens[p])) {
                tokens.merge_into(id, p)?;
                merged = true;
                let mut nested = next;
                while let Some(n) = nested.filter(|&n| tokens[n].is(Unknown)) {
                    tokens.merge_into(n, p)?;
                    nested = tokens.next(n, TokenFilter::VALID)?;
                    if let Some(d) = nested
                        .filter(|&d| tokens[d].is(Delimiter) && tokens[d].content == delimiter)
                    {
                        tokens.merge_into(d, p)?;
                        nested = tokens.next(d, TokenFilter::VALID)?;
                    }
                }
                continue;
            }
            if let (Some(p), Some(n)) = (absorbing, next) {
                if is_single_char(&tokens[n]) {
                    tokens.merge_into(id, p)?;
                    tokens.merge_into(n, p)?;
                    merged = true;
                    continue;
                }
            }
        }

        let (Some(p), Some(n)) = (prev, next) else {
            continue;
        };

        if tokens[p].is(Unknown) && tokens[n].is(Delimiter) {
            let next_delimiter = tokens[n].content.as_str();
            if delimiter != next_delimiter
                && delimiter != ","
                && (next_delimiter == " " || next_delimiter == "_")
            {
                tokens.merge_into(id, p)?;
                merged = true;
                continue;
            }
        } else if tokens[p].is(Delimiter)
            && tokens[n].is(Delimiter)
            && tokens[p].content == tokens[n].content
            && tokens[p].content != delimiter
        {
            tokens[id].category = Unknown;
            continue;
        }

        if (delimiter == "&" || delimiter == "+")
            && is_category(tokens, prev, Unknown)
            && is_category(tokens, next, Unknown)
            && is_numeric(&tokens[p].content)
            && is_numeric(&tokens[n].content)
        {
            tokens.merge_into(id, p)?;
            tokens.merge_into(n, p)?;
            merged = true;
        }
    }

    if merged {
        tokens.compact();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_DELIMITERS;

    fn run(filename: &str) -> Vec<(TokenCategory, String, bool)> {
        let mut elements = Elements::new();
        tokenize(filename, DEFAULT_DELIMITERS, KeywordTable::global(), &mut elements)
            .unwrap()
            .iter()
            .map(|(_, t)| (t.category, t.content.clone(), t.enclosed))
            .collect()
    }

    fn contents(filename: &str) -> Vec<String> {
        run(filename).into_iter().map(|(_, c, _)| c).collect()
    }

    #[test]
    fn test_empty_input() {
        let mut elements = Elements::new();
        let result = tokenize("", DEFAULT_DELIMITERS, KeywordTable::global(), &mut elements);
        assert_eq!(result.err(), Some(ParseError::EmptyStream));
    }

    #[test]
    fn test_brackets_and_enclosure() {
        use TokenCategory::*;
        let tokens = run("[Group] Title");
        assert_eq!(
            tokens,
            vec![
                (Bracket, "[".to_string(), true),
                (Unknown, "Group".to_string(), true),
                (Bracket, "]".to_string(), true),
                (Delimiter, " ".to_string(), false),
                (Unknown, "Title".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_cjk_brackets() {
        let tokens = run("【字幕組】タイトル");
        assert_eq!(tokens[0].1, "【");
        assert_eq!(tokens[1].1, "字幕組");
        assert!(tokens[1].2);
        assert_eq!(tokens[2].1, "】");
        assert_eq!(tokens[3].1, "タイトル");
        assert!(!tokens[3].2);
    }

    #[test]
    fn test_unterminated_bracket() {
        let tokens = run("Title [Group");
        let last = tokens.last().unwrap();
        assert_eq!(last.1, "Group");
        assert!(last.2);
        assert_eq!(tokens.iter().filter(|t| t.0 == TokenCategory::Bracket).count(), 1);
    }

    #[test]
    fn test_nested_open_bracket_is_text() {
        assert_eq!(contents("[a(b]"), vec!["[", "a(b", "]"]);
    }

    #[test]
    fn test_preidentified_phrase_survives_delimiters() {
        let mut elements = Elements::new();
        let stream = tokenize(
            "Title Dual Audio H.264",
            DEFAULT_DELIMITERS,
            KeywordTable::global(),
            &mut elements,
        )
        .unwrap();
        let idents: Vec<_> = stream
            .iter()
            .filter(|(_, t)| t.is(TokenCategory::Identifier))
            .map(|(_, t)| t.content.clone())
            .collect();
        assert_eq!(idents, vec!["Dual Audio", "H.264"]);
        assert_eq!(elements.audio_term, vec!["Dual Audio"]);
        assert_eq!(elements.video_term, vec!["H.264"]);
    }

    #[test]
    fn test_single_character_absorption() {
        assert_eq!(contents("S.H.I.E.L.D"), vec!["S.H.I.E.L.D"]);
    }

    #[test]
    fn test_multibyte_character_is_not_absorbed() {
        assert_eq!(contents("字.字"), vec!["字", ".", "字"]);
        assert_eq!(contents("A.B"), vec!["A.B"]);
    }

    #[test]
    fn test_each_segment_normalized_once() {
        let name = "(a a)".repeat(3);
        assert_eq!(contents(&name).concat(), name);
        assert_eq!(
            run("x.y [S.H.I.E.L.D]")
                .into_iter()
                .filter(|(c, _, _)| *c == TokenCategory::Unknown)
                .map(|(_, c, _)| c)
                .collect::<Vec<_>>(),
            vec!["x.y", "S.H.I.E.L.D"]
        );
    }

    #[test]
    fn test_numeric_ampersand_merge() {
        assert_eq!(contents("01&02"), vec!["01&02"]);
        assert_eq!(contents("A&B"), vec!["A&B"]);
        assert_eq!(contents("Tom&Jerry"), vec!["Tom", "&", "Jerry"]);
    }

    #[test]
    fn test_delimiter_before_space_merges() {
        assert_eq!(contents("Mr. Robot"), vec!["Mr.", " ", "Robot"]);
    }

    #[test]
    fn test_sandwiched_delimiter_becomes_unknown() {
        use TokenCategory::*;
        let tokens = run("a_._b");
        assert_eq!(tokens[2], (Unknown, ".".to_string(), false));
    }

    #[test]
    fn test_no_characters_lost() {
        let name = "[TaigaSubs]_Toradora!_(2008)_-_01v2_-_Tiger_and_Dragon_[1280x720_H.264_FLAC][1234ABCD]";
        assert_eq!(contents(name).concat(), name);
        let name = "S.H.I.E.L.D. 1+2 a.b c【x】";
        assert_eq!(contents(name).concat(), name);
    }
}
