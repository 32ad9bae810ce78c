//! Anime filename parser.
//!
//! A filename is split into bracket-aware tokens, matched against a static
//! keyword table and then run through ordered heuristic passes that fill an
//! [`Elements`] record.
//!
//! ```
//! let e = ryuuji_parse::parse("[SubsPlease] Sousou no Frieren - 05 (1080p) [ABCD1234].mkv").unwrap();
//! assert_eq!(e.anime_title.as_deref(), Some("Sousou no Frieren"));
//! assert_eq!(e.episode_number, vec!["05"]);
//! assert_eq!(e.release_group.as_deref(), Some("SubsPlease"));
//! assert_eq!(e.video_resolution.as_deref(), Some("1080p"));
//! assert_eq!(e.file_checksum.as_deref(), Some("ABCD1234"));
//! assert_eq!(e.file_extension.as_deref(), Some("mkv"));
//! ```

pub mod elements;
pub mod error;
pub mod keyword;
pub mod options;
pub mod parser;
pub mod text;
pub mod token;
pub mod tokenizer;

pub use elements::{ElementCategory, Elements};
pub use error::ParseError;
pub use keyword::KeywordTable;
pub use options::ParseOptions;
pub use parser::Parser;
pub use token::{Token, TokenCategory, TokenFilter, TokenId, TokenStream};

use keyword::normalize;

const MAX_EXTENSION_LENGTH: usize = 4;

/// Parse a filename with the default options.
pub fn parse(filename: &str) -> Result<Elements, ParseError> {
    parse_with(filename, &ParseOptions::default())
}

/// Parse a filename.
///
/// Fails on empty input or when nothing is left to tokenize; a failed parse
/// never returns a partial record.
#[tracing::instrument(name = "parse", skip_all, fields(filename = %filename))]
pub fn parse_with(filename: &str, options: &ParseOptions) -> Result<Elements, ParseError> {
    if filename.is_empty() {
        return Err(ParseError::EmptyFilename);
    }
    let keywords = KeywordTable::global();
    let mut elements = Elements::new();
    elements.insert(ElementCategory::FileName, filename);

    let mut name = filename.to_string();
    if options.parse_file_extension {
        if let Some((stem, extension)) = split_extension(filename, keywords) {
            elements.insert(ElementCategory::FileExtension, extension);
            if !stem.is_empty() {
                name = stem.to_string();
            }
        }
    }
    for ignored in options.ignored_strings.iter().filter(|s| !s.is_empty()) {
        name = name.replace(ignored.as_str(), "");
    }

    let tokens = tokenizer::tokenize(&name, &options.allowed_delimiters, keywords, &mut elements)?;
    Parser::new(keywords, options, tokens, elements).parse()
}

/// Split off a known extension of at most four alphanumeric characters.
fn split_extension<'f>(filename: &'f str, keywords: &KeywordTable) -> Option<(&'f str, &'f str)> {
    let (stem, extension) = filename.rsplit_once('.')?;
    if extension.len() > MAX_EXTENSION_LENGTH || !extension.chars().all(char::is_alphanumeric) {
        return None;
    }
    keywords.find(&normalize(extension), ElementCategory::FileExtension)?;
    Some((stem, extension))
}
