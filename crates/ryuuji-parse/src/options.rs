use serde::{Deserialize, Serialize};

/// Default delimiter set used when splitting unbracketed text.
pub const DEFAULT_DELIMITERS: &str = " _.&+,|";

/// Parser configuration. Missing fields take their defaults when
/// deserialized, so a partial `[parser]` table is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Characters that split text into tokens.
    pub allowed_delimiters: String,
    /// Literal substrings removed before tokenizing.
    pub ignored_strings: Vec<String>,
    pub parse_episode_number: bool,
    pub parse_episode_title: bool,
    pub parse_file_extension: bool,
    pub parse_release_group: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allowed_delimiters: DEFAULT_DELIMITERS.to_string(),
            ignored_strings: Vec::new(),
            parse_episode_number: true,
            parse_episode_title: true,
            parse_file_extension: true,
            parse_release_group: true,
        }
    }
}
