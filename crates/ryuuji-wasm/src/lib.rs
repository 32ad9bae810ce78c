use ryuuji_parse::ParseOptions;
use wasm_bindgen::prelude::*;

/// Parse a filename and return its elements as JSON, or `{}` when the
/// filename cannot be parsed.
#[wasm_bindgen]
pub fn parse_filename(input: &str) -> String {
    parse_to_json(input, &ParseOptions::default())
}

/// Like [`parse_filename`], with options given as a JSON object. Missing
/// keys keep their defaults; malformed options fall back to the defaults.
#[wasm_bindgen]
pub fn parse_filename_with(input: &str, options: &str) -> String {
    let options: ParseOptions = serde_json::from_str(options).unwrap_or_default();
    parse_to_json(input, &options)
}

fn parse_to_json(input: &str, options: &ParseOptions) -> String {
    ryuuji_parse::parse_with(input, options)
        .ok()
        .and_then(|elements| serde_json::to_string(&elements).ok())
        .unwrap_or_else(|| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filename() {
        let json = parse_filename("[Group] Title - 01 [1080p].mkv");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["anime_title"], "Title");
        assert_eq!(value["episode_number"][0], "01");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_filename(""), "{}");
    }

    #[test]
    fn test_options_json() {
        let json = parse_filename_with("[Group] Title - 01", r#"{"parse_release_group": false}"#);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("release_group").is_none());
        assert_eq!(value["anime_title"], "Title");
    }
}
