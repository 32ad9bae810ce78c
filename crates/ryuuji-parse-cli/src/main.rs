mod config;
mod error;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ryuuji_parse::ParseOptions;
use serde_json::{json, Value};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::CliError;

/// Parse anime filenames into JSON records, one per line.
#[derive(Debug, Parser)]
#[command(name = "ryuuji-parse", version, about)]
struct Cli {
    /// Filenames to parse. Read one per line from stdin when omitted.
    filenames: Vec<String>,

    /// Config file to use instead of the user config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Pretty-print each record.
    #[arg(long)]
    pretty: bool,

    /// Remove this string before parsing (repeatable).
    #[arg(long = "ignore", value_name = "STRING")]
    ignored: Vec<String>,

    #[arg(long)]
    no_episode_title: bool,

    #[arg(long)]
    no_release_group: bool,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        config.parser.ignored_strings.extend(self.ignored.iter().cloned());
        if self.no_episode_title {
            config.parser.parse_episode_title = false;
        }
        if self.no_release_group {
            config.parser.parse_release_group = false;
        }
        if self.pretty {
            config.output.pretty = true;
        }
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ryuuji_parse=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("ryuuji-parse: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every input parsed.
fn run(cli: Cli) -> Result<bool, CliError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let mut out = io::stdout().lock();
    let mut all_parsed = true;

    if cli.filenames.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            let filename = line.trim_end_matches('\r');
            if filename.is_empty() {
                continue;
            }
            all_parsed &= emit(&mut out, filename, &config)?;
        }
    } else {
        for filename in &cli.filenames {
            all_parsed &= emit(&mut out, filename, &config)?;
        }
    }
    out.flush()?;
    Ok(all_parsed)
}

fn emit(out: &mut impl Write, filename: &str, config: &AppConfig) -> Result<bool, CliError> {
    let (record, parsed) = render(filename, &config.parser)?;
    if config.output.pretty {
        serde_json::to_writer_pretty(&mut *out, &record)?;
    } else {
        serde_json::to_writer(&mut *out, &record)?;
    }
    writeln!(out)?;
    Ok(parsed)
}

/// The JSON record for one filename, and whether it parsed.
fn render(filename: &str, options: &ParseOptions) -> Result<(Value, bool), CliError> {
    match ryuuji_parse::parse_with(filename, options) {
        Ok(elements) => {
            debug!(filename, "Parsed");
            Ok((serde_json::to_value(&elements)?, true))
        }
        Err(e) => {
            let error = CliError::from(e);
            warn!(filename, %error, "Parse failed");
            Ok((json!({ "file_name": filename, "error": error.to_string() }), false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_success() {
        let (record, parsed) =
            render("[Group] Title - 01 [720p].mkv", &ParseOptions::default()).unwrap();
        assert!(parsed);
        assert_eq!(record["anime_title"], "Title");
        assert_eq!(record["video_resolution"], "720p");
    }

    #[test]
    fn test_render_failure() {
        let (record, parsed) = render("", &ParseOptions::default()).unwrap();
        assert!(!parsed);
        assert_eq!(record["file_name"], "");
        assert!(record["error"].as_str().unwrap().starts_with("parse failed"));
    }

    #[test]
    fn test_emit_one_line_per_record() {
        let mut buf = Vec::new();
        let config = AppConfig::default();
        emit(&mut buf, "Title - 01", &config).unwrap();
        emit(&mut buf, "Title - 02", &config).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "ryuuji-parse",
            "--ignore",
            "[Dual Audio]",
            "--no-release-group",
            "--pretty",
            "a.mkv",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);
        assert_eq!(config.parser.ignored_strings, vec!["[Dual Audio]"]);
        assert!(!config.parser.parse_release_group);
        assert!(config.parser.parse_episode_title);
        assert!(config.output.pretty);
        assert_eq!(cli.filenames, vec!["a.mkv"]);
    }
}
