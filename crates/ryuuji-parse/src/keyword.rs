use bitflags::bitflags;
use phf::phf_map;
use unicode_normalization::UnicodeNormalization;

use crate::elements::{ElementCategory, Elements};

bitflags! {
    /// Flags controlling how a keyword hit is applied.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeywordOptions: u8 {
        /// A hit claims the token so later passes skip it.
        const IDENTIFIABLE = 0b0000_0001;
        /// The generic keyword pass may act on this keyword.
        const SEARCHABLE = 0b0000_0010;
        /// The keyword is a real member of its category (an episode prefix
        /// such as "E" is recognized but not trusted on its own).
        const VALID = 0b0000_0100;
    }
}

impl KeywordOptions {
    pub const DEFAULT: Self = Self::IDENTIFIABLE.union(Self::SEARCHABLE).union(Self::VALID);
    pub const INVALID: Self = Self::IDENTIFIABLE.union(Self::SEARCHABLE);
    pub const UNIDENTIFIABLE: Self = Self::SEARCHABLE.union(Self::VALID);
    pub const UNIDENTIFIABLE_INVALID: Self = Self::SEARCHABLE;
    pub const UNIDENTIFIABLE_UNSEARCHABLE: Self = Self::VALID;
}

/// A keyword entry with its category and options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub category: ElementCategory,
    pub options: KeywordOptions,
}

impl Keyword {
    const fn with(category: ElementCategory, options: KeywordOptions) -> Self {
        Self { category, options }
    }

    const fn new(category: ElementCategory) -> Self {
        Self::with(category, KeywordOptions::DEFAULT)
    }

    const fn invalid(category: ElementCategory) -> Self {
        Self::with(category, KeywordOptions::INVALID)
    }

    const fn unidentifiable(category: ElementCategory) -> Self {
        Self::with(category, KeywordOptions::UNIDENTIFIABLE)
    }

    const fn unidentifiable_invalid(category: ElementCategory) -> Self {
        Self::with(category, KeywordOptions::UNIDENTIFIABLE_INVALID)
    }

    const fn unidentifiable_unsearchable(category: ElementCategory) -> Self {
        Self::with(category, KeywordOptions::UNIDENTIFIABLE_UNSEARCHABLE)
    }

    pub fn is_identifiable(&self) -> bool {
        self.options.contains(KeywordOptions::IDENTIFIABLE)
    }

    pub fn is_searchable(&self) -> bool {
        self.options.contains(KeywordOptions::SEARCHABLE)
    }

    pub fn is_valid(&self) -> bool {
        self.options.contains(KeywordOptions::VALID)
    }
}

use ElementCategory as C;

/// Compile-time keyword lookup table.
/// All keys are normalized (NFKD, uppercase).
pub static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    // ── Season prefixes ──────────────────────────────────────────
    "S" => Keyword::unidentifiable(C::AnimeSeasonPrefix),
    "SAISON" => Keyword::unidentifiable(C::AnimeSeasonPrefix),
    "SEASON" => Keyword::unidentifiable(C::AnimeSeasonPrefix),

    // ── Anime types ──────────────────────────────────────────────
    "GEKIJOUBAN" => Keyword::unidentifiable(C::AnimeType),
    "MOVIE" => Keyword::unidentifiable(C::AnimeType),
    "OAD" => Keyword::unidentifiable(C::AnimeType),
    "OAV" => Keyword::unidentifiable(C::AnimeType),
    "ONA" => Keyword::unidentifiable(C::AnimeType),
    "OVA" => Keyword::unidentifiable(C::AnimeType),
    "SPECIAL" => Keyword::unidentifiable(C::AnimeType),
    "SPECIALS" => Keyword::unidentifiable(C::AnimeType),
    "TV" => Keyword::unidentifiable(C::AnimeType),
    "SP" => Keyword::unidentifiable_unsearchable(C::AnimeType),
    "ED" => Keyword::unidentifiable_invalid(C::AnimeType),
    "ENDING" => Keyword::unidentifiable_invalid(C::AnimeType),
    "NCED" => Keyword::unidentifiable_invalid(C::AnimeType),
    "NCOP" => Keyword::unidentifiable_invalid(C::AnimeType),
    "OP" => Keyword::unidentifiable_invalid(C::AnimeType),
    "OPENING" => Keyword::unidentifiable_invalid(C::AnimeType),
    "PREVIEW" => Keyword::unidentifiable_invalid(C::AnimeType),
    "PV" => Keyword::unidentifiable_invalid(C::AnimeType),

    // ── Audio terms ──────────────────────────────────────────────
    "2.0CH" => Keyword::new(C::AudioTerm),
    "2CH" => Keyword::new(C::AudioTerm),
    "5.1" => Keyword::new(C::AudioTerm),
    "5.1CH" => Keyword::new(C::AudioTerm),
    "DTS" => Keyword::new(C::AudioTerm),
    "DTS-ES" => Keyword::new(C::AudioTerm),
    "DTS5.1" => Keyword::new(C::AudioTerm),
    "TRUEHD5.1" => Keyword::new(C::AudioTerm),
    "AAC" => Keyword::new(C::AudioTerm),
    "AACX2" => Keyword::new(C::AudioTerm),
    "AACX3" => Keyword::new(C::AudioTerm),
    "AACX4" => Keyword::new(C::AudioTerm),
    "AC3" => Keyword::new(C::AudioTerm),
    "EAC3" => Keyword::new(C::AudioTerm),
    "E-AC-3" => Keyword::new(C::AudioTerm),
    "FLAC" => Keyword::new(C::AudioTerm),
    "FLACX2" => Keyword::new(C::AudioTerm),
    "FLACX3" => Keyword::new(C::AudioTerm),
    "FLACX4" => Keyword::new(C::AudioTerm),
    "LOSSLESS" => Keyword::new(C::AudioTerm),
    "MP3" => Keyword::new(C::AudioTerm),
    "OGG" => Keyword::new(C::AudioTerm),
    "VORBIS" => Keyword::new(C::AudioTerm),
    "DD2" => Keyword::new(C::AudioTerm),
    "DD2.0" => Keyword::new(C::AudioTerm),
    "DUALAUDIO" => Keyword::new(C::AudioTerm),
    "DUAL AUDIO" => Keyword::new(C::AudioTerm),

    // ── Device compatibility ─────────────────────────────────────
    "IPAD3" => Keyword::new(C::DeviceCompatibility),
    "IPHONE5" => Keyword::new(C::DeviceCompatibility),
    "IPOD" => Keyword::new(C::DeviceCompatibility),
    "PS3" => Keyword::new(C::DeviceCompatibility),
    "XBOX" => Keyword::new(C::DeviceCompatibility),
    "XBOX360" => Keyword::new(C::DeviceCompatibility),
    "ANDROID" => Keyword::unidentifiable(C::DeviceCompatibility),

    // ── Episode prefixes ─────────────────────────────────────────
    "EP" => Keyword::new(C::EpisodePrefix),
    "EP." => Keyword::new(C::EpisodePrefix),
    "EPS" => Keyword::new(C::EpisodePrefix),
    "EPS." => Keyword::new(C::EpisodePrefix),
    "EPISODE" => Keyword::new(C::EpisodePrefix),
    "EPISODE." => Keyword::new(C::EpisodePrefix),
    "EPISODES" => Keyword::new(C::EpisodePrefix),
    "CAPITULO" => Keyword::new(C::EpisodePrefix),
    "EPISODIO" => Keyword::new(C::EpisodePrefix),
    "FOLGE" => Keyword::new(C::EpisodePrefix),
    "E" => Keyword::invalid(C::EpisodePrefix),
    "第" => Keyword::invalid(C::EpisodePrefix),

    // ── Languages ────────────────────────────────────────────────
    "ENG" => Keyword::new(C::Language),
    "ENGLISH" => Keyword::new(C::Language),
    "ESPANOL" => Keyword::new(C::Language),
    "JAP" => Keyword::new(C::Language),
    "PT-BR" => Keyword::new(C::Language),
    "SPANISH" => Keyword::new(C::Language),
    "VOSTFR" => Keyword::new(C::Language),
    "ESP" => Keyword::unidentifiable(C::Language),
    "ITA" => Keyword::unidentifiable(C::Language),

    // ── Other ────────────────────────────────────────────────────
    "REMASTER" => Keyword::new(C::Other),
    "REMASTERED" => Keyword::new(C::Other),
    "UNCENSORED" => Keyword::new(C::Other),
    "UNCUT" => Keyword::new(C::Other),
    "TS" => Keyword::new(C::Other),
    "VFR" => Keyword::new(C::Other),
    "WIDESCREEN" => Keyword::new(C::Other),
    "WS" => Keyword::new(C::Other),

    // ── Release groups ───────────────────────────────────────────
    "THORA" => Keyword::new(C::ReleaseGroup),
    "HORRIBLESUBS" => Keyword::new(C::ReleaseGroup),
    "ERAI-RAWS" => Keyword::new(C::ReleaseGroup),

    // ── Release information ──────────────────────────────────────
    "BATCH" => Keyword::new(C::ReleaseInformation),
    "COMPLETE" => Keyword::new(C::ReleaseInformation),
    "PATCH" => Keyword::new(C::ReleaseInformation),
    "REMUX" => Keyword::new(C::ReleaseInformation),
    "END" => Keyword::unidentifiable(C::ReleaseInformation),
    "FINAL" => Keyword::unidentifiable(C::ReleaseInformation),

    // ── Release versions ─────────────────────────────────────────
    "V0" => Keyword::new(C::ReleaseVersion),
    "V1" => Keyword::new(C::ReleaseVersion),
    "V2" => Keyword::new(C::ReleaseVersion),
    "V3" => Keyword::new(C::ReleaseVersion),
    "V4" => Keyword::new(C::ReleaseVersion),

    // ── Sources ──────────────────────────────────────────────────
    "BD" => Keyword::new(C::Source),
    "BDRIP" => Keyword::new(C::Source),
    "BLURAY" => Keyword::new(C::Source),
    "BLU-RAY" => Keyword::new(C::Source),
    "DVD" => Keyword::new(C::Source),
    "DVD5" => Keyword::new(C::Source),
    "DVD9" => Keyword::new(C::Source),
    "DVD-R2J" => Keyword::new(C::Source),
    "DVDRIP" => Keyword::new(C::Source),
    "DVD-RIP" => Keyword::new(C::Source),
    "R2DVD" => Keyword::new(C::Source),
    "R2J" => Keyword::new(C::Source),
    "R2JDVD" => Keyword::new(C::Source),
    "R2JDVDRIP" => Keyword::new(C::Source),
    "HDTV" => Keyword::new(C::Source),
    "HDTVRIP" => Keyword::new(C::Source),
    "TVRIP" => Keyword::new(C::Source),
    "TV-RIP" => Keyword::new(C::Source),
    "WEBCAST" => Keyword::new(C::Source),
    "WEBRIP" => Keyword::new(C::Source),

    // ── Subtitles ────────────────────────────────────────────────
    "ASS" => Keyword::new(C::Subtitles),
    "BIG5" => Keyword::new(C::Subtitles),
    "DUB" => Keyword::new(C::Subtitles),
    "DUBBED" => Keyword::new(C::Subtitles),
    "HARDSUB" => Keyword::new(C::Subtitles),
    "HARDSUBS" => Keyword::new(C::Subtitles),
    "RAW" => Keyword::new(C::Subtitles),
    "SOFTSUB" => Keyword::new(C::Subtitles),
    "SOFTSUBS" => Keyword::new(C::Subtitles),
    "SUB" => Keyword::new(C::Subtitles),
    "SUBBED" => Keyword::new(C::Subtitles),
    "SUBTITLED" => Keyword::new(C::Subtitles),

    // ── Video terms ──────────────────────────────────────────────
    "23.976FPS" => Keyword::new(C::VideoTerm),
    "24FPS" => Keyword::new(C::VideoTerm),
    "29.97FPS" => Keyword::new(C::VideoTerm),
    "30FPS" => Keyword::new(C::VideoTerm),
    "60FPS" => Keyword::new(C::VideoTerm),
    "120FPS" => Keyword::new(C::VideoTerm),
    "8BIT" => Keyword::new(C::VideoTerm),
    "8-BIT" => Keyword::new(C::VideoTerm),
    "10BIT" => Keyword::new(C::VideoTerm),
    "10BITS" => Keyword::new(C::VideoTerm),
    "10-BIT" => Keyword::new(C::VideoTerm),
    "10-BITS" => Keyword::new(C::VideoTerm),
    "HI10" => Keyword::new(C::VideoTerm),
    "HI10P" => Keyword::new(C::VideoTerm),
    "HI444" => Keyword::new(C::VideoTerm),
    "HI444P" => Keyword::new(C::VideoTerm),
    "HI444PP" => Keyword::new(C::VideoTerm),
    "H264" => Keyword::new(C::VideoTerm),
    "H265" => Keyword::new(C::VideoTerm),
    "H.264" => Keyword::new(C::VideoTerm),
    "H.265" => Keyword::new(C::VideoTerm),
    "X264" => Keyword::new(C::VideoTerm),
    "X265" => Keyword::new(C::VideoTerm),
    "X.264" => Keyword::new(C::VideoTerm),
    "AVC" => Keyword::new(C::VideoTerm),
    "HEVC" => Keyword::new(C::VideoTerm),
    "HEVC2" => Keyword::new(C::VideoTerm),
    "DIVX" => Keyword::new(C::VideoTerm),
    "DIVX5" => Keyword::new(C::VideoTerm),
    "DIVX6" => Keyword::new(C::VideoTerm),
    "XVID" => Keyword::new(C::VideoTerm),
    "AVI" => Keyword::new(C::VideoTerm),
    "RMVB" => Keyword::new(C::VideoTerm),
    "WMV" => Keyword::new(C::VideoTerm),
    "WMV3" => Keyword::new(C::VideoTerm),
    "WMV9" => Keyword::new(C::VideoTerm),
    "HQ" => Keyword::new(C::VideoTerm),
    "LQ" => Keyword::new(C::VideoTerm),
    "HD" => Keyword::new(C::VideoTerm),
    "SD" => Keyword::new(C::VideoTerm),

    // ── Volume prefixes ──────────────────────────────────────────
    "VOL" => Keyword::new(C::VolumePrefix),
    "VOL." => Keyword::new(C::VolumePrefix),
    "VOLUME" => Keyword::new(C::VolumePrefix),
};

/// File extensions, kept apart from [`KEYWORDS`] so that terms such as
/// "FLAC" resolve differently as an extension and as an audio term.
pub static FILE_EXTENSIONS: phf::Map<&'static str, Keyword> = phf_map! {
    // ── Video containers ─────────────────────────────────────────
    "3GP" => Keyword::new(C::FileExtension),
    "AVI" => Keyword::new(C::FileExtension),
    "DIVX" => Keyword::new(C::FileExtension),
    "FLV" => Keyword::new(C::FileExtension),
    "M2TS" => Keyword::new(C::FileExtension),
    "MKV" => Keyword::new(C::FileExtension),
    "MOV" => Keyword::new(C::FileExtension),
    "MP4" => Keyword::new(C::FileExtension),
    "MPG" => Keyword::new(C::FileExtension),
    "OGM" => Keyword::new(C::FileExtension),
    "RM" => Keyword::new(C::FileExtension),
    "RMVB" => Keyword::new(C::FileExtension),
    "TS" => Keyword::new(C::FileExtension),
    "WEBM" => Keyword::new(C::FileExtension),
    "WMV" => Keyword::new(C::FileExtension),

    // ── Audio, archive and subtitle files ────────────────────────
    "AAC" => Keyword::invalid(C::FileExtension),
    "AIFF" => Keyword::invalid(C::FileExtension),
    "FLAC" => Keyword::invalid(C::FileExtension),
    "M4A" => Keyword::invalid(C::FileExtension),
    "MP3" => Keyword::invalid(C::FileExtension),
    "MKA" => Keyword::invalid(C::FileExtension),
    "OGG" => Keyword::invalid(C::FileExtension),
    "WAV" => Keyword::invalid(C::FileExtension),
    "WMA" => Keyword::invalid(C::FileExtension),
    "7Z" => Keyword::invalid(C::FileExtension),
    "RAR" => Keyword::invalid(C::FileExtension),
    "ZIP" => Keyword::invalid(C::FileExtension),
    "ASS" => Keyword::invalid(C::FileExtension),
    "SRT" => Keyword::invalid(C::FileExtension),
};

/// Ambiguous phrases located in raw text before delimiter splitting,
/// in the order they are searched.
const PEEK_ENTRIES: &[(ElementCategory, &[&str])] = &[
    (C::AudioTerm, &["Dual Audio", "DualAudio"]),
    (C::VideoTerm, &["H264", "H.264", "h264", "h.264"]),
    (C::VideoResolution, &["480p", "720p", "1080p"]),
    (C::Source, &["Blu-Ray"]),
];

/// Byte range `[begin, end)` of a pre-identified phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

/// Read-only view over the general and file-extension dictionaries.
#[derive(Debug, Clone, Copy)]
pub struct KeywordTable {
    general: &'static phf::Map<&'static str, Keyword>,
    extensions: &'static phf::Map<&'static str, Keyword>,
}

static GLOBAL: KeywordTable = KeywordTable {
    general: &KEYWORDS,
    extensions: &FILE_EXTENSIONS,
};

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordTable {
    pub fn new() -> Self {
        GLOBAL
    }

    /// The process-wide table shared by every parse.
    pub fn global() -> &'static KeywordTable {
        &GLOBAL
    }

    /// Look up a normalized word.
    ///
    /// General lookups only succeed for entries stored under `category`
    /// (or under `Unknown`). `FileExtension` lookups consult the extension
    /// dictionary alone.
    pub fn find(&self, word: &str, category: ElementCategory) -> Option<Keyword> {
        if word.is_empty() {
            return None;
        }
        if category == ElementCategory::FileExtension {
            return self.extensions.get(word).copied();
        }
        self.general
            .get(word)
            .filter(|k| k.category == category || k.category == ElementCategory::Unknown)
            .copied()
    }

    /// Look up a normalized word in any category, general dictionary first.
    pub fn find_any(&self, word: &str) -> Option<Keyword> {
        if word.is_empty() {
            return None;
        }
        self.general
            .get(word)
            .or_else(|| self.extensions.get(word))
            .copied()
    }

    /// Locate the ambiguous phrases in `text`, record each hit in `elements`
    /// and return their spans ordered by `begin + end`.
    pub fn peek(&self, text: &str, elements: &mut Elements) -> Vec<Span> {
        let mut spans = Vec::new();
        for &(category, phrases) in PEEK_ENTRIES {
            for phrase in phrases {
                if let Some(begin) = text.find(phrase) {
                    elements.insert(category, *phrase);
                    spans.push(Span {
                        begin,
                        end: begin + phrase.len(),
                    });
                }
            }
        }
        spans.sort_by_key(|s| s.begin + s.end);
        spans
    }
}

/// Lookup key for a word: compatibility decomposition, then uppercase.
pub fn normalize(text: &str) -> String {
    text.nfkd().collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_respects_category() {
        let table = KeywordTable::global();
        let kw = table.find("FLAC", ElementCategory::AudioTerm).unwrap();
        assert_eq!(kw.category, ElementCategory::AudioTerm);
        assert!(table.find("FLAC", ElementCategory::VideoTerm).is_none());
        assert!(table.find("", ElementCategory::AudioTerm).is_none());
    }

    #[test]
    fn test_extension_dictionary_is_separate() {
        let table = KeywordTable::global();
        let ext = table.find("FLAC", ElementCategory::FileExtension).unwrap();
        assert_eq!(ext.category, ElementCategory::FileExtension);
        assert!(!ext.is_valid());
        assert!(table.find("MKV", ElementCategory::VideoTerm).is_none());
        assert!(table.find("MKV", ElementCategory::FileExtension).unwrap().is_valid());
    }

    #[test]
    fn test_find_any_prefers_general() {
        let table = KeywordTable::global();
        assert_eq!(table.find_any("AVI").unwrap().category, ElementCategory::VideoTerm);
        assert_eq!(table.find_any("MKV").unwrap().category, ElementCategory::FileExtension);
        assert!(table.find_any("TORADORA").is_none());
    }

    #[test]
    fn test_option_presets() {
        let e = KEYWORDS["E"];
        assert!(e.is_identifiable() && e.is_searchable() && !e.is_valid());
        let sp = KEYWORDS["SP"];
        assert!(!sp.is_identifiable() && !sp.is_searchable() && sp.is_valid());
        let op = KEYWORDS["OP"];
        assert!(!op.is_identifiable() && op.is_searchable() && !op.is_valid());
        assert_eq!(KEYWORDS["FLAC"].options, KeywordOptions::DEFAULT);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("h.264"), "H.264");
        assert_eq!(normalize("Ｈ２６４"), "H264");
        assert_eq!(normalize("Español"), "ESPAN\u{303}OL");
    }

    #[test]
    fn test_peek_orders_spans() {
        let table = KeywordTable::global();
        let mut elements = Elements::new();
        let spans = table.peek("Blu-Ray 1080p Dual Audio", &mut elements);
        assert_eq!(
            spans,
            vec![
                Span { begin: 0, end: 7 },
                Span { begin: 8, end: 13 },
                Span { begin: 14, end: 24 },
            ]
        );
        assert_eq!(elements.audio_term, vec!["Dual Audio"]);
        assert_eq!(elements.video_resolution.as_deref(), Some("1080p"));
        assert_eq!(elements.source, vec!["Blu-Ray"]);
    }

    #[test]
    fn test_peek_is_case_sensitive() {
        let mut elements = Elements::new();
        let spans = KeywordTable::global().peek("dual audio H265", &mut elements);
        assert!(spans.is_empty());
        assert_eq!(elements, Elements::new());
    }
}
