use serde::{Deserialize, Serialize};

/// The semantic category of a parsed element or a keyword.
///
/// `AnimeSeasonPrefix`, `EpisodePrefix` and `VolumePrefix` only classify
/// keywords and hold no output storage. `Unknown` is the unclassified
/// sentinel accepted by every category-filtered keyword lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    AnimeSeason,
    AnimeSeasonPrefix,
    AnimeTitle,
    AnimeType,
    AnimeYear,
    AudioTerm,
    DeviceCompatibility,
    EpisodeNumber,
    EpisodeNumberAlt,
    EpisodePrefix,
    EpisodeTitle,
    FileChecksum,
    FileExtension,
    FileName,
    Language,
    Other,
    ReleaseGroup,
    ReleaseInformation,
    ReleaseVersion,
    Source,
    Subtitles,
    VideoResolution,
    VideoTerm,
    VolumeNumber,
    VolumePrefix,
    Unknown,
}

impl ElementCategory {
    /// Whether the generic keyword pass may populate this category.
    pub fn is_searchable(self) -> bool {
        matches!(
            self,
            Self::AnimeSeasonPrefix
                | Self::AnimeType
                | Self::AudioTerm
                | Self::DeviceCompatibility
                | Self::EpisodePrefix
                | Self::FileChecksum
                | Self::Language
                | Self::Other
                | Self::ReleaseGroup
                | Self::ReleaseInformation
                | Self::ReleaseVersion
                | Self::Source
                | Self::Subtitles
                | Self::VideoResolution
                | Self::VideoTerm
                | Self::VolumePrefix
        )
    }

    /// Whether a repeated keyword hit for this category should be ignored
    /// once the category holds a value.
    pub fn is_singular(self) -> bool {
        !matches!(
            self,
            Self::AnimeSeason
                | Self::AnimeType
                | Self::AudioTerm
                | Self::DeviceCompatibility
                | Self::EpisodeNumber
                | Self::Language
                | Self::Other
                | Self::ReleaseInformation
                | Self::Source
                | Self::VideoTerm
        )
    }
}

/// Storage behind one category.
enum Slot<'a> {
    Single(&'a mut Option<String>),
    Multi(&'a mut Vec<String>),
}

/// Parsed elements extracted from an anime filename.
///
/// Singular categories keep the last value written. Multi categories keep
/// insertion order and never hold the same value twice. A category is
/// absent exactly when nothing has been inserted into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Elements {
    /// Season numbers. "S1-S3" yields `["1", "3"]`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anime_season: Vec<String>,
    /// The anime title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anime_title: Option<String>,
    /// Type markers such as "OVA", "Movie" or "NCOP".
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub anime_type: Vec<String>,
    /// Year of release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anime_year: Option<String>,
    /// Audio codecs, channel layouts and audio language terms.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audio_term: Vec<String>,
    /// Devices the release targets (e.g. "PS3").
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub device_compatibility: Vec<String>,
    /// Episode numbers, kept as written. "01-10" yields `["01", "10"]`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub episode_number: Vec<String>,
    /// Absolute episode numbers given next to a per-season number.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub episode_number_alt: Vec<String>,
    /// Episode title (text after the episode number).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    /// CRC32 checksum (e.g. "ABCD1234").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_checksum: Option<String>,
    /// File extension without the dot (e.g. "mkv").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    /// The filename exactly as given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Language tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub language: Vec<String>,
    /// Recognized terms with no dedicated category (e.g. "Uncensored").
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<String>,
    /// Release group name (e.g. "SubsPlease").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_group: Option<String>,
    /// Release information such as "Batch" or "Complete".
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub release_information: Vec<String>,
    /// Release versions without the leading "v".
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub release_version: Vec<String>,
    /// Sources (e.g. "BD", "DVD").
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source: Vec<String>,
    /// Subtitle-related tags.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtitles: Vec<String>,
    /// Video resolution as written ("1080p", "1280x720", "720").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_resolution: Option<String>,
    /// Video codecs, bit depth, frame rate and quality terms.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub video_term: Vec<String>,
    /// Volume numbers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volume_number: Vec<String>,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, category: ElementCategory) -> Option<Slot<'_>> {
        use ElementCategory as C;
        let slot = match category {
            C::AnimeTitle => Slot::Single(&mut self.anime_title),
            C::AnimeYear => Slot::Single(&mut self.anime_year),
            C::EpisodeTitle => Slot::Single(&mut self.episode_title),
            C::FileChecksum => Slot::Single(&mut self.file_checksum),
            C::FileExtension => Slot::Single(&mut self.file_extension),
            C::FileName => Slot::Single(&mut self.file_name),
            C::ReleaseGroup => Slot::Single(&mut self.release_group),
            C::VideoResolution => Slot::Single(&mut self.video_resolution),
            C::AnimeSeason => Slot::Multi(&mut self.anime_season),
            C::AnimeType => Slot::Multi(&mut self.anime_type),
            C::AudioTerm => Slot::Multi(&mut self.audio_term),
            C::DeviceCompatibility => Slot::Multi(&mut self.device_compatibility),
            C::EpisodeNumber => Slot::Multi(&mut self.episode_number),
            C::EpisodeNumberAlt => Slot::Multi(&mut self.episode_number_alt),
            C::Language => Slot::Multi(&mut self.language),
            C::Other => Slot::Multi(&mut self.other),
            C::ReleaseInformation => Slot::Multi(&mut self.release_information),
            C::ReleaseVersion => Slot::Multi(&mut self.release_version),
            C::Source => Slot::Multi(&mut self.source),
            C::Subtitles => Slot::Multi(&mut self.subtitles),
            C::VideoTerm => Slot::Multi(&mut self.video_term),
            C::VolumeNumber => Slot::Multi(&mut self.volume_number),
            C::AnimeSeasonPrefix | C::EpisodePrefix | C::VolumePrefix | C::Unknown => {
                return None
            }
        };
        Some(slot)
    }

    /// Insert a value. Singular categories are overwritten; multi categories
    /// append unless the value is already present.
    pub fn insert(&mut self, category: ElementCategory, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            return;
        }
        match self.slot(category) {
            Some(Slot::Single(field)) => *field = Some(value),
            Some(Slot::Multi(list)) => {
                if !list.contains(&value) {
                    list.push(value);
                }
            }
            None => {}
        }
    }

    /// Clear every value of a category.
    pub fn erase(&mut self, category: ElementCategory) {
        match self.slot(category) {
            Some(Slot::Single(field)) => *field = None,
            Some(Slot::Multi(list)) => list.clear(),
            None => {}
        }
    }

    /// Remove one value from a multi category. A singular category is
    /// cleared regardless of its value.
    pub fn remove(&mut self, category: ElementCategory, value: &str) {
        match self.slot(category) {
            Some(Slot::Single(field)) => *field = None,
            Some(Slot::Multi(list)) => list.retain(|v| v != value),
            None => {}
        }
    }

    pub fn contains(&self, category: ElementCategory) -> bool {
        !self.get(category).is_empty()
    }

    /// All values of a category in insertion order.
    pub fn get(&self, category: ElementCategory) -> Vec<&str> {
        use ElementCategory as C;
        fn single(field: &Option<String>) -> Vec<&str> {
            field.as_deref().into_iter().collect()
        }
        fn multi(list: &[String]) -> Vec<&str> {
            list.iter().map(String::as_str).collect()
        }
        match category {
            C::AnimeTitle => single(&self.anime_title),
            C::AnimeYear => single(&self.anime_year),
            C::EpisodeTitle => single(&self.episode_title),
            C::FileChecksum => single(&self.file_checksum),
            C::FileExtension => single(&self.file_extension),
            C::FileName => single(&self.file_name),
            C::ReleaseGroup => single(&self.release_group),
            C::VideoResolution => single(&self.video_resolution),
            C::AnimeSeason => multi(&self.anime_season),
            C::AnimeType => multi(&self.anime_type),
            C::AudioTerm => multi(&self.audio_term),
            C::DeviceCompatibility => multi(&self.device_compatibility),
            C::EpisodeNumber => multi(&self.episode_number),
            C::EpisodeNumberAlt => multi(&self.episode_number_alt),
            C::Language => multi(&self.language),
            C::Other => multi(&self.other),
            C::ReleaseInformation => multi(&self.release_information),
            C::ReleaseVersion => multi(&self.release_version),
            C::Source => multi(&self.source),
            C::Subtitles => multi(&self.subtitles),
            C::VideoTerm => multi(&self.video_term),
            C::VolumeNumber => multi(&self.volume_number),
            C::AnimeSeasonPrefix | C::EpisodePrefix | C::VolumePrefix | C::Unknown => Vec::new(),
        }
    }

    /// The first value of a category, if any.
    pub fn first(&self, category: ElementCategory) -> Option<String> {
        self.get(category).first().map(|v| (*v).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_overwrites() {
        let mut e = Elements::new();
        e.insert(ElementCategory::AnimeTitle, "First");
        e.insert(ElementCategory::AnimeTitle, "Second");
        assert_eq!(e.anime_title.as_deref(), Some("Second"));
    }

    #[test]
    fn test_multi_deduplicates_in_order() {
        let mut e = Elements::new();
        e.insert(ElementCategory::AudioTerm, "FLAC");
        e.insert(ElementCategory::AudioTerm, "AAC");
        e.insert(ElementCategory::AudioTerm, "FLAC");
        assert_eq!(e.audio_term, vec!["FLAC", "AAC"]);
    }

    #[test]
    fn test_get_borrows_values() {
        let mut e = Elements::new();
        e.insert(ElementCategory::ReleaseGroup, "Group");
        e.insert(ElementCategory::EpisodeNumber, "01");
        e.insert(ElementCategory::EpisodeNumber, "02");
        let group = e.get(ElementCategory::ReleaseGroup);
        let episodes = e.get(ElementCategory::EpisodeNumber);
        assert_eq!(group, vec!["Group"]);
        assert_eq!(episodes, vec!["01", "02"]);
        assert!(e.get(ElementCategory::AnimeSeason).is_empty());
        assert_eq!(e.first(ElementCategory::EpisodeNumber).as_deref(), Some("01"));
    }

    #[test]
    fn test_contains_tracks_presence() {
        let mut e = Elements::new();
        assert!(!e.contains(ElementCategory::EpisodeNumber));
        e.insert(ElementCategory::EpisodeNumber, "01");
        assert!(e.contains(ElementCategory::EpisodeNumber));
        e.remove(ElementCategory::EpisodeNumber, "01");
        assert!(!e.contains(ElementCategory::EpisodeNumber));
    }

    #[test]
    fn test_erase_and_remove() {
        let mut e = Elements::new();
        e.insert(ElementCategory::AnimeType, "OVA");
        e.insert(ElementCategory::AnimeType, "Movie");
        e.remove(ElementCategory::AnimeType, "OVA");
        assert_eq!(e.anime_type, vec!["Movie"]);
        e.insert(ElementCategory::EpisodeTitle, "Pool Opening");
        e.erase(ElementCategory::EpisodeTitle);
        assert_eq!(e.episode_title, None);
    }

    #[test]
    fn test_prefix_categories_have_no_storage() {
        let mut e = Elements::new();
        e.insert(ElementCategory::EpisodePrefix, "EP");
        assert!(!e.contains(ElementCategory::EpisodePrefix));
        assert_eq!(e, Elements::new());
    }

    #[test]
    fn test_category_tables() {
        assert!(ElementCategory::AudioTerm.is_searchable());
        assert!(!ElementCategory::AnimeTitle.is_searchable());
        assert!(!ElementCategory::EpisodeNumber.is_searchable());
        assert!(ElementCategory::ReleaseGroup.is_singular());
        assert!(ElementCategory::ReleaseVersion.is_singular());
        assert!(!ElementCategory::Source.is_singular());
    }

    #[test]
    fn test_serialization_skips_absent() {
        let mut e = Elements::new();
        e.insert(ElementCategory::AnimeTitle, "Toradora!");
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"{"anime_title":"Toradora!"}"#);
    }
}
