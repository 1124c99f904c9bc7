pub mod exif;
pub mod quicktime;

use std::fmt;
use std::path::Path;

use chrono::{Local, NaiveDateTime, TimeZone};
use filetime::FileTime;

use crate::media::{MediaItem, MediaKind};

/// Canonical token format: `YYYY_MMDD_HHMMSS`.
pub const CANONICAL_FORMAT: &str = "%Y_%m%d_%H%M%S";
const METADATA_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Metadata tags consulted for the capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    DateTimeOriginal,
    TrackCreateDate,
}

impl MetadataField {
    /// Field used for a media kind, if the kind carries one.
    pub fn for_kind(kind: MediaKind) -> Option<Self> {
        match kind {
            MediaKind::Photo => Some(MetadataField::DateTimeOriginal),
            MediaKind::Video => Some(MetadataField::TrackCreateDate),
            MediaKind::SidecarForDeletion | MediaKind::NonMedia => None,
        }
    }

    pub fn tag_name(self) -> &'static str {
        match self {
            MetadataField::DateTimeOriginal => "EXIF:DateTimeOriginal",
            MetadataField::TrackCreateDate => "QuickTime:TrackCreateDate",
        }
    }
}

/// Error returned by a metadata lookup. Treated as data: the resolver falls back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    MissingField,
    Unreadable(String),
    Malformed(String),
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataError::MissingField => write!(f, "metadata field not present"),
            MetadataError::Unreadable(msg) => write!(f, "cannot read file: {}", msg),
            MetadataError::Malformed(msg) => write!(f, "malformed metadata: {}", msg),
        }
    }
}

impl std::error::Error for MetadataError {}

/// Tag extraction backend.
pub trait MetadataSource: Send + Sync {
    fn lookup(&self, field: MetadataField, path: &Path) -> Result<String, MetadataError>;
}

/// Reads EXIF from photos and track headers from QuickTime/MP4 videos.
#[derive(Debug, Default)]
pub struct FileMetadata;

impl FileMetadata {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataSource for FileMetadata {
    fn lookup(&self, field: MetadataField, path: &Path) -> Result<String, MetadataError> {
        match field {
            MetadataField::DateTimeOriginal => exif::read_date_time_original(path),
            MetadataField::TrackCreateDate => quicktime::read_track_create_date(path),
        }
    }
}

/// A capture time rendered as `YYYY_MMDD_HHMMSS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CanonicalTimestamp(NaiveDateTime);

impl CanonicalTimestamp {
    pub fn new(dt: NaiveDateTime) -> Self {
        Self(dt)
    }

    /// Parse a metadata value such as `2020:05:01 12:30:00` (slashes allowed).
    pub fn parse_metadata(value: &str) -> Option<Self> {
        let cleaned = value.trim().replace('/', ":");
        NaiveDateTime::parse_from_str(&cleaned, METADATA_FORMAT).ok().map(Self)
    }

    /// Parse an already-canonical token such as `2020_0501_123000`.
    pub fn parse_token(token: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(token, CANONICAL_FORMAT).ok().map(Self)
    }

    pub fn token(&self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }
}

impl fmt::Display for CanonicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Metadata first, file modification time second.
pub struct TimestampResolver<'a> {
    metadata: &'a dyn MetadataSource,
}

impl<'a> TimestampResolver<'a> {
    pub fn new(metadata: &'a dyn MetadataSource) -> Self {
        Self { metadata }
    }

    pub fn resolve(&self, item: &MediaItem) -> Option<CanonicalTimestamp> {
        self.metadata_only(item).or_else(|| {
            tracing::debug!("{}: using modification time", item.file_name);
            modified_time(&item.path())
        })
    }

    /// Embedded capture time only, no modification time fallback.
    pub fn metadata_only(&self, item: &MediaItem) -> Option<CanonicalTimestamp> {
        let field = MetadataField::for_kind(item.kind())?;
        let path = item.path();
        match self.metadata.lookup(field, &path) {
            Ok(value) => {
                let ts = CanonicalTimestamp::parse_metadata(&value);
                if ts.is_none() {
                    tracing::debug!("{}: unparseable {} value {:?}", path.display(), field.tag_name(), value);
                }
                ts
            }
            Err(e) => {
                tracing::debug!("{}: {} unavailable ({})", path.display(), field.tag_name(), e);
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<CanonicalTimestamp> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) => {
            tracing::warn!("{}: cannot read modification time: {}", path.display(), e);
            return None;
        }
    };
    let mtime = FileTime::from_last_modification_time(&meta);
    let local = Local.timestamp_opt(mtime.unix_seconds(), 0).earliest()?;
    Some(CanonicalTimestamp(local.naive_local()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs::File;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// In-memory backend keyed by file name.
    #[derive(Default)]
    pub(crate) struct StubMetadata {
        values: HashMap<String, String>,
        pub(crate) lookups: Mutex<Vec<String>>,
    }

    impl StubMetadata {
        pub(crate) fn with(mut self, file_name: &str, value: &str) -> Self {
            self.values.insert(file_name.to_string(), value.to_string());
            self
        }
    }

    impl MetadataSource for StubMetadata {
        fn lookup(&self, _field: MetadataField, path: &Path) -> Result<String, MetadataError> {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            self.lookups.lock().unwrap().push(name.clone());
            self.values.get(&name).cloned().ok_or(MetadataError::MissingField)
        }
    }

    pub(crate) fn set_mtime(path: &Path, local: &str) {
        let dt = NaiveDateTime::parse_from_str(local, METADATA_FORMAT).unwrap();
        let secs = Local.from_local_datetime(&dt).earliest().unwrap().timestamp();
        filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
    }

    #[test]
    fn test_parse_metadata_value() {
        let ts = CanonicalTimestamp::parse_metadata("2020:05:01 12:30:00").unwrap();
        assert_eq!(ts.token(), "2020_0501_123000");
        let ts = CanonicalTimestamp::parse_metadata("2020/05/01 12:30:00").unwrap();
        assert_eq!(ts.token(), "2020_0501_123000");
        assert!(CanonicalTimestamp::parse_metadata("0000:00:00 00:00:00").is_none());
        assert!(CanonicalTimestamp::parse_metadata("yesterday").is_none());
    }

    #[test]
    fn test_parse_token() {
        assert!(CanonicalTimestamp::parse_token("2013_0531_163007").is_some());
        assert!(CanonicalTimestamp::parse_token("2013_1331_163007").is_none());
    }

    #[test]
    fn test_resolve_prefers_metadata() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("DSC_1000.JPG")).unwrap();
        let stub = StubMetadata::default().with("DSC_1000.JPG", "2020:05:01 12:30:00");
        let item = MediaItem::new(dir.path(), "DSC_1000.JPG", "NIKON");
        let ts = TimestampResolver::new(&stub).resolve(&item).unwrap();
        assert_eq!(ts.token(), "2020_0501_123000");
    }

    #[test]
    fn test_resolve_falls_back_to_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("DSC_1001.JPG");
        File::create(&path).unwrap();
        set_mtime(&path, "2019:12:24 18:00:05");
        let stub = StubMetadata::default().with("DSC_1001.JPG", "garbage");
        let item = MediaItem::new(dir.path(), "DSC_1001.JPG", "NIKON");
        let ts = TimestampResolver::new(&stub).resolve(&item).unwrap();
        assert_eq!(ts.token(), "2019_1224_180005");
    }

    #[test]
    fn test_metadata_only_ignores_mtime() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("DSC_1002.JPG");
        File::create(&path).unwrap();
        set_mtime(&path, "2019:12:24 18:00:05");
        let stub = StubMetadata::default();
        let item = MediaItem::new(dir.path(), "DSC_1002.JPG", "NIKON");
        let resolver = TimestampResolver::new(&stub);
        assert!(resolver.metadata_only(&item).is_none());
        assert!(resolver.resolve(&item).is_some());
    }

    #[test]
    fn test_resolve_fails_without_file() {
        let dir = tempdir().unwrap();
        let stub = StubMetadata::default();
        let item = MediaItem::new(dir.path(), "gone.mov", "GOPRO");
        assert!(TimestampResolver::new(&stub).resolve(&item).is_none());
    }
}
