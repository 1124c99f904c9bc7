use std::path::PathBuf;

use serde::Serialize;

const PHOTO_EXTENSIONS: &[&str] = &["nef", "jpg", "jpeg", "mpo", "png", "dng", "heic"];
const VIDEO_EXTENSIONS: &[&str] = &["mov", "mp4", "m4v", "3gp"];
/// Camera sidecars (GoPro thumbnails, low-res previews) that are deleted rather than renamed.
const SIDECAR_EXTENSIONS: &[&str] = &["thm", "lrv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaKind {
    Photo,
    Video,
    SidecarForDeletion,
    NonMedia,
}

impl MediaKind {
    /// Derive the kind from a lower-cased extension.
    pub fn from_extension(ext_lower: &str) -> Self {
        if PHOTO_EXTENSIONS.contains(&ext_lower) {
            MediaKind::Photo
        } else if VIDEO_EXTENSIONS.contains(&ext_lower) {
            MediaKind::Video
        } else if SIDECAR_EXTENSIONS.contains(&ext_lower) {
            MediaKind::SidecarForDeletion
        } else {
            MediaKind::NonMedia
        }
    }

    pub fn is_media(self) -> bool {
        self != MediaKind::NonMedia
    }
}

#[derive(Debug, Clone)]
pub struct MediaItem {
    /// Absolute directory containing the file
    pub dir: PathBuf,
    /// File name as found on disk
    pub file_name: String,
    /// Name without the final extension
    pub base_name: String,
    /// Extension as spelled in the file name (empty if none)
    pub ext: String,
    /// Lower-cased extension, used for kind detection
    pub ext_lower: String,
    kind: MediaKind,
    /// Tag derived from the containing directory name
    pub camera_tag: String,
    planned_name: Option<String>,
}

impl MediaItem {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>, camera_tag: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let (base_name, ext) = split_file_name(&file_name);
        let ext_lower = ext.to_lowercase();
        let kind = if base_name.is_empty() || ext.is_empty() {
            MediaKind::NonMedia
        } else {
            MediaKind::from_extension(&ext_lower)
        };
        Self {
            dir: dir.into(),
            base_name: base_name.to_string(),
            ext: ext.to_string(),
            ext_lower,
            file_name,
            kind,
            camera_tag: camera_tag.into(),
            planned_name: None,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    pub fn planned_name(&self) -> Option<&str> {
        self.planned_name.as_deref()
    }

    pub fn planned_path(&self) -> Option<PathBuf> {
        self.planned_name.as_ref().map(|name| self.dir.join(name))
    }

    /// Record the final name. Empty names are ignored.
    pub(crate) fn set_planned_name(&mut self, name: String) {
        if !name.is_empty() {
            self.planned_name = Some(name);
        }
    }

    pub(crate) fn clear_planned_name(&mut self) {
        self.planned_name = None;
    }
}

/// Split at the last dot. A name without a dot has no extension.
fn split_file_name(file_name: &str) -> (&str, &str) {
    match file_name.rsplit_once('.') {
        Some((base, ext)) => (base, ext),
        None => (file_name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MediaItem::new("/d", "DSC_1000.JPG", "NIKON").kind(), MediaKind::Photo);
        assert_eq!(MediaItem::new("/d", "GOPR0001.MP4", "GOPRO").kind(), MediaKind::Video);
        assert_eq!(MediaItem::new("/d", "GOPR0001.THM", "GOPRO").kind(), MediaKind::SidecarForDeletion);
        assert_eq!(MediaItem::new("/d", "notes.txt", "NIKON").kind(), MediaKind::NonMedia);
        assert_eq!(MediaItem::new("/d", "README", "NIKON").kind(), MediaKind::NonMedia);
        assert_eq!(MediaItem::new("/d", ".jpg", "NIKON").kind(), MediaKind::NonMedia);
    }

    #[test]
    fn test_file_parts() {
        let item = MediaItem::new("/d", "2013-02-19 8.46.18.jpg", "SAMSUNG");
        assert_eq!(item.base_name, "2013-02-19 8.46.18");
        assert_eq!(item.ext, "jpg");

        let item = MediaItem::new("/d", "DSC_1000.JPG", "NIKON");
        assert_eq!(item.ext, "JPG");
        assert_eq!(item.ext_lower, "jpg");
        assert!(item.planned_name().is_none());
    }
}
