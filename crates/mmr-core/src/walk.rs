use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::camera_tag::CameraTags;

/// Files of one tagged directory, sorted by name.
#[derive(Debug, Clone)]
pub struct DirectoryBatch {
    pub dir: PathBuf,
    pub camera_tag: String,
    /// Regular files to classify
    pub files: Vec<String>,
    /// Every entry name in the directory (files, subdirectories, links)
    pub occupied: Vec<String>,
}

/// Collect the directories to process.
///
/// Non-recursive: only `root`, tagged by its own name. Recursive: `root` and
/// every directory below it, each tagged by its own name. Directories without
/// a tag are skipped with a warning.
pub fn scan(root: &Path, recursive: bool, tags: &CameraTags) -> anyhow::Result<Vec<DirectoryBatch>> {
    if !root.is_dir() {
        anyhow::bail!("path does not exist or is not a directory: {}", root.display());
    }
    let dirs: Vec<PathBuf> = if recursive {
        let mut dirs = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }
        dirs
    } else {
        vec![root.to_path_buf()]
    };

    let mut batches = Vec::new();
    for dir in dirs {
        let Some(tag) = tags.tag_for_dir(&dir) else {
            tracing::warn!(
                "could not determine camera from directory name {:?}; skipping {}",
                dir.file_name().unwrap_or_default(),
                dir.display()
            );
            continue;
        };
        let tag = tag.to_string();
        batches.push(list_dir(&dir, tag)?);
    }
    Ok(batches)
}

fn list_dir(dir: &Path, camera_tag: String) -> anyhow::Result<DirectoryBatch> {
    let mut files = Vec::new();
    let mut occupied = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!("skipping non UTF-8 file name {}", entry.path().display());
            continue;
        };
        occupied.push(name.to_string());
        if entry.file_type().is_file() {
            files.push(name.to_string());
        }
    }
    Ok(DirectoryBatch {
        dir: dir.to_path_buf(),
        camera_tag,
        files,
        occupied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_non_recursive_uses_root_tag() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("Nikon D90");
        fs::create_dir_all(root.join("GoPro")).unwrap();
        File::create(root.join("b.jpg")).unwrap();
        File::create(root.join("a.jpg")).unwrap();
        File::create(root.join("GoPro").join("c.jpg")).unwrap();

        let batches = scan(&root, false, &CameraTags::default()).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].camera_tag, "NIKON");
        assert_eq!(batches[0].files, ["a.jpg", "b.jpg"]);
        assert_eq!(batches[0].occupied, ["GoPro", "a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_recursive_tags_each_directory() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("photos");
        fs::create_dir_all(root.join("GoPro Hero")).unwrap();
        fs::create_dir_all(root.join("Misc")).unwrap();
        fs::create_dir_all(root.join("Misc").join("old nikon")).unwrap();
        File::create(root.join("GoPro Hero").join("G0000001.jpg")).unwrap();
        File::create(root.join("Misc").join("old nikon").join("DSC_0001.JPG")).unwrap();

        let batches = scan(&root, true, &CameraTags::default()).unwrap();
        let tags: Vec<_> = batches.iter().map(|b| b.camera_tag.as_str()).collect();
        assert_eq!(tags, ["GOPRO", "NIKON"]);
        assert_eq!(batches[1].files, ["DSC_0001.JPG"]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let tmp = tempdir().unwrap();
        let tags = CameraTags::default();
        assert!(scan(&tmp.path().join("nikon-missing"), false, &tags).is_err());
        assert!(scan(&tmp.path().join("nikon-missing"), true, &tags).is_err());
    }
}
