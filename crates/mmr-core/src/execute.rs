use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bucket::{BucketKind, BucketStore};
use crate::ThrottledProgress;

/// One rename or delete that did not happen.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub target: Option<PathBuf>,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionSummary {
    pub renamed: u64,
    pub rename_failures: Vec<FileFailure>,
    pub deleted: u64,
    pub delete_failures: Vec<FileFailure>,
}

/// Rename every item of the renamable buckets. Failures are logged and
/// collected; the remaining items are still processed.
pub fn apply_renames(buckets: &mut BucketStore, summary: &mut ExecutionSummary, progress: &ThrottledProgress<'_>) {
    let work = buckets.take_kind(BucketKind::Renamable);
    let total: u64 = work.iter().map(|(_, items)| items.len() as u64).sum();
    let mut current = 0u64;

    for (_, items) in work {
        for item in items {
            let Some(target) = item.planned_path() else {
                continue;
            };
            let source = item.path();
            match rename_no_clobber(&source, &target) {
                Ok(()) => summary.renamed += 1,
                Err(e) => {
                    tracing::error!("rename failed: {} -> {}: {}", source.display(), target.display(), e);
                    summary.rename_failures.push(FileFailure {
                        path: source,
                        target: Some(target),
                        error: e.to_string(),
                    });
                }
            }
            progress.report("rename", current, total, &item.file_name);
            current += 1;
        }
    }
}

/// Delete every item of the deletion bucket, with the same per-file isolation.
pub fn apply_deletions(buckets: &mut BucketStore, summary: &mut ExecutionSummary, progress: &ThrottledProgress<'_>) {
    let work = buckets.take_kind(BucketKind::Delete);
    let total: u64 = work.iter().map(|(_, items)| items.len() as u64).sum();
    let mut current = 0u64;

    for (_, items) in work {
        for item in items {
            let path = item.path();
            match fs::remove_file(&path) {
                Ok(()) => summary.deleted += 1,
                Err(e) => {
                    tracing::error!("delete failed: {}: {}", path.display(), e);
                    summary.delete_failures.push(FileFailure {
                        path,
                        target: None,
                        error: e.to_string(),
                    });
                }
            }
            progress.report("delete", current, total, &item.file_name);
            current += 1;
        }
    }
}

/// `fs::rename` replaces an existing target on most platforms; refuse instead.
fn rename_no_clobber(source: &Path, target: &Path) -> io::Result<()> {
    if fs::symlink_metadata(target).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("target already exists: {}", target.display()),
        ));
    }
    fs::rename(source, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Category;
    use crate::media::MediaItem;
    use std::fs::File;
    use std::io::{Read, Write};
    use tempfile::tempdir;

    fn planned(dir: &Path, from: &str, to: &str) -> MediaItem {
        let mut item = MediaItem::new(dir, from, "NIKON");
        item.set_planned_name(to.to_string());
        item
    }

    #[test]
    fn test_failure_does_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("DSC_0001.JPG")).unwrap();
        File::create(dir.path().join("DSC_0003.JPG")).unwrap();

        let mut buckets = BucketStore::new();
        buckets.push(Category::Standard, planned(dir.path(), "DSC_0001.JPG", "one.JPG"));
        // source missing
        buckets.push(Category::Standard, planned(dir.path(), "DSC_0002.JPG", "two.JPG"));
        buckets.push(Category::Samsung, planned(dir.path(), "DSC_0003.JPG", "three.JPG"));

        let cb = |_: &str, _: u64, _: u64, _: &str| {};
        let mut summary = ExecutionSummary::default();
        apply_renames(&mut buckets, &mut summary, &ThrottledProgress::new(&cb));

        assert_eq!(summary.renamed, 2);
        assert_eq!(summary.rename_failures.len(), 1);
        assert!(summary.rename_failures[0].path.ends_with("DSC_0002.JPG"));
        assert!(dir.path().join("one.JPG").exists());
        assert!(dir.path().join("three.JPG").exists());
    }

    #[test]
    fn test_never_overwrites() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("a.jpg")).unwrap().write_all(b"a").unwrap();
        File::create(dir.path().join("b.jpg")).unwrap().write_all(b"b").unwrap();

        let mut buckets = BucketStore::new();
        buckets.push(Category::Standard, planned(dir.path(), "a.jpg", "b.jpg"));
        let cb = |_: &str, _: u64, _: u64, _: &str| {};
        let mut summary = ExecutionSummary::default();
        apply_renames(&mut buckets, &mut summary, &ThrottledProgress::new(&cb));

        assert_eq!(summary.renamed, 0);
        assert_eq!(summary.rename_failures.len(), 1);
        let mut content = String::new();
        File::open(dir.path().join("b.jpg")).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "b");
    }

    #[test]
    fn test_diagnostic_buckets_are_untouched() {
        let dir = tempdir().unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        File::create(dir.path().join("GOPR0001.THM")).unwrap();

        let mut buckets = BucketStore::new();
        buckets.push(Category::Unknown, MediaItem::new(dir.path(), "notes.txt", "GOPRO"));
        buckets.push(Category::GoProDelete, MediaItem::new(dir.path(), "GOPR0001.THM", "GOPRO"));
        buckets.push(Category::GoProDelete, MediaItem::new(dir.path(), "GOPR0002.THM", "GOPRO"));

        let cb = |_: &str, _: u64, _: u64, _: &str| {};
        let tp = ThrottledProgress::new(&cb);
        let mut summary = ExecutionSummary::default();
        apply_renames(&mut buckets, &mut summary, &tp);
        assert!(dir.path().join("GOPR0001.THM").exists());

        apply_deletions(&mut buckets, &mut summary, &tp);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.delete_failures.len(), 1);
        assert!(!dir.path().join("GOPR0001.THM").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert_eq!(buckets.get(Category::Unknown).len(), 1);
    }
}
