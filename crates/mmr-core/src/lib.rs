pub mod bucket;
pub mod camera_tag;
pub mod classify;
pub mod controller;
pub mod date;
pub mod execute;
pub mod media;
pub mod naming;
pub mod plan;
pub mod report;
pub mod walk;

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub use bucket::{BucketKind, BucketStore, Category};
pub use controller::{Confirm, Controller, RunState};
pub use date::{FileMetadata, MetadataError, MetadataField, MetadataSource};
pub use execute::{ExecutionSummary, FileFailure};
pub use plan::RenamePlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameOptions {
    pub directory: PathBuf,
    #[serde(default)]
    pub recursive: bool,
    /// JSON file replacing the built-in camera tag table
    #[serde(default)]
    pub camera_tags: Option<PathBuf>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub plan_json: Option<PathBuf>,
}

impl RenameOptions {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            recursive: false,
            camera_tags: None,
            dry_run: false,
            plan_json: None,
        }
    }
}

/// Type alias for progress callback
pub type ProgressCallback<'a> = dyn Fn(&str, u64, u64, &str) + Send + Sync + 'a;

/// Throttled progress reporter: emits at most every 200ms or on completion.
pub struct ThrottledProgress<'a> {
    inner: &'a ProgressCallback<'a>,
    last_emit: Mutex<Instant>,
}

impl<'a> ThrottledProgress<'a> {
    pub fn new(inner: &'a ProgressCallback<'a>) -> Self {
        let start = Instant::now();
        Self {
            inner,
            last_emit: Mutex::new(start.checked_sub(Duration::from_secs(1)).unwrap_or(start)),
        }
    }

    pub fn report(&self, stage: &str, current: u64, total: u64, message: &str) {
        let is_done = current + 1 >= total;
        if !is_done {
            let mut last = match self.last_emit.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if last.elapsed() < Duration::from_millis(200) {
                return;
            }
            *last = Instant::now();
        }
        (self.inner)(stage, current, total, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_throttle_keeps_first_and_last() {
        let calls = AtomicU64::new(0);
        let last = Mutex::new(0u64);
        let cb = |_: &str, current: u64, _: u64, _: &str| {
            calls.fetch_add(1, Ordering::Relaxed);
            *last.lock().unwrap() = current;
        };
        let tp = ThrottledProgress::new(&cb);
        for i in 0..1000 {
            tp.report("classify", i, 1000, "");
        }
        let n = calls.load(Ordering::Relaxed);
        assert!(n >= 2 && n < 1000);
        assert_eq!(*last.lock().unwrap(), 999);
    }

    #[test]
    fn test_options_defaults_from_json() {
        let opts: RenameOptions = serde_json::from_str(r#"{"directory": "/photos/GoPro"}"#).unwrap();
        assert_eq!(opts.directory, PathBuf::from("/photos/GoPro"));
        assert!(!opts.recursive);
        assert!(!opts.dry_run);
        assert!(opts.camera_tags.is_none());
    }
}
