use rayon::prelude::*;

use crate::bucket::{BucketKind, BucketStore, Category};
use crate::classify::{Classification, Classifier, Outcome};
use crate::date::{MetadataSource, TimestampResolver};
use crate::media::MediaItem;
use crate::naming::NameRegistry;
use crate::walk::DirectoryBatch;
use crate::ThrottledProgress;

/// All buckets after classification, before anything is touched on disk.
#[derive(Debug, Default)]
pub struct RenamePlan {
    pub buckets: BucketStore,
}

impl RenamePlan {
    pub fn has_renames(&self) -> bool {
        self.buckets.count_of_kind(BucketKind::Renamable) > 0
    }

    pub fn has_deletions(&self) -> bool {
        self.buckets.count_of_kind(BucketKind::Delete) > 0
    }
}

fn is_eligible(file_name: &str) -> bool {
    !file_name.eq_ignore_ascii_case("thumbs.db")
}

/// Classify every file and assign collision-free names.
///
/// Classification (and the metadata reads behind it) runs in parallel within
/// a directory; names are assigned afterwards, one item at a time, in
/// directory order. Progress is reported from that sequential pass.
pub fn collect(
    batches: &[DirectoryBatch],
    metadata: &dyn MetadataSource,
    progress: &ThrottledProgress<'_>,
) -> RenamePlan {
    let classifier = Classifier::new(TimestampResolver::new(metadata));
    let total: u64 = batches
        .iter()
        .map(|b| b.files.iter().filter(|f| is_eligible(f)).count() as u64)
        .sum();
    let mut current = 0u64;
    let mut plan = RenamePlan::default();

    for batch in batches {
        let classified: Vec<(MediaItem, Classification)> = batch
            .files
            .par_iter()
            .filter(|name| is_eligible(name))
            .map(|name| {
                let item = MediaItem::new(&batch.dir, name.as_str(), batch.camera_tag.as_str());
                let classification = classifier.classify(&item);
                (item, classification)
            })
            .collect();

        let mut registry = NameRegistry::new(&batch.occupied);
        for (item, classification) in classified {
            progress.report("classify", current, total, &item.file_name);
            current += 1;
            place(&mut plan.buckets, &mut registry, item, classification.outcome);
        }
    }
    plan
}

fn place(buckets: &mut BucketStore, registry: &mut NameRegistry, mut item: MediaItem, outcome: Outcome) {
    match outcome {
        Outcome::Skip => {}
        Outcome::Diagnostic(category) => buckets.push(category, item),
        Outcome::Delete => buckets.push(Category::GoProDelete, item),
        Outcome::Rename(category, descriptor) => {
            let final_name = registry.assign_unique_name(&item.file_name, &descriptor.render());
            if final_name == item.file_name {
                item.clear_planned_name();
                buckets.push(Category::PreviousRenameMatch, item);
            } else {
                item.set_planned_name(final_name);
                buckets.push(category, item);
            }
        }
    }
}
