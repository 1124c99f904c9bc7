use serde::Serialize;

use crate::media::MediaItem;

/// How a bucket is treated once the plan is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    Renamable,
    Diagnostic,
    Delete,
}

/// Classification outcome. Declaration order is report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Unknown,
    PreviousRenameNewDateNotFound,
    PreviousRenameNewName,
    PreviousRenameNewDate,
    PreviousRenameMatch,
    Standard,
    GoProSequence,
    Samsung,
    HtcThumbnail,
    GoProDelete,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Unknown,
        Category::PreviousRenameNewDateNotFound,
        Category::PreviousRenameNewName,
        Category::PreviousRenameNewDate,
        Category::PreviousRenameMatch,
        Category::Standard,
        Category::GoProSequence,
        Category::Samsung,
        Category::HtcThumbnail,
        Category::GoProDelete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Unknown => "UNKNOWN",
            Category::PreviousRenameNewDateNotFound => "PREVIOUS RENAME, NEW DATE NOT FOUND",
            Category::PreviousRenameNewName => "PREVIOUS RENAME, NEW NAME",
            Category::PreviousRenameNewDate => "PREVIOUS RENAME, NEW DATE",
            Category::PreviousRenameMatch => "PREVIOUS RENAME MATCH",
            Category::Standard => "STANDARD",
            Category::GoProSequence => "GOPRO SEQUENCE",
            Category::Samsung => "SAMSUNG",
            Category::HtcThumbnail => "HTC THUMBNAIL",
            Category::GoProDelete => "GOPRO DELETE",
        }
    }

    pub fn kind(self) -> BucketKind {
        match self {
            Category::Unknown | Category::PreviousRenameNewDateNotFound | Category::PreviousRenameMatch => {
                BucketKind::Diagnostic
            }
            Category::GoProDelete => BucketKind::Delete,
            _ => BucketKind::Renamable,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed, ordered set of append-only buckets.
#[derive(Debug)]
pub struct BucketStore {
    buckets: Vec<Vec<MediaItem>>,
}

impl Default for BucketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BucketStore {
    pub fn new() -> Self {
        Self {
            buckets: Category::ALL.iter().map(|_| Vec::new()).collect(),
        }
    }

    pub fn push(&mut self, category: Category, item: MediaItem) {
        tracing::debug!("{} -> {}", item.file_name, category.label());
        self.buckets[category.index()].push(item);
    }

    pub fn get(&self, category: Category) -> &[MediaItem] {
        &self.buckets[category.index()]
    }

    /// Non-empty buckets in report order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[MediaItem])> {
        Category::ALL
            .iter()
            .map(move |&c| (c, self.get(c)))
            .filter(|(_, items)| !items.is_empty())
    }

    pub fn count_of_kind(&self, kind: BucketKind) -> usize {
        Category::ALL
            .iter()
            .filter(|c| c.kind() == kind)
            .map(|&c| self.get(c).len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand out the buckets of one kind, leaving them empty.
    pub(crate) fn take_kind(&mut self, kind: BucketKind) -> Vec<(Category, Vec<MediaItem>)> {
        Category::ALL
            .iter()
            .filter(|c| c.kind() == kind)
            .map(|&c| (c, std::mem::take(&mut self.buckets[c.index()])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_declaration_order() {
        for (i, c) in Category::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_push_preserves_encounter_order() {
        let mut store = BucketStore::new();
        store.push(Category::Standard, MediaItem::new("/d", "DSC_0002.JPG", "NIKON"));
        store.push(Category::Unknown, MediaItem::new("/d", "notes.txt", "NIKON"));
        store.push(Category::Standard, MediaItem::new("/d", "DSC_0001.JPG", "NIKON"));

        let names: Vec<_> = store.get(Category::Standard).iter().map(|m| m.file_name.as_str()).collect();
        assert_eq!(names, ["DSC_0002.JPG", "DSC_0001.JPG"]);
        assert_eq!(store.len(), 3);
        assert_eq!(store.count_of_kind(BucketKind::Renamable), 2);
        assert_eq!(store.count_of_kind(BucketKind::Diagnostic), 1);

        let order: Vec<_> = store.iter().map(|(c, _)| c).collect();
        assert_eq!(order, [Category::Unknown, Category::Standard]);
    }

    #[test]
    fn test_take_kind_empties_buckets() {
        let mut store = BucketStore::new();
        store.push(Category::GoProDelete, MediaItem::new("/d", "GOPR0001.THM", "GOPRO"));
        let taken = store.take_kind(BucketKind::Delete);
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].1.len(), 1);
        assert!(store.is_empty());
    }
}
