use std::collections::HashSet;

use crate::date::CanonicalTimestamp;

/// Structured target name: `{date}[_{seq}]_{tag}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameDescriptor {
    pub timestamp: CanonicalTimestamp,
    /// Original image number, kept verbatim
    pub sequence: Option<String>,
    /// Directory tag, possibly followed by auxiliary markers (`NIKON_HDR`)
    pub camera_tag: String,
    pub ext: String,
}

impl NameDescriptor {
    pub fn new(timestamp: CanonicalTimestamp, camera_tag: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            timestamp,
            sequence: None,
            camera_tag: camera_tag.into(),
            ext: ext.into(),
        }
    }

    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    /// Append an auxiliary marker to the tag segment.
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.camera_tag = format!("{}_{}", self.camera_tag, marker);
        self
    }

    pub fn render(&self) -> String {
        match &self.sequence {
            Some(seq) => format!("{}_{}_{}.{}", self.timestamp, seq, self.camera_tag, self.ext),
            None => format!("{}_{}.{}", self.timestamp, self.camera_tag, self.ext),
        }
    }
}

/// Occupied and planned names of one directory.
///
/// Keys are compared case-insensitively so a plan stays collision-free on
/// case-folding filesystems as well.
#[derive(Debug, Default)]
pub struct NameRegistry {
    existing: HashSet<String>,
    planned: HashSet<String>,
}

impl NameRegistry {
    /// `existing` lists every entry currently in the directory.
    pub fn new<I, S>(existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            existing: existing.into_iter().map(|s| name_key(s.as_ref())).collect(),
            planned: HashSet::new(),
        }
    }

    /// Pick the first free name among `proposed`, `stem_1.ext`, `stem_2.ext`, ...
    /// and claim it. The item's own current name is never a collision for itself.
    pub fn assign_unique_name(&mut self, current_name: &str, proposed: &str) -> String {
        let own_key = name_key(current_name);
        let (stem, ext) = match proposed.rsplit_once('.') {
            Some((stem, ext)) => (stem, Some(ext)),
            None => (proposed, None),
        };

        let mut candidate = proposed.to_string();
        let mut counter = 0u32;
        loop {
            let key = name_key(&candidate);
            let on_disk = self.existing.contains(&key) && key != own_key;
            if !on_disk && !self.planned.contains(&key) {
                self.planned.insert(key);
                return candidate;
            }
            counter += 1;
            candidate = match ext {
                Some(ext) => format!("{}_{}.{}", stem, counter, ext),
                None => format!("{}_{}", stem, counter),
            };
        }
    }
}

fn name_key(name: &str) -> String {
    name.to_lowercase()
}
