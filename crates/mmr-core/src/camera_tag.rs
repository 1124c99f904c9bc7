use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Built-in rules: "<substring of directory name>" -> "<tag>"
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("gopro", "GOPRO"),
    ("nikon", "NIKON"),
    ("canon", "CANON"),
    ("sony", "SONY"),
    ("fuji", "FUJI"),
    ("olympus", "OLYMPUS"),
    ("panasonic", "PANASONIC"),
    ("samsung", "SAMSUNG"),
    ("galaxy", "SAMSUNG"),
    ("iphone", "IPHONE"),
    ("ipad", "IPAD"),
    ("pixel", "PIXEL"),
    ("htc", "HTC"),
    ("dji", "DJI"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraTagRule {
    pub pattern: String,
    pub tag: String,
}

/// Ordered directory-name -> camera tag table. First matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraTags {
    rules: Vec<CameraTagRule>,
}

impl Default for CameraTags {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULES
                .iter()
                .map(|(pattern, tag)| CameraTagRule {
                    pattern: pattern.to_string(),
                    tag: tag.to_string(),
                })
                .collect(),
        )
    }
}

impl CameraTags {
    pub fn new(rules: Vec<CameraTagRule>) -> Self {
        Self { rules }
    }

    /// Load a JSON array of `{"pattern": ..., "tag": ...}` objects.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("cannot open camera tag table {}: {}", path.display(), e))?;
        let rules: Vec<CameraTagRule> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("invalid camera tag table {}: {}", path.display(), e))?;
        if let Some(bad) = rules.iter().find(|r| r.pattern.is_empty() || r.tag.is_empty()) {
            anyhow::bail!("camera tag rule with empty pattern or tag: {:?}", bad);
        }
        Ok(Self::new(rules))
    }

    /// Case-insensitive substring match against a directory name.
    pub fn tag_for(&self, dir_name: &str) -> Option<&str> {
        let name = dir_name.to_lowercase();
        self.rules
            .iter()
            .find(|rule| name.contains(&rule.pattern.to_lowercase()))
            .map(|rule| rule.tag.as_str())
    }

    /// Tag for the last component of `dir`.
    pub fn tag_for_dir(&self, dir: &Path) -> Option<&str> {
        let name = dir.file_name()?.to_str()?;
        self.tag_for(name)
    }
}
