use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::bucket::{BucketKind, Category};
use crate::media::MediaKind;
use crate::plan::RenamePlan;

const HEADER_WIDTH: usize = 75;
const NAME_COLUMN: usize = 36;

/// Human-readable listing of every non-empty bucket, in category order.
pub fn render_report(plan: &RenamePlan) -> String {
    let mut out = String::new();
    for (category, items) in plan.buckets.iter() {
        let label = category.label();
        let count = items.len().to_string();
        let fill = HEADER_WIDTH.saturating_sub(label.len() + count.len());
        let _ = writeln!(out);
        let _ = writeln!(out, "-- {} {} {} Files {}", label, "-".repeat(fill), count, "-".repeat(5));

        for item in items {
            match (category, item.planned_name()) {
                (Category::PreviousRenameNewDateNotFound, _) => {
                    let _ = writeln!(out, "   {}", item.path().display());
                }
                (_, Some(new_name)) if category.kind() == BucketKind::Renamable => {
                    let _ = writeln!(out, "{:>width$}  ->  {}", item.file_name, new_name, width = NAME_COLUMN);
                }
                _ => {
                    let _ = writeln!(out, "   {}", item.file_name);
                }
            }
        }
    }
    out
}

#[derive(Serialize)]
struct PlannedFile<'a> {
    directory: &'a Path,
    file_name: &'a str,
    planned_name: Option<&'a str>,
    camera_tag: &'a str,
    kind: MediaKind,
}

#[derive(Serialize)]
struct PlannedBucket<'a> {
    category: &'static str,
    action: &'static str,
    files: Vec<PlannedFile<'a>>,
}

#[derive(Serialize)]
struct PlanJson<'a> {
    buckets: Vec<PlannedBucket<'a>>,
}

/// Write the plan as pretty JSON, one entry per non-empty bucket.
pub fn write_plan_json(plan: &RenamePlan, path: &Path) -> anyhow::Result<()> {
    let json = PlanJson {
        buckets: plan
            .buckets
            .iter()
            .map(|(category, items)| PlannedBucket {
                category: category.label(),
                action: match category.kind() {
                    BucketKind::Renamable => "rename",
                    BucketKind::Diagnostic => "none",
                    BucketKind::Delete => "delete",
                },
                files: items
                    .iter()
                    .map(|m| PlannedFile {
                        directory: &m.dir,
                        file_name: &m.file_name,
                        planned_name: m.planned_name(),
                        camera_tag: &m.camera_tag,
                        kind: m.kind(),
                    })
                    .collect(),
            })
            .collect(),
    };

    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, &json)?;
    Ok(())
}
