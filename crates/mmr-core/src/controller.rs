use std::io::Write;

use crate::camera_tag::CameraTags;
use crate::date::MetadataSource;
use crate::execute::{self, ExecutionSummary};
use crate::plan::{self, RenamePlan};
use crate::{report, walk, ProgressCallback, RenameOptions, ThrottledProgress};

pub const RENAME_PROMPT: &str = "Rename these?";
pub const DELETE_PROMPT: &str = "Delete these?";

/// Blocking operator confirmation.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Phases of one run: collect, report, then the two confirmation gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Collecting,
    Reported,
    RenameConfirmed,
    RenameAborted,
    DeleteConfirmed,
    DeleteAborted,
    Done,
}

/// Drives a single run. The metadata backend and the confirmation capability
/// are borrowed for the lifetime of the run.
pub struct Controller<'a> {
    options: &'a RenameOptions,
    metadata: &'a dyn MetadataSource,
    confirm: &'a mut dyn Confirm,
    state: RunState,
    plan: Option<RenamePlan>,
}

impl<'a> Controller<'a> {
    pub fn new(options: &'a RenameOptions, metadata: &'a dyn MetadataSource, confirm: &'a mut dyn Confirm) -> Self {
        Self {
            options,
            metadata,
            confirm,
            state: RunState::Collecting,
            plan: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn plan(&self) -> Option<&RenamePlan> {
        self.plan.as_ref()
    }

    /// Walk the target directory and classify everything. Any error here is
    /// fatal and happens before the filesystem is touched.
    pub fn collect(&mut self, progress_callback: &ProgressCallback<'_>) -> anyhow::Result<&RenamePlan> {
        self.expect_state(RunState::Collecting, "collect")?;
        if self.plan.is_some() {
            anyhow::bail!("collect called twice");
        }

        let tags = match &self.options.camera_tags {
            Some(path) => CameraTags::from_json_file(path)?,
            None => CameraTags::default(),
        };
        let root = self
            .options
            .directory
            .canonicalize()
            .map_err(|e| anyhow::anyhow!("Path does not exist: {}: {}", self.options.directory.display(), e))?;
        let batches = walk::scan(&root, self.options.recursive, &tags)?;

        let tp = ThrottledProgress::new(progress_callback);
        let plan = plan::collect(&batches, self.metadata, &tp);
        tracing::info!(
            "classified {} files in {} directories",
            plan.buckets.len(),
            batches.len()
        );
        Ok(&*self.plan.insert(plan))
    }

    /// Print the buckets and write the JSON export if requested.
    pub fn report(&mut self, out: &mut dyn Write) -> anyhow::Result<()> {
        self.expect_state(RunState::Collecting, "report")?;
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("report called before collect"))?;

        write!(out, "{}", report::render_report(plan))?;
        writeln!(out)?;
        if let Some(path) = &self.options.plan_json {
            report::write_plan_json(plan, path)?;
            tracing::info!("plan written to {}", path.display());
        }
        self.transition(RunState::Reported);
        Ok(())
    }

    /// Ask for each confirmation and apply what was accepted. Per-file
    /// failures end up in the summary, never in the returned error.
    pub fn execute(
        &mut self,
        out: &mut dyn Write,
        progress_callback: &ProgressCallback<'_>,
    ) -> anyhow::Result<ExecutionSummary> {
        self.expect_state(RunState::Reported, "execute")?;
        let mut plan = self
            .plan
            .take()
            .ok_or_else(|| anyhow::anyhow!("execute called without a plan"))?;
        let tp = ThrottledProgress::new(progress_callback);
        let mut summary = ExecutionSummary::default();

        if self.options.dry_run {
            writeln!(out, "Dry run: nothing renamed or deleted.")?;
            self.transition(RunState::Done);
            return Ok(summary);
        }

        if !plan.has_renames() {
            writeln!(out, "Nothing to rename.")?;
            self.transition(RunState::RenameAborted);
        } else if self.confirm.confirm(RENAME_PROMPT) {
            self.transition(RunState::RenameConfirmed);
            execute::apply_renames(&mut plan.buckets, &mut summary, &tp);
            writeln!(
                out,
                "Rename completed: {} renamed, {} failed.",
                summary.renamed,
                summary.rename_failures.len()
            )?;
        } else {
            writeln!(out, "Rename aborted.")?;
            self.transition(RunState::RenameAborted);
        }

        if plan.has_deletions() {
            if self.confirm.confirm(DELETE_PROMPT) {
                self.transition(RunState::DeleteConfirmed);
                execute::apply_deletions(&mut plan.buckets, &mut summary, &tp);
                writeln!(
                    out,
                    "Delete completed: {} deleted, {} failed.",
                    summary.deleted,
                    summary.delete_failures.len()
                )?;
            } else {
                writeln!(out, "Delete aborted.")?;
                self.transition(RunState::DeleteAborted);
            }
        }

        self.transition(RunState::Done);
        Ok(summary)
    }

    fn expect_state(&self, expected: RunState, phase: &str) -> anyhow::Result<()> {
        if self.state != expected {
            anyhow::bail!("cannot {} in state {:?}", phase, self.state);
        }
        Ok(())
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!("run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
