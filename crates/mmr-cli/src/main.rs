mod logging;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mmr_core::{Confirm, Controller, FileMetadata, RenameOptions};

#[derive(Parser)]
#[command(name = "mmr", version, about = "Rename photos and videos to a date-based canonical form")]
struct Cli {
    /// Directory whose name identifies the camera
    #[arg(short, long)]
    directory: PathBuf,

    /// Also process every subdirectory, each tagged by its own name
    #[arg(short, long)]
    recursive: bool,

    /// JSON file with [{"pattern": "...", "tag": "..."}] replacing the built-in camera table
    #[arg(long)]
    camera_tags: Option<PathBuf>,

    /// Print the plan without prompting or touching any file
    #[arg(long)]
    dry_run: bool,

    /// Write the plan as JSON to this path
    #[arg(long)]
    plan_json: Option<PathBuf>,

    /// More log output (-v info, -vv debug); MMR_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Reads a y/n answer from stdin. Only `y` accepts.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} (y/N): ", prompt);
        if let Err(e) = io::stdout().flush() {
            tracing::warn!("could not flush prompt: {}", e);
        }
        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(_) => input.trim().eq_ignore_ascii_case("y"),
            Err(e) => {
                tracing::warn!("could not read answer: {}", e);
                false
            }
        }
    }
}

fn progress_bar() -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::default_bar().template("[{bar:40}] {percent:>3}% {msg}")?);
    Ok(pb)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);
    let t_total = std::time::Instant::now();

    let options = RenameOptions {
        directory: cli.directory,
        recursive: cli.recursive,
        camera_tags: cli.camera_tags,
        dry_run: cli.dry_run,
        plan_json: cli.plan_json,
    };

    let metadata = FileMetadata::new();
    let mut confirm = StdinConfirm;
    let mut controller = Controller::new(&options, &metadata, &mut confirm);

    let pb = progress_bar()?;
    controller.collect(&|stage, current, total, _message| {
        pb.set_length(total);
        pb.set_position(current + 1);
        pb.set_message(stage.to_string());
    })?;
    pb.finish_and_clear();

    let mut stdout = io::stdout();
    controller.report(&mut stdout)?;

    let pb = progress_bar()?;
    let summary = controller.execute(&mut stdout, &|stage, current, total, message| {
        pb.set_length(total);
        pb.set_position(current + 1);
        pb.set_message(format!("{} {}", stage, message));
    })?;
    pb.finish_and_clear();

    for failure in summary.rename_failures.iter().chain(&summary.delete_failures) {
        eprintln!("  failed: {} ({})", failure.path.display(), failure.error);
    }
    eprintln!(
        "Done! {} renamed, {} deleted, {} failures ({:.2}s)",
        summary.renamed,
        summary.deleted,
        summary.rename_failures.len() + summary.delete_failures.len(),
        t_total.elapsed().as_secs_f64()
    );

    Ok(())
}
