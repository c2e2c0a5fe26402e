//! Focus Nudge CLI
//!
//! Builds daily activity timelines and feedback nudges from classified screenshots.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use focus_nudge::{
    config::Config,
    frames::{self, DirFrameStore, FrameResult},
    timeline::Timeline,
    triggers::FeedbackDocument,
    Engine, VERSION,
};

#[derive(Parser)]
#[command(name = "focus-nudge")]
#[command(version = VERSION)]
#[command(about = "Daily activity timelines and gentle focus nudges", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the timeline and feedback events for one day
    Run {
        #[command(flatten)]
        input: FrameInput,

        /// Output directory for artifacts (defaults to the configured artifacts path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Build only the timeline for one day
    Timeline {
        #[command(flatten)]
        input: FrameInput,

        /// Output directory for artifacts (defaults to the configured artifacts path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Detect feedback events from an existing timeline artifact
    Triggers {
        /// Path to a timeline_<date>.json file
        timeline: PathBuf,

        /// Output directory for artifacts (defaults to the configured artifacts path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// List the screenshots found in a day directory
    Scan {
        /// Day directory holding HH-MM-SS.png captures
        dir: PathBuf,

        /// Local date of the captures
        #[arg(long)]
        date: NaiveDate,
    },

    /// Show configuration
    Config,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args)]
struct FrameInput {
    /// JSON file with the day's classified frames
    frames: PathBuf,

    /// Directory holding the screenshots (defaults to the frames file's directory)
    #[arg(long)]
    images: Option<PathBuf>,

    /// Local date of the day (defaults to the first frame's date)
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Treat classifier field issues as errors
    #[arg(long)]
    strict: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.clone();
    let result = match cli.command {
        Commands::Run { input, output } => cmd_run(config_path.as_deref(), &input, output, true),
        Commands::Timeline { input, output } => {
            cmd_run(config_path.as_deref(), &input, output, false)
        }
        Commands::Triggers { timeline, output } => {
            cmd_triggers(config_path.as_deref(), &timeline, output)
        }
        Commands::Scan { dir, date } => cmd_scan(&dir, date),
        Commands::Config => cmd_config(config_path.as_deref()),
        Commands::InitConfig { force } => cmd_init_config(config_path.as_deref(), force),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}

/// Build artifacts from a frames file. Feedback is only written when `with_feedback` is set.
fn cmd_run(
    config_path: Option<&Path>,
    input: &FrameInput,
    output: Option<PathBuf>,
    with_feedback: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::new(config).context("Invalid configuration")?;

    let frames = frames::load_frames(&input.frames, input.strict)
        .with_context(|| format!("Failed to read frames from {}", input.frames.display()))?;

    let images = input.images.clone().unwrap_or_else(|| {
        input
            .frames
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let store = DirFrameStore::new(images);
    let date = resolve_date(&engine, input.date, &frames);

    let timeline = engine.build_timeline(date, &frames, &store)?;
    let out_dir = output.unwrap_or_else(|| engine.config().artifacts_path.clone());

    let timeline_path = write_timeline(&out_dir, &timeline)?;
    println!("Timeline: {}", timeline_path.display());
    for line in &timeline.timeline_human_readable {
        println!("  {line}");
    }

    if with_feedback {
        let feedback = engine.feedback_for(&timeline);
        let feedback_path = write_feedback(&out_dir, &feedback)?;
        println!();
        println!(
            "Feedback: {} ({} events)",
            feedback_path.display(),
            feedback.feedback_events.len()
        );
        print_events(&feedback);
    }

    Ok(())
}

fn cmd_triggers(config_path: Option<&Path>, timeline: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::new(config).context("Invalid configuration")?;

    let timeline = Timeline::load(timeline)
        .with_context(|| format!("Failed to read timeline from {}", timeline.display()))?;

    let feedback = engine.feedback_for(&timeline);
    let out_dir = output.unwrap_or_else(|| engine.config().artifacts_path.clone());
    let feedback_path = write_feedback(&out_dir, &feedback)?;

    println!(
        "Feedback: {} ({} events)",
        feedback_path.display(),
        feedback.feedback_events.len()
    );
    print_events(&feedback);
    Ok(())
}

fn cmd_scan(dir: &Path, date: NaiveDate) -> Result<()> {
    let store = DirFrameStore::new(dir);
    let captures = store
        .list_day_frames(date)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    if captures.is_empty() {
        println!("No captures found in {}", dir.display());
        return Ok(());
    }

    println!("Found {} capture(s) for {}", captures.len(), date);
    for (timestamp, name) in &captures {
        println!("  {}  {}", timestamp.format("%H:%M:%S"), name);
    }
    Ok(())
}

fn cmd_config(config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);
    let config = load_config(config_path)?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", path);
    if !path.exists() {
        println!("(file not found, showing defaults)");
    }
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if let Err(e) = config.validate() {
        println!();
        println!("Warning: {e}");
    }
    Ok(())
}

fn cmd_init_config(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::default()
        .save_to(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Explicit date, else the first frame's date, else today in the configured zone.
fn resolve_date(engine: &Engine, explicit: Option<NaiveDate>, frames: &[FrameResult]) -> NaiveDate {
    explicit
        .or_else(|| frames.first().map(|f| f.timestamp.date()))
        .unwrap_or_else(|| Utc::now().with_timezone(&engine.timezone()).date_naive())
}

fn write_timeline(out_dir: &Path, timeline: &Timeline) -> Result<PathBuf> {
    let json = timeline.to_json()?;
    write_artifact(out_dir, &timeline.file_name(), &json)
}

fn write_feedback(out_dir: &Path, feedback: &FeedbackDocument) -> Result<PathBuf> {
    let json = feedback.to_json()?;
    write_artifact(out_dir, &feedback.file_name(), &json)
}

fn write_artifact(out_dir: &Path, name: &str, json: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(name);
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn print_events(feedback: &FeedbackDocument) {
    for event in &feedback.feedback_events {
        println!(
            "  {}  {:<14} {}  {}",
            event.time_local,
            event.trigger_type.as_str(),
            event.level.as_str(),
            event.message
        );
    }
}
