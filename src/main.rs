//! settle - wait for a device log line with a bounded retry budget
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use settle::config::{init_config_dir, load_settings, PollSettings};
use settle::core::{logging, LinePattern};
use settle::device::{FileLogSource, LogSource, WaitSession};
use settle::{run_wait, HeadlessEvent, WaitReport, WaitRequest};

/// Exit code for errors (as opposed to a timed-out wait)
const EXIT_ERROR: i32 = 2;

/// settle - wait for a device log line with a bounded retry budget
#[derive(Parser, Debug)]
#[command(name = "settle")]
#[command(about = "Poll device logs until a line matches, or give up", long_about = None)]
struct Args {
    /// Regex that must match a whole log line
    #[arg(short, long, required_unless_present = "init")]
    pattern: Option<String>,

    /// Component tag to read records for (repeatable)
    #[arg(short, long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Maximum number of attempts (overrides config)
    #[arg(long)]
    attempts: Option<u32>,

    /// Milliseconds between attempts (overrides config)
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Read records from a file instead of the configured source
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Write a separator first and only consider records after it
    #[arg(long)]
    separate: bool,

    /// Print capture groups of the last matching line instead of the line
    #[arg(long)]
    last: bool,

    /// Emit NDJSON events on stdout
    #[arg(long)]
    json: bool,

    /// Create .settle/config.toml and exit
    #[arg(long)]
    init: bool,

    /// Directory containing .settle/ (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,
}

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("Failed to install error reporter: {e}");
    }

    let args = Args::parse();
    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(report) => {
            eprintln!("{report:?}");
            std::process::exit(EXIT_ERROR);
        }
    }
}

fn run(args: Args) -> color_eyre::Result<i32> {
    if let Err(e) = logging::init() {
        eprintln!("Warning: file logging disabled: {e}");
    }

    let base_path = args
        .config_dir
        .clone()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if args.init {
        init_config_dir(&base_path)?;
        eprintln!("Created {}", base_path.join(".settle/config.toml").display());
        return Ok(0);
    }

    let settings = load_settings(&base_path);
    let policy = PollSettings {
        max_attempts: args.attempts.unwrap_or(settings.poll.max_attempts),
        interval_ms: args.interval_ms.unwrap_or(settings.poll.interval_ms),
    }
    .to_policy()?;

    let source: Box<dyn LogSource> = match &args.file {
        Some(path) => Box::new(FileLogSource::new(path)),
        None => settings.source.build()?,
    };

    let request = WaitRequest {
        pattern: LinePattern::new(args.pattern.as_deref().unwrap_or_default())?,
        components: args.tags.clone(),
        separate: args.separate,
        last: args.last,
    };

    let mut session = WaitSession::new(source, policy);
    let json = args.json;
    let report = run_wait(&mut session, &request, &mut |event: HeadlessEvent| {
        if json {
            event.emit();
        }
    })?;

    if !json {
        match &report {
            WaitReport::Matched {
                line: Some(line), ..
            } => println!("{line}"),
            WaitReport::Matched {
                captures: Some(captures),
                ..
            } => println!("{}", captures.join("\t")),
            WaitReport::Matched { .. } => {}
            WaitReport::TimedOut { attempts } => eprintln!(
                "Timed out after {attempts} attempt(s) waiting for '{}'",
                request.pattern
            ),
        }
    }

    Ok(report.exit_code())
}
