use std::process::ExitCode;

use clap::Parser;
use deepmatch::harness::{self, Reporter};
use deepmatch::{Config, Value};
use tracing::{debug, Level};

/// Compare a JSON document against an expected value written in the
/// operator notation.
#[derive(Parser, Debug)]
#[command(name = "dmatch", author, version, about)]
struct Args {
    /// Got value, as JSON
    got: String,
    /// Expected value: JSON plus operator calls such as Between(1, 5)
    expected: String,
    /// Maximum number of mismatches to report (-1 for all)
    #[arg(long, allow_negative_numbers = true)]
    max_errors: Option<i64>,
    /// Name of the root in reported paths
    #[arg(long)]
    root: Option<String>,
    /// Report mismatches as fatal failures
    #[arg(long)]
    fatal: bool,
    /// Base configuration, as JSON
    #[arg(long)]
    config: Option<String>,
    /// Log comparison details to stderr
    #[arg(long, short)]
    verbose: bool,
}

struct StderrReporter;

impl Reporter for StderrReporter {
    fn report_failure(&self, message: &str) {
        eprintln!("{message}");
    }

    fn report_fatal_failure(&self, message: &str) {
        eprintln!("FATAL: {message}");
    }
}

fn usage_error(what: &str, err: impl std::fmt::Display) -> ExitCode {
    eprintln!("{what}: {err}");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let mut config = match args.config.as_deref() {
        Some(raw) => match serde_json::from_str::<Config>(raw) {
            Ok(c) => c,
            Err(e) => return usage_error("Invalid config", e),
        },
        None => Config::default(),
    };
    if let Some(n) = args.max_errors {
        config = config.with_max_errors(n);
    }
    if let Some(root) = args.root.as_deref() {
        config = config.with_root_name(root);
    }
    if args.fatal {
        config = config.with_fatal(true);
    }
    debug!(?config, "configuration");

    let got: serde_json::Value = match serde_json::from_str(&args.got) {
        Ok(v) => v,
        Err(e) => return usage_error("Invalid JSON", e),
    };
    let expected = match deepmatch::parse_expected(&args.expected) {
        Ok(v) => v,
        Err(e) => return usage_error("Invalid expected value", e),
    };

    if harness::cmp(&StderrReporter, &config, &Value::from(got), &expected, None) {
        println!("ok");
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
