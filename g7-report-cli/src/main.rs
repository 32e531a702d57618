//! G7 Color Report CLI Application
//!
//! Interactive weekly color check for a fleet of printers. It uses the
//! g7-report-core library and adds:
//! - Configuration (reference path, log directory, printer list)
//! - Session state (selected printer, week label, current report)
//! - Text display of the upload, ΔE chart and summary metrics
//! - One-shot mode for scripted checks (`--upload`, `--log`, `--json`)

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

mod config;
mod render;
mod session;

use config::AppConfig;
use g7_report_core::ReferenceSet;
use session::Session;

/// G7 Color Report - Compare spectro measurements against the G7 reference
#[derive(Parser, Debug)]
#[command(name = "g7-report")]
#[command(about = "Weekly color management report for printer spectro data", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reference L*a*b* data (overrides the config file)
    #[arg(long, value_name = "FILE")]
    reference: Option<PathBuf>,

    /// Directory for logged reports (overrides the config file)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Printer to report on, by 1-based number or exact name
    #[arg(short, long, value_name = "PRINTER")]
    printer: Option<String>,

    /// Date/week label for the report
    #[arg(short, long, value_name = "LABEL")]
    week: Option<String>,

    /// Spectro export to compare (.csv or .txt); skips the interactive prompt
    #[arg(short, long, value_name = "FILE")]
    upload: Option<PathBuf>,

    /// Log the report after an --upload
    #[arg(long, requires = "upload")]
    log: bool,

    /// Print the report summary as JSON (with --upload)
    #[arg(long, requires = "upload")]
    json: bool,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("G7 Report CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using report library v{}", g7_report_core::VERSION);

    let config = resolve_config(&args)?;

    // Reference data is required before any interaction
    let reference = ReferenceSet::load(&config.reference.path)
        .context("⚠️ Could not load G7 reference data")?;

    let mut session = Session::new(config, &reference);
    if let Some(printer) = &args.printer {
        session.select_printer(printer)?;
    }
    if let Some(week) = &args.week {
        session.set_week(week);
    }

    match &args.upload {
        Some(path) => one_shot_mode(&mut session, path, &args),
        None => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            writeln!(stdout, "🎨 Weekly Color Management - {}", session.printer())?;
            session.run(stdin.lock(), &mut stdout)
        }
    }
}

/// Load the config file (if any) and apply command-line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(reference) = &args.reference {
        config.reference.path = reference.clone();
    }
    if let Some(log_dir) = &args.log_dir {
        config.logging.log_dir = log_dir.clone();
    }

    log::debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Compare one upload, display it, optionally log it, then exit
fn one_shot_mode(session: &mut Session, path: &Path, args: &Args) -> Result<()> {
    let mut stdout = io::stdout();

    if args.json {
        let result = session.evaluate(path)?;
        render::render_json(&mut stdout, result)?;
    } else {
        session.upload(path, &mut stdout)?;
    }

    if args.log {
        let key = session.log_current()?;
        log::info!("Logged report for {} week {}", session.printer(), session.week());
        if !args.json {
            writeln!(stdout, "✅ Report logged successfully! ({})", key)?;
        }
    }
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_overrides_applied() {
        let args = Args::parse_from(["g7-report", "--reference", "r.csv", "--log-dir", "out"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.reference.path, PathBuf::from("r.csv"));
        assert_eq!(config.logging.log_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_log_requires_upload() {
        assert!(Args::try_parse_from(["g7-report", "--log"]).is_err());
        assert!(Args::try_parse_from(["g7-report", "-u", "x.csv", "--log", "--json"]).is_ok());
    }
}
