//! Interactive session
//!
//! Holds the operator's selections (printer, week) and the current report, and
//! processes one command at a time to completion. Errors from a command are
//! shown to the operator and never end the session.

use crate::config::AppConfig;
use crate::render;
use anyhow::{anyhow, bail, Result};
use chrono::Local;
use g7_report_core::{
    parse_measurement_file, ComparisonResult, FsLogSink, ReferenceSet, ReportEngine, ReportLogger,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// A single operator command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Printers,
    Printer(String),
    Week(String),
    Upload(PathBuf),
    Log,
    History,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; `Ok(None)` for blank lines
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match (word.to_lowercase().as_str(), rest) {
            ("printers", _) => Command::Printers,
            ("printer", "") => bail!("usage: printer <number|name>"),
            ("printer", sel) => Command::Printer(sel.to_string()),
            ("week", label) => Command::Week(label.to_string()),
            ("upload", "") => bail!("usage: upload <file>"),
            ("upload", path) => Command::Upload(PathBuf::from(path)),
            ("log", _) => Command::Log,
            ("history", _) => Command::History,
            ("status", _) => Command::Status,
            ("help", _) | ("?", _) => Command::Help,
            ("quit", _) | ("exit", _) => Command::Quit,
            (other, _) => bail!("unknown command '{}' (type 'help')", other),
        };
        Ok(Some(command))
    }
}

/// Whether the session should keep reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Session<'r> {
    config: AppConfig,
    engine: ReportEngine<'r>,
    logger: ReportLogger<FsLogSink>,
    printer: String,
    week: String,
    current: Option<ComparisonResult>,
}

impl<'r> Session<'r> {
    pub fn new(config: AppConfig, reference: &'r ReferenceSet) -> Self {
        let printer = config.printers.names.first().cloned().unwrap_or_default();
        let week = config.session.default_week.clone();
        let logger = ReportLogger::new(FsLogSink::new(config.logging.log_dir.clone()));

        Self {
            config,
            engine: ReportEngine::new(reference),
            logger,
            printer,
            week,
            current: None,
        }
    }

    pub fn printer(&self) -> &str {
        &self.printer
    }

    pub fn week(&self) -> &str {
        &self.week
    }

    pub fn current(&self) -> Option<&ComparisonResult> {
        self.current.as_ref()
    }

    pub fn select_printer(&mut self, selector: &str) -> Result<()> {
        let name = self
            .config
            .find_printer(selector)
            .ok_or_else(|| anyhow!("unknown printer '{}' (type 'printers')", selector))?;
        self.printer = name.to_string();
        Ok(())
    }

    pub fn set_week(&mut self, week: &str) {
        self.week = week.to_string();
    }

    /// Run commands from `input` until it ends or the operator quits
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        writeln!(out, "Upload a color measurement file to begin (type 'help' for commands).")?;
        prompt(out)?;

        for line in input.lines() {
            let line = line?;
            let flow = match Command::parse(&line) {
                Ok(Some(command)) => self.dispatch(command, out)?,
                Ok(None) => Flow::Continue,
                Err(e) => {
                    writeln!(out, "error: {}", e)?;
                    Flow::Continue
                }
            };
            if flow == Flow::Stop {
                break;
            }
            prompt(out)?;
        }
        Ok(())
    }

    /// Execute one command, turning per-cycle failures into messages
    ///
    /// Only failures writing to `out` itself are returned as errors.
    pub fn dispatch(&mut self, command: Command, out: &mut impl Write) -> Result<Flow> {
        log::debug!("Command: {:?}", command);

        if command == Command::Quit {
            return Ok(Flow::Stop);
        }
        if let Err(e) = self.execute(command, out) {
            log::debug!("Command failed: {:#}", e);
            writeln!(out, "error: {:#}", e)?;
        }
        Ok(Flow::Continue)
    }

    fn execute(&mut self, command: Command, out: &mut impl Write) -> Result<()> {
        match command {
            Command::Printers => {
                for (i, name) in self.config.printers.names.iter().enumerate() {
                    let marker = if *name == self.printer { "*" } else { " " };
                    writeln!(out, "{} {:>2}. {}", marker, i + 1, name)?;
                }
            }
            Command::Printer(selector) => {
                self.select_printer(&selector)?;
                writeln!(out, "Printer: {}", self.printer)?;
            }
            Command::Week(label) => {
                self.set_week(&label);
                writeln!(out, "Week: {}", self.week)?;
            }
            Command::Upload(path) => self.upload(&path, out)?,
            Command::Log => {
                let key = self.log_current()?;
                writeln!(out, "✅ Report logged successfully! ({})", key)?;
            }
            Command::History => {
                let table = self.logger.load_log(&self.printer, &self.week)?;
                writeln!(out, "Logged report for {} - Week {}:", self.printer, self.week)?;
                writeln!(out, "{}", table)?;
            }
            Command::Status => {
                writeln!(out, "Printer: {}", self.printer)?;
                writeln!(out, "Week:    {}", self.week)?;
                writeln!(out, "Logs:    {}", self.logger.sink().dir().display())?;
                match self.current() {
                    Some(result) => render::render_metrics(out, result)?,
                    None => writeln!(out, "No report loaded")?,
                }
            }
            Command::Help => print_help(out)?,
            Command::Quit => {}
        }
        Ok(())
    }

    /// Parse, compare and display an upload; the previous report is discarded either way
    pub fn upload(&mut self, path: &std::path::Path, out: &mut impl Write) -> Result<()> {
        self.current = None;

        let table = parse_measurement_file(path)?;
        render::render_upload(
            out,
            &self.printer,
            &self.week,
            &table,
            &self.engine.reference().column_names(),
            Local::now(),
        )?;

        let result = self.engine.compute(table)?;
        render::render_report(out, &result)?;
        self.current = Some(result);
        Ok(())
    }

    /// Parse and compare an upload without displaying it
    pub fn evaluate(&mut self, path: &std::path::Path) -> Result<&ComparisonResult> {
        self.current = None;
        let table = parse_measurement_file(path)?;
        let result = self.engine.compute(table)?;
        Ok(self.current.insert(result))
    }

    /// Persist the current report for the selected printer and week
    pub fn log_current(&self) -> Result<String> {
        let result = self
            .current
            .as_ref()
            .ok_or_else(|| anyhow!("no report to log; upload a file first"))?;
        let key = self.logger.log_report(result, &self.printer, &self.week)?;
        Ok(key)
    }
}

fn prompt(out: &mut impl Write) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

fn print_help(out: &mut impl Write) -> Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  printers              list printers")?;
    writeln!(out, "  printer <n|name>      select a printer")?;
    writeln!(out, "  week <label>          set the date/week label")?;
    writeln!(out, "  upload <file>         compare a spectro export (.csv/.txt)")?;
    writeln!(out, "  log                   log the current report")?;
    writeln!(out, "  history               show the log for the selected printer and week")?;
    writeln!(out, "  status                show selections and current metrics")?;
    writeln!(out, "  quit                  exit")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    const REFERENCE: &str = "Patch,L,a,b\nP1,50,0,0\nP2,16,0,0\n";

    fn setup() -> (TempDir, AppConfig, ReferenceSet) {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.logging.log_dir = dir.path().join("logs");
        let reference = ReferenceSet::from_csv(REFERENCE).unwrap();
        (dir, config, reference)
    }

    fn write_upload(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn run(session: &mut Session, script: &str) -> String {
        let mut out = Vec::new();
        session.run(Cursor::new(script.to_string()), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(Command::parse("printer 3").unwrap(), Some(Command::Printer("3".into())));
        assert_eq!(
            Command::parse("week 01 01 2025").unwrap(),
            Some(Command::Week("01 01 2025".into()))
        );
        assert_eq!(
            Command::parse("upload data/my file.csv").unwrap(),
            Some(Command::Upload(PathBuf::from("data/my file.csv")))
        );
        assert_eq!(Command::parse("QUIT").unwrap(), Some(Command::Quit));
        assert!(Command::parse("upload").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_upload_then_log() {
        let (dir, config, reference) = setup();
        let upload = write_upload(&dir, "spectro.csv", "Patch,L,a,b\nP1,53,4,0\nP2,16,0,0\n");
        let mut session = Session::new(config, &reference);

        let script = format!("printer 2\nweek W7\nupload {}\nlog\nquit\n", upload.display());
        let text = run(&mut session, &script);

        assert!(text.contains("Printer: Mutoh 924 #2"), "{}", text);
        assert!(text.contains("Max ΔE:      5.00"), "{}", text);
        assert!(text.contains("Report logged successfully"), "{}", text);
        assert!(dir.path().join("logs").join("Mutoh_924_#2_W7.csv").exists());
    }

    #[test]
    fn test_errors_do_not_end_session() {
        let (dir, config, reference) = setup();
        let bad = write_upload(&dir, "bad.csv", "Patch,L,a\nP1,53,4\nP2,16,0\n");
        let mut session = Session::new(config, &reference);

        let script = format!("log\nprinter 99\nupload {}\nlog\nstatus\n", bad.display());
        let text = run(&mut session, &script);

        assert!(text.contains("error: no report to log"), "{}", text);
        assert!(text.contains("error: unknown printer '99'"), "{}", text);
        assert!(text.contains("must contain 'L', 'a', and 'b'"), "{}", text);
        assert!(text.contains("No report loaded"), "{}", text);
        assert!(text.contains(&format!("Logs:    {}", dir.path().join("logs").display())), "{}", text);
        assert!(session.current().is_none());
    }

    #[test]
    fn test_failed_upload_discards_previous_report() {
        let (dir, config, reference) = setup();
        let good = write_upload(&dir, "good.csv", "Patch,L,a,b\nP1,50,0,0\nP2,16,0,0\n");
        let short = write_upload(&dir, "short.csv", "Patch,L,a,b\nP1,50,0,0\n");
        let mut session = Session::new(config, &reference);
        let mut out = Vec::new();

        session.upload(&good, &mut out).unwrap();
        assert!(session.current().is_some());

        assert!(session.upload(&short, &mut out).is_err());
        assert!(session.current().is_none());
        assert!(session.log_current().is_err());
    }

    #[test]
    fn test_history_and_invalid_week() {
        let (dir, config, reference) = setup();
        let upload = write_upload(&dir, "spectro.csv", "Patch,L,a,b\nP1,50,0,0\nP2,16,0,0\n");
        let mut session = Session::new(config, &reference);

        let script = format!(
            "week 01/01/2025\nupload {}\nlog\nweek Week1\nhistory\nlog\nhistory\n",
            upload.display()
        );
        let text = run(&mut session, &script);

        assert!(text.contains("error: Invalid log key"), "{}", text);
        assert!(text.contains("error: No log found for key: Mutoh_924_#1_Week1"), "{}", text);
        assert!(text.contains("Logged report for Mutoh 924 #1 - Week Week1"), "{}", text);
    }
}
