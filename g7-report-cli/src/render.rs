//! Text display surface
//!
//! Renders the parsed upload, the ΔE bar chart and the summary metrics to any
//! `Write` sink. Nothing here computes report figures; it only presents what
//! the library produced.

use chrono::{DateTime, Local};
use colored::Colorize;
use g7_report_core::{ComparisonResult, PatchDeviation, Table, PASS_THRESHOLD};
use std::io::{self, Write};

/// Width in characters of the longest bar
const CHART_WIDTH: usize = 40;

/// Low and high ends of the bar colour scale
const LOW_COLOR: (f64, f64, f64) = (240.0, 249.0, 33.0);
const HIGH_COLOR: (f64, f64, f64) = (13.0, 8.0, 135.0);

const RULE: &str = "═══════════════════════════════════════════════";

/// Header for a report cycle: the upload as parsed plus both column lists
pub fn render_upload(
    out: &mut impl Write,
    printer: &str,
    week: &str,
    upload: &Table,
    reference_columns: &[&str],
    generated: DateTime<Local>,
) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  Uploaded Data for {} - Week {}", printer, week)?;
    writeln!(out, "  Generated {}", generated.format("%Y-%m-%d %H:%M"))?;
    writeln!(out, "{}\n", RULE)?;

    writeln!(out, "Uploaded Columns:  {:?}", upload.column_names())?;
    writeln!(out, "{}", upload)?;
    writeln!(out, "Reference Columns: {:?}\n", reference_columns)?;
    Ok(())
}

/// Bar chart keyed by patch, bar length and colour both graded by ΔE
pub fn render_chart(out: &mut impl Write, deviations: &[PatchDeviation]) -> io::Result<()> {
    writeln!(out, "ΔE Deviation from Reference")?;
    writeln!(out, "───────────────────────────────────────────────")?;

    let max = deviations.iter().map(|d| d.delta_e).fold(0.0, f64::max);
    let label_width = deviations
        .iter()
        .map(|d| d.patch.chars().count())
        .max()
        .unwrap_or(0);

    for deviation in deviations {
        let scale = if max > 0.0 { deviation.delta_e / max } else { 0.0 };
        let length = (scale * CHART_WIDTH as f64).round() as usize;
        let (r, g, b) = bar_color(scale);
        let bar = "█".repeat(length).truecolor(r, g, b);

        writeln!(
            out,
            "{:>w$} │{} {:.2}",
            deviation.patch,
            bar,
            deviation.delta_e,
            w = label_width
        )?;
    }
    writeln!(out)?;
    Ok(())
}

/// Interpolate the colour scale at `t` in `[0, 1]`
fn bar_color(t: f64) -> (u8, u8, u8) {
    let t = t.clamp(0.0, 1.0);
    let lerp = |lo: f64, hi: f64| (lo + (hi - lo) * t).round() as u8;
    (
        lerp(LOW_COLOR.0, HIGH_COLOR.0),
        lerp(LOW_COLOR.1, HIGH_COLOR.1),
        lerp(LOW_COLOR.2, HIGH_COLOR.2),
    )
}

/// The three summary metrics
pub fn render_metrics(out: &mut impl Write, result: &ComparisonResult) -> io::Result<()> {
    writeln!(out, "Max ΔE:      {:.2}", result.max_delta_e())?;
    writeln!(out, "Average ΔE:  {:.2}", result.mean_delta_e())?;
    writeln!(out, "Pass/Fail:   {}", verdict(result.pass()))?;
    Ok(())
}

fn verdict(pass: bool) -> String {
    if pass {
        format!("✅ Pass (max ΔE ≤ {})", PASS_THRESHOLD).green().to_string()
    } else {
        format!("❌ Fail (max ΔE > {})", PASS_THRESHOLD).red().to_string()
    }
}

/// Chart followed by metrics
pub fn render_report(out: &mut impl Write, result: &ComparisonResult) -> io::Result<()> {
    render_chart(out, result.deviations())?;
    render_metrics(out, result)
}

/// Machine-readable summary
pub fn render_json(out: &mut impl Write, result: &ComparisonResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&result.summary())?;
    writeln!(out, "{}", json)?;
    Ok(())
}
