//! `watchdog check`: validate a config without starting anything.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use watchdog_config::{format_duration, redact, ValidationReport, WatchdogConfig};

/// Prints the findings and the redacted, defaulted config. Returns `false`
/// when the config would be rejected by `run`.
pub async fn run(config_path: &Path) -> Result<bool> {
    println!("\n🔍 Checking {}...\n", config_path.display());

    let (config, report) = watchdog_config::load_with_report(config_path).await?;
    print!("{}", render_findings(&report));
    print!("{}", render_tasks(&config));

    let redacted = redact(&serde_json::to_value(&config)?);
    println!("Effective configuration (secrets redacted):");
    println!("{}", serde_yaml::to_string(&redacted)?);

    let ok = report.is_valid() && (config.telnyx().is_some() || config.github().is_some());
    if ok {
        println!("✅ Configuration is valid.");
    } else {
        println!("❌ Configuration is not usable. Fix the errors above.");
    }
    Ok(ok)
}

fn render_findings(report: &ValidationReport) -> String {
    let mut out = String::from("Validation:\n");
    if report.errors.is_empty() && report.warnings.is_empty() {
        out.push_str("  🟢 no findings\n");
    }
    for e in &report.errors {
        let _ = writeln!(out, "  🔴 {}: {}", e.path, e.message);
    }
    for w in &report.warnings {
        let _ = writeln!(out, "  🟡 {}: {}", w.path, w.message);
    }
    out.push('\n');
    out
}

fn render_tasks(config: &WatchdogConfig) -> String {
    let mut out = String::from("Tasks:\n");
    match config.telnyx() {
        Some(t) => {
            let _ = writeln!(
                out,
                "  🟢 telnyx-balance every {} (threshold ${:.2}, cooldown {})",
                format_duration(config.task_interval(&t.interval)),
                t.threshold(),
                format_duration(t.cooldown()),
            );
        }
        None => out.push_str("  ⚪ telnyx-balance disabled\n"),
    }
    match config.github() {
        Some(g) => {
            let _ = writeln!(
                out,
                "  🟢 github-pr-review every {} ({} repositories, stale after {} days, cooldown {})",
                format_duration(config.task_interval(&g.interval)),
                g.repositories.len(),
                g.stale_days(),
                format_duration(g.cooldown()),
            );
        }
        None => out.push_str("  ⚪ github-pr-review disabled\n"),
    }
    out.push('\n');
    out
}
