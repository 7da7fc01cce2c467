//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use wbx_types::{BuildVariant, CleanScope};

use crate::events::{PhaseRecord, PhaseStatus};

/// Final result of a command, ready for rendering
#[derive(Debug)]
pub enum CommandReport {
    Build {
        variant: BuildVariant,
        output_dir: PathBuf,
        duration: Duration,
        skipped: Vec<String>,
        phases: Vec<PhaseRecord>,
        warnings: usize,
    },
    Clean {
        scope: CleanScope,
        removed: Vec<PathBuf>,
    },
}

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self {
            json_output,
            term: Term::stdout(),
        }
    }

    /// Whether styled output should be produced
    pub fn supports_color(&self) -> bool {
        !self.json_output && self.term.features().colors_supported()
    }

    /// Render a command report
    pub fn render(&self, report: &CommandReport) -> io::Result<()> {
        if self.json_output {
            self.render_json(report)
        } else {
            match report {
                CommandReport::Build {
                    variant,
                    output_dir,
                    duration,
                    skipped,
                    phases,
                    warnings,
                } => self.render_build(*variant, output_dir, *duration, skipped, phases, *warnings),
                CommandReport::Clean { scope, removed } => self.render_clean(*scope, removed),
            }
        }
    }

    fn render_json(&self, report: &CommandReport) -> io::Result<()> {
        let value = match report {
            CommandReport::Build {
                variant,
                output_dir,
                duration,
                skipped,
                phases,
                warnings,
            } => json!({
                "command": "build",
                "variant": variant,
                "output_dir": output_dir,
                "duration_ms": millis(*duration),
                "skipped": skipped,
                "warnings": warnings,
                "phases": phases
                    .iter()
                    .map(|record| json!({
                        "phase": record.phase,
                        "label": record.label,
                        "status": record.status.as_str(),
                        "duration_ms": record.duration.map(millis),
                        "note": record.note,
                    }))
                    .collect::<Vec<_>>(),
            }),
            CommandReport::Clean { scope, removed } => json!({
                "command": "clean",
                "scope": scope,
                "removed": removed,
            }),
        };
        let text = serde_json::to_string_pretty(&value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    fn render_build(
        &self,
        variant: BuildVariant,
        output_dir: &std::path::Path,
        duration: Duration,
        skipped: &[String],
        phases: &[PhaseRecord],
        warnings: usize,
    ) -> io::Result<()> {
        if !phases.is_empty() {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("Phase").add_attribute(Attribute::Bold),
                    Cell::new("Status").add_attribute(Attribute::Bold),
                    Cell::new("Time").add_attribute(Attribute::Bold),
                    Cell::new("Note").add_attribute(Attribute::Bold),
                ]);

            for record in phases {
                table.add_row(vec![
                    Cell::new(&record.label),
                    self.format_status(record.status),
                    Cell::new(record.duration.map(format_duration).unwrap_or_default()),
                    Cell::new(record.note.as_deref().unwrap_or("")),
                ]);
            }
            self.term.write_line(&table.to_string())?;
        }

        let heading = format!("Build succeeded ({variant})");
        if self.supports_color() {
            self.term
                .write_line(&Style::new().green().bold().apply_to(heading).to_string())?;
        } else {
            self.term.write_line(&heading)?;
        }
        self.term
            .write_line(&format!("Output:   {}", output_dir.display()))?;
        self.term
            .write_line(&format!("Duration: {}", format_duration(duration)))?;
        if !skipped.is_empty() {
            self.term
                .write_line(&format!("Skipped:  {}", skipped.join(", ")))?;
        }
        if warnings > 0 {
            self.term.write_line(&format!("Warnings: {warnings}"))?;
        }
        Ok(())
    }

    fn render_clean(&self, scope: CleanScope, removed: &[PathBuf]) -> io::Result<()> {
        if removed.is_empty() {
            return self
                .term
                .write_line(&format!("Nothing to clean ({}).", scope_name(scope)));
        }
        self.term
            .write_line(&format!("Removed ({}):", removed.len()))?;
        for path in removed {
            self.term.write_line(&format!("  • {}", path.display()))?;
        }
        Ok(())
    }

    fn format_status(&self, status: PhaseStatus) -> Cell {
        let cell = Cell::new(status.as_str());
        if !self.supports_color() {
            return cell;
        }
        match status {
            PhaseStatus::Completed => cell.fg(Color::Green),
            PhaseStatus::Skipped => cell.fg(Color::Cyan),
            PhaseStatus::Failed => cell.fg(Color::Red),
            PhaseStatus::Aborted | PhaseStatus::Running => cell.fg(Color::Yellow),
        }
    }
}

fn scope_name(scope: CleanScope) -> &'static str {
    match scope {
        CleanScope::Build => "build state",
        CleanScope::Output => "outputs",
        CleanScope::All => "build state and outputs",
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn format_duration(duration: Duration) -> String {
    let ms = millis(duration);
    if ms < 1_000 {
        format!("{ms}ms")
    } else {
        #[allow(clippy::cast_precision_loss)]
        let seconds = ms as f64 / 1_000.0;
        format!("{seconds:.1}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_switch_to_seconds() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(2_340)), "2.3s");
    }
}
