//! Event handling and status display

use console::Style;
use std::collections::HashMap;
use std::time::Duration;
use wbx_events::{AppEvent, BuildEvent, DocumentEvent, EventMessage, GeneralEvent};
use wbx_types::PhaseKind;

use crate::logging::log_event_with_tracing;

/// How a phase ended, as seen from the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    Running,
    Completed,
    Skipped,
    Failed,
    Aborted,
}

impl PhaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }
}

/// One row of the build summary
#[derive(Debug, Clone)]
pub struct PhaseRecord {
    pub phase: PhaseKind,
    pub label: String,
    pub status: PhaseStatus,
    pub duration: Option<Duration>,
    pub note: Option<String>,
}

/// Event handler for status lines and the phase summary
pub struct EventHandler {
    colors_enabled: bool,
    /// Suppresses terminal output; events are still logged
    quiet: bool,
    records: Vec<PhaseRecord>,
    /// Index into `records` by phase label
    by_label: HashMap<String, usize>,
    warnings: usize,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, quiet: bool) -> Self {
        Self {
            colors_enabled,
            quiet,
            records: Vec::new(),
            by_label: HashMap::new(),
            warnings: 0,
        }
    }

    /// Phases seen so far, in start order
    pub fn records(&self) -> &[PhaseRecord] {
        &self.records
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);

        match message.event {
            AppEvent::General(event) => self.handle_general(event),
            AppEvent::Build(event) => self.handle_build(event),
            AppEvent::Document(event) => self.handle_document(event),
            AppEvent::Process(_) => {}
        }
    }

    fn handle_general(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => {
                self.warnings += 1;
                match context {
                    Some(context) => self.show_warning(&format!("{message}: {context}")),
                    None => self.show_warning(&message),
                }
            }
            GeneralEvent::Error { message, details } => match details {
                Some(details) => self.show_error(&format!("{message}: {details}")),
                None => self.show_error(&message),
            },
            GeneralEvent::DebugLog { .. } => {}
        }
    }

    fn handle_build(&mut self, event: BuildEvent) {
        match event {
            BuildEvent::Started {
                variant, target, ..
            } => {
                let scope = target.unwrap_or_else(|| "all targets".to_string());
                self.show_status(&format!("Building {scope} ({variant})"));
            }
            BuildEvent::Rejected { reason } => self.show_warning(&reason),
            BuildEvent::PhaseStarted { phase, label, .. } => {
                self.show_progress(&format!("{label}..."));
                self.record(phase, label, PhaseStatus::Running, None, None);
            }
            BuildEvent::PhaseSkipped {
                phase,
                label,
                reason,
                ..
            } => {
                self.show_progress(&format!("{label}: {reason}"));
                self.record(phase, label, PhaseStatus::Skipped, None, Some(reason));
            }
            BuildEvent::PhaseCompleted {
                phase,
                label,
                duration,
                ..
            } => {
                self.record(phase, label, PhaseStatus::Completed, Some(duration), None);
            }
            BuildEvent::PhaseFailed {
                phase,
                label,
                failure,
                ..
            } => {
                self.show_error(&format!("{label} failed: {}", failure.message));
                if let Some(hint) = &failure.hint {
                    self.show_progress(&format!("hint: {hint}"));
                }
                self.record(phase, label, PhaseStatus::Failed, None, Some(failure.message));
            }
            BuildEvent::PhaseAborted { phase, label, .. } => {
                self.record(phase, label, PhaseStatus::Aborted, None, None);
            }
            BuildEvent::Retrying {
                step,
                attempt,
                max_attempts,
                reason,
                ..
            } => {
                self.show_warning(&format!(
                    "{step} failed ({reason}), attempt {attempt} of {max_attempts}"
                ));
            }
            BuildEvent::Aborted { .. } => self.show_warning("Build aborted"),
            _ => {}
        }
    }

    fn handle_document(&self, event: DocumentEvent) {
        match event {
            DocumentEvent::Generated { path } => {
                self.show_progress(&format!("generated {}", path.display()));
            }
            DocumentEvent::Merged {
                path,
                written: true,
                ..
            } => {
                self.show_progress(&format!("updated {}", path.display()));
            }
            _ => {}
        }
    }

    fn record(
        &mut self,
        phase: PhaseKind,
        label: String,
        status: PhaseStatus,
        duration: Option<Duration>,
        note: Option<String>,
    ) {
        if let Some(&index) = self.by_label.get(&label) {
            let record = &mut self.records[index];
            record.status = status;
            record.duration = duration.or(record.duration);
            if note.is_some() {
                record.note = note;
            }
            return;
        }
        self.by_label.insert(label.clone(), self.records.len());
        self.records.push(PhaseRecord {
            phase,
            label,
            status,
            duration,
            note,
        });
    }

    fn show_status(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.colors_enabled {
            eprintln!("{}", Style::new().bold().apply_to(message));
        } else {
            eprintln!("{message}");
        }
    }

    fn show_progress(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.colors_enabled {
            eprintln!("  {}", Style::new().dim().apply_to(message));
        } else {
            eprintln!("  {message}");
        }
    }

    fn show_warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.colors_enabled {
            eprintln!("{} {message}", Style::new().yellow().bold().apply_to("warning:"));
        } else {
            eprintln!("warning: {message}");
        }
    }

    fn show_error(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.colors_enabled {
            eprintln!("{} {message}", Style::new().red().bold().apply_to("error:"));
        } else {
            eprintln!("error: {message}");
        }
    }
}
