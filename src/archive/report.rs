use crate::error::WarningCode;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WarnEvent {
    pub code: &'static str,
    pub stage: String,
    pub file: String,
    pub reason: String,
}

impl WarnEvent {
    pub fn new(
        code: WarningCode,
        stage: &str,
        file: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            code: code.as_str(),
            stage: stage.to_string(),
            file: file.into(),
            reason: reason.into(),
        }
    }
}

/// Sink for per-item warnings and progress notes. Components take it as a
/// parameter instead of writing to a global logger.
pub trait Reporter {
    fn warn(&self, event: &WarnEvent);
    fn info(&self, stage: &str, message: &str);
}

fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_sep = false;
    for ch in value.chars() {
        if ch.is_ascii_whitespace() {
            if !out.is_empty() && !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else if !ch.is_control() {
            out.push(ch);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "na".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn format_warn_line(event: &WarnEvent) -> String {
    format!(
        "DBP_WARN code={} stage={} file={} reason={}",
        sanitize_value(event.code),
        sanitize_value(&event.stage),
        sanitize_value(&event.file),
        sanitize_value(&event.reason),
    )
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReporter {
    pub verbose: bool,
}

impl Reporter for StderrReporter {
    fn warn(&self, event: &WarnEvent) {
        eprintln!("{}", format_warn_line(event));
    }

    fn info(&self, stage: &str, message: &str) {
        if self.verbose {
            eprintln!("DBP_INFO stage={} {message}", sanitize_value(stage));
        }
    }
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryReporter {
    pub warnings: std::cell::RefCell<Vec<WarnEvent>>,
    pub infos: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl MemoryReporter {
    pub fn codes(&self) -> Vec<&'static str> {
        self.warnings.borrow().iter().map(|w| w.code).collect()
    }
}

#[cfg(test)]
impl Reporter for MemoryReporter {
    fn warn(&self, event: &WarnEvent) {
        self.warnings.borrow_mut().push(event.clone());
    }

    fn info(&self, stage: &str, message: &str) {
        self.infos.borrow_mut().push(format!("{stage}: {message}"));
    }
}
