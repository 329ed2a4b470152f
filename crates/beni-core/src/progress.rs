use std::io::{self, Write};

/// A single-line stderr progress indicator.
///
/// Disabled reporters do nothing, so callers never branch on whether
/// progress output is wanted.
pub struct ProgressReporter {
    label: String,
    total: Option<usize>,
    current: usize,
    enabled: bool,
}

impl ProgressReporter {
    pub fn spinner(label: impl Into<String>, enabled: bool) -> Self {
        Self::start(label.into(), None, enabled)
    }

    pub fn bar(label: impl Into<String>, total: usize, enabled: bool) -> Self {
        if total == 0 {
            return Self::spinner(label, enabled);
        }
        Self::start(label.into(), Some(total), enabled)
    }

    fn start(label: String, total: Option<usize>, enabled: bool) -> Self {
        let reporter = Self {
            label,
            total,
            current: 0,
            enabled,
        };
        reporter.render();
        reporter
    }

    pub fn increment(&mut self) {
        self.current = self.current.saturating_add(1);
        self.render();
    }

    pub fn finish(mut self) {
        self.clear();
        self.enabled = false;
    }

    fn line(&self) -> String {
        match self.total {
            Some(total) => format!(
                "beni ▸ {} [{}/{total}]",
                self.label,
                self.current.min(total)
            ),
            None => format!("beni ▸ {} …", self.label),
        }
    }

    fn render(&self) {
        if !self.enabled {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = write!(stderr, "\r\x1b[2K{}", self.line());
        let _ = stderr.flush();
    }

    fn clear(&self) {
        if !self.enabled {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = stderr.write_all(b"\r\x1b[2K");
        let _ = stderr.flush();
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.clear();
    }
}
