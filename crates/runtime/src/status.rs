use tracing::{info, warn};

pub const STATUS_LOADING_DEFINITION: &str = "Loading Grasshopper file…";
pub const STATUS_EVALUATING: &str = "Evaluating on Compute…";
pub const STATUS_DONE: &str = "Done";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// One line of user-facing progress text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Monotonic sequence number, 0-based.
    pub seq: u64,
    pub kind: StatusKind,
    pub message: String,
}

impl StatusLine {
    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Latest status plus the lines not yet picked up by the UI.
///
/// Every line is also mirrored to `tracing` so native runs get the same
/// progress trail as the page.
#[derive(Debug, Default)]
pub struct StatusBus {
    next_seq: u64,
    current: Option<StatusLine>,
    pending: Vec<StatusLine>,
}

impl StatusBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.emit(StatusKind::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.emit(StatusKind::Error, message.into());
    }

    fn emit(&mut self, kind: StatusKind, message: String) {
        match kind {
            StatusKind::Info => info!(status = %message),
            StatusKind::Error => warn!(status = %message),
        }
        let line = StatusLine {
            seq: self.next_seq,
            kind,
            message,
        };
        self.next_seq += 1;
        self.pending.push(line.clone());
        self.current = Some(line);
    }

    pub fn current(&self) -> Option<&StatusLine> {
        self.current.as_ref()
    }

    /// Current message text, empty before anything was reported.
    pub fn message(&self) -> &str {
        self.current.as_ref().map(|l| l.message.as_str()).unwrap_or("")
    }

    pub fn is_error(&self) -> bool {
        self.current.as_ref().is_some_and(StatusLine::is_error)
    }

    pub fn pending(&self) -> &[StatusLine] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<StatusLine> {
        std::mem::take(&mut self.pending)
    }
}
