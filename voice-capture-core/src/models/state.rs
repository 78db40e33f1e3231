/// Capture session state machine.
///
/// State transitions:
/// ```text
/// active → stopped (terminal)
/// ```
///
/// Both the explicit stop call and the filter-policy timeout route into the
/// same transition; the first caller wins and the transition is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Stopped,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Per-speaker stream lifecycle.
///
/// ```text
/// writing → finalized (terminal)
/// ```
///
/// Writes are only legal in `Writing`; renaming for a target format is only
/// legal in `Finalized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Writing,
    Finalized,
}

impl StreamState {
    pub fn is_writing(&self) -> bool {
        matches!(self, Self::Writing)
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, Self::Finalized)
    }
}
