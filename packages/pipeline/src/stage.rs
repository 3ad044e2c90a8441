use std::fmt;

use tracing::{info, warn};

/// Failure category carried by [`Stage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    NotFound,
    Configuration,
    Processing,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Configuration => "configuration",
            Self::Processing => "processing",
        };
        f.write_str(s)
    }
}

/// Progress of a single generation request.
///
/// Stages only move forward, one at a time. `Failed` and `Responded` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    BackgroundRemoved,
    BackgroundGenerated,
    Composited,
    Responded,
    Failed(FailureKind),
}

impl Stage {
    /// The stage that follows on success, if any.
    pub fn successor(self) -> Option<Stage> {
        match self {
            Self::Received => Some(Self::Validated),
            Self::Validated => Some(Self::BackgroundRemoved),
            Self::BackgroundRemoved => Some(Self::BackgroundGenerated),
            Self::BackgroundGenerated => Some(Self::Composited),
            Self::Composited => Some(Self::Responded),
            Self::Responded | Self::Failed(_) => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => f.write_str("received"),
            Self::Validated => f.write_str("validated"),
            Self::BackgroundRemoved => f.write_str("background_removed"),
            Self::BackgroundGenerated => f.write_str("background_generated"),
            Self::Composited => f.write_str("composited"),
            Self::Responded => f.write_str("responded"),
            Self::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

/// Records and logs the stage a request has reached.
#[derive(Debug)]
pub struct StageTracker {
    current: Stage,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: Stage::Received,
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    /// Move to the next stage. Returns the new stage, or `None` if already terminal.
    pub fn advance(&mut self) -> Option<Stage> {
        let next = self.current.successor()?;
        info!(from = %self.current, to = %next, "Pipeline stage");
        self.current = next;
        Some(next)
    }

    /// Abort at the current stage. A terminal tracker is left unchanged.
    pub fn fail(&mut self, kind: FailureKind) {
        if self.current.is_terminal() {
            return;
        }
        warn!(at = %self.current, kind = %kind, "Pipeline failed");
        self.current = Stage::Failed(kind);
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
