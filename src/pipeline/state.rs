// Exchange state machine
// Author: kelexine (https://github.com/kelexine)

use std::fmt;
use tracing::debug;

/// Stages of one exchange, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Received,
    FormatResolved,
    PayloadBuilt,
    Sent,
    Classified,
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "RECEIVED",
            Stage::FormatResolved => "FORMAT_RESOLVED",
            Stage::PayloadBuilt => "PAYLOAD_BUILT",
            Stage::Sent => "SENT",
            Stage::Classified => "CLASSIFIED",
            Stage::Responded => "RESPONDED",
        };
        f.write_str(name)
    }
}

/// Tracks the current stage; transitions only move forward.
///
/// Skipping ahead is allowed (a build failure goes straight to
/// `Responded`), revisiting a stage is not.
#[derive(Debug)]
pub struct ExchangeState {
    stage: Stage,
}

impl Default for ExchangeState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Received,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_terminal(&self) -> bool {
        self.stage == Stage::Responded
    }

    /// Move to `next`. Returns false, leaving the state untouched, if
    /// `next` is not after the current stage.
    pub fn advance(&mut self, next: Stage) -> bool {
        if next <= self.stage {
            debug!("Rejected transition {} -> {}", self.stage, next);
            return false;
        }
        debug!("{} -> {}", self.stage, next);
        self.stage = next;
        true
    }
}
