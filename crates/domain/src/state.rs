//! Send lifecycle state machine.
//!
//! A send moves `Idle → Resolving → PreScript → Transport → TestScript → Complete`.
//! `Errored` absorbs resolution and transport failures. Script failures are
//! not terminal and never lead to `Errored`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// State of one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SendState {
    /// Nothing in flight.
    #[default]
    Idle,
    /// Applying variables to the request snapshot.
    Resolving,
    /// Running the pre-request script.
    PreScript,
    /// Waiting on the transport. The only cancellable state.
    Transport,
    /// Running the test script.
    TestScript,
    /// Response assembled.
    Complete,
    /// Resolution or transport failed, or the send was cancelled.
    Errored,
}

impl SendState {
    /// Returns true if `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Resolving)
                | (Self::Resolving, Self::PreScript | Self::Errored)
                | (Self::PreScript, Self::Transport)
                | (Self::Transport, Self::TestScript | Self::Errored)
                | (Self::TestScript, Self::Complete)
        )
    }

    /// Returns `next` if the transition is legal.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` otherwise.
    pub const fn transition(self, next: Self) -> DomainResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Returns true for `Complete` and `Errored`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Errored)
    }

    /// Returns a stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::PreScript => "pre_script",
            Self::Transport => "transport",
            Self::TestScript => "test_script",
            Self::Complete => "complete",
            Self::Errored => "errored",
        }
    }
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a send ended in `Errored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendErrorKind {
    /// The request could not be turned into a wire request.
    Resolution,
    /// Network failure, timeout or protocol-level rejection.
    Transport,
    /// The user cancelled the transport step.
    Cancelled,
}

impl SendErrorKind {
    /// Returns a human-readable title for this error type.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Resolution => "Invalid Request",
            Self::Transport => "Request Failed",
            Self::Cancelled => "Request Cancelled",
        }
    }

    /// Returns user-friendly suggestions for this error type.
    #[must_use]
    pub const fn suggestions(&self) -> &[&'static str] {
        match self {
            Self::Resolution => &[
                "Check that every variable used in the URL is defined",
                "Verify the active environment",
            ],
            Self::Transport => &[
                "Check if the server is running",
                "Verify your network connection",
            ],
            Self::Cancelled => &["Request was cancelled"],
        }
    }
}

/// Terminal failure of a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendFailure {
    /// Failure category.
    pub kind: SendErrorKind,
    /// User-visible message.
    pub message: String,
}

impl SendFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(kind: SendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The failure for a user cancel.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(SendErrorKind::Cancelled, "Request was cancelled")
    }
}

impl fmt::Display for SendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.title(), self.message)
    }
}
