use std::fmt;

/// Why the backend turned a request down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// A start was requested while a job of that kind is active.
    AlreadyRunning,
    /// Pause/resume was requested for a job that is not running.
    NotRunning,
    /// Any other refusal carried by an `{error}` / `{detail}` payload or a
    /// non-success status.
    Rejected { status: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request could not complete.
    Network,
    Timeout,
    /// The response was not well-formed.
    Decode,
    Refused(Refusal),
}

impl FailureKind {
    /// Transient failures heal on the next poll tick.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FailureKind::Network | FailureKind::Timeout | FailureKind::Decode
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Refused(Refusal::AlreadyRunning) => write!(f, "already running"),
            FailureKind::Refused(Refusal::NotRunning) => write!(f, "not running"),
            FailureKind::Refused(Refusal::Rejected { status }) => {
                write!(f, "refused with http status {status}")
            }
        }
    }
}

/// A failed request as seen by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestError {
    pub kind: FailureKind,
    pub message: String,
}

impl RequestError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn refused(refusal: Refusal, message: impl Into<String>) -> Self {
        Self::new(FailureKind::Refused(refusal), message)
    }

    /// Text shown to the user. Server refusals are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self.kind {
            FailureKind::Refused(_) => self.message.clone(),
            kind => format!("{kind}: {}", self.message),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RequestError {}
