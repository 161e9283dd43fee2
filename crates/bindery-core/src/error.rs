#![forbid(unsafe_code)]

//! Error type shared by every Bindery crate.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `Disposed` | Mutating, notifying or subscribing after `dispose()` | Operation rejected, state untouched |
//! | `AlreadyInitialized` | Second `init()` or late init hook | Rejected |
//! | `AlreadyBound` | Two mounted views claim one view-model | Second mount rejected |
//! | `NotifyDepthExceeded` | Listener re-enters `notify()` too deeply | Nested pass skipped |

use std::fmt;

/// Errors raised by view-models, bound views and the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The view-model was disposed and can no longer be used.
    Disposed,
    /// `init()` already ran on this view-model.
    AlreadyInitialized,
    /// The view-model is already claimed by another mounted view.
    AlreadyBound,
    /// The bound view is already mounted.
    AlreadyMounted,
    /// The bound view is not mounted.
    NotMounted,
    /// A listener re-entered `notify()` past the configured limit.
    NotifyDepthExceeded {
        /// Depth the rejected pass would have run at.
        depth: usize,
    },
    /// Rebinding a mounted view is disabled by its rebind policy.
    RebindRejected,
    /// A configuration value could not be parsed.
    InvalidConfig(String),
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disposed => write!(f, "view-model used after dispose"),
            Self::AlreadyInitialized => write!(f, "view-model already initialized"),
            Self::AlreadyBound => write!(f, "view-model already bound to a mounted view"),
            Self::AlreadyMounted => write!(f, "view already mounted"),
            Self::NotMounted => write!(f, "view not mounted"),
            Self::NotifyDepthExceeded { depth } => {
                write!(f, "nested notify depth {depth} exceeds limit")
            }
            Self::RebindRejected => write!(f, "rebinding a mounted view is not allowed"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for BindError {}
