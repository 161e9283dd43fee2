#![forbid(unsafe_code)]

//! Binding configuration.
//!
//! [`BindConfig`] controls two things the base contract leaves open:
//!
//! - what a mounted view does when it is handed a different view-model
//!   ([`RebindPolicy`]), and
//! - how deeply listeners may re-enter `notify()` before the nested pass is
//!   rejected.
//!
//! Values can be overridden from the environment:
//!
//! | Variable | Values |
//! |----------|--------|
//! | `BINDERY_REBIND_POLICY` | `keep`, `reinit`, `reject` |
//! | `BINDERY_MAX_NOTIFY_DEPTH` | positive integer |

use std::str::FromStr;

use crate::error::BindError;

/// Environment variable selecting the [`RebindPolicy`].
pub const ENV_REBIND_POLICY: &str = "BINDERY_REBIND_POLICY";
/// Environment variable overriding [`BindConfig::max_notify_depth`].
pub const ENV_MAX_NOTIFY_DEPTH: &str = "BINDERY_MAX_NOTIFY_DEPTH";

/// Default limit for nested `notify()` passes.
pub const DEFAULT_MAX_NOTIFY_DEPTH: usize = 16;

/// What a mounted view does when reconfigured with a different view-model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebindPolicy {
    /// Move the subscription, do not call `init()` on the new view-model.
    #[default]
    KeepSession,
    /// Move the subscription and call `init()` if the new view-model has not
    /// been initialized yet.
    Reinitialize,
    /// Refuse to rebind a mounted view.
    Reject,
}

impl RebindPolicy {
    /// Stable lowercase name, the same spelling [`FromStr`] accepts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeepSession => "keep",
            Self::Reinitialize => "reinit",
            Self::Reject => "reject",
        }
    }
}

impl FromStr for RebindPolicy {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" | "keep-session" => Ok(Self::KeepSession),
            "reinit" | "reinitialize" => Ok(Self::Reinitialize),
            "reject" => Ok(Self::Reject),
            other => Err(BindError::InvalidConfig(format!(
                "unknown rebind policy '{other}'"
            ))),
        }
    }
}

/// Configuration shared by view-models and bound views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindConfig {
    /// Behaviour of `BoundView::reconfigure` on a mounted view.
    pub rebind_policy: RebindPolicy,
    /// Maximum nesting of `notify()` calls made from inside listeners.
    pub max_notify_depth: usize,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            rebind_policy: RebindPolicy::default(),
            max_notify_depth: DEFAULT_MAX_NOTIFY_DEPTH,
        }
    }
}

impl BindConfig {
    /// Set the rebind policy.
    #[must_use]
    pub fn with_rebind_policy(mut self, policy: RebindPolicy) -> Self {
        self.rebind_policy = policy;
        self
    }

    /// Set the nested notify limit. Clamped to at least 1 so a top-level
    /// `notify()` always runs.
    #[must_use]
    pub fn with_max_notify_depth(mut self, depth: usize) -> Self {
        self.max_notify_depth = depth.max(1);
        self
    }

    /// Default configuration with overrides from the process environment.
    pub fn from_env() -> Result<Self, BindError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Default configuration with overrides from `get_env`.
    ///
    /// Unset variables keep their defaults; set but malformed values are
    /// reported as [`BindError::InvalidConfig`].
    pub fn from_env_with<F>(get_env: F) -> Result<Self, BindError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = get_env(ENV_REBIND_POLICY) {
            config.rebind_policy = raw.parse()?;
        }
        if let Some(raw) = get_env(ENV_MAX_NOTIFY_DEPTH) {
            let depth: usize = raw.trim().parse().map_err(|_| {
                BindError::InvalidConfig(format!("{ENV_MAX_NOTIFY_DEPTH}='{raw}' is not a number"))
            })?;
            if depth == 0 {
                return Err(BindError::InvalidConfig(format!(
                    "{ENV_MAX_NOTIFY_DEPTH} must be at least 1"
                )));
            }
            config.max_notify_depth = depth;
        }
        tracing::debug!(
            rebind_policy = config.rebind_policy.as_str(),
            max_notify_depth = config.max_notify_depth,
            "bind config loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = BindConfig::default();
        assert_eq!(config.rebind_policy, RebindPolicy::KeepSession);
        assert_eq!(config.max_notify_depth, DEFAULT_MAX_NOTIFY_DEPTH);
    }

    #[test]
    fn empty_env_keeps_defaults() {
        let config = BindConfig::from_env_with(env(&[])).unwrap();
        assert_eq!(config, BindConfig::default());
    }

    #[test]
    fn env_overrides() {
        let config = BindConfig::from_env_with(env(&[
            (ENV_REBIND_POLICY, " Reinit "),
            (ENV_MAX_NOTIFY_DEPTH, "4"),
        ]))
        .unwrap();
        assert_eq!(config.rebind_policy, RebindPolicy::Reinitialize);
        assert_eq!(config.max_notify_depth, 4);
    }

    #[test]
    fn bad_policy_is_rejected() {
        let err = BindConfig::from_env_with(env(&[(ENV_REBIND_POLICY, "sometimes")]))
            .unwrap_err();
        assert!(matches!(err, BindError::InvalidConfig(_)));
    }

    #[test]
    fn zero_or_garbage_depth_is_rejected() {
        for raw in ["0", "-3", "deep"] {
            let err =
                BindConfig::from_env_with(env(&[(ENV_MAX_NOTIFY_DEPTH, raw)])).unwrap_err();
            assert!(matches!(err, BindError::InvalidConfig(_)), "{raw}");
        }
    }

    #[test]
    fn builder_clamps_depth() {
        let config = BindConfig::default().with_max_notify_depth(0);
        assert_eq!(config.max_notify_depth, 1);
    }

    #[test]
    fn policy_names_round_trip() {
        for policy in [
            RebindPolicy::KeepSession,
            RebindPolicy::Reinitialize,
            RebindPolicy::Reject,
        ] {
            assert_eq!(policy.as_str().parse::<RebindPolicy>().unwrap(), policy);
        }
    }
}
