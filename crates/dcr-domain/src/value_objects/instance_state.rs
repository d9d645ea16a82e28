//! Component instance activation state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Activation state of a component instance
///
/// Variants are declared in ascending order so that `state > Stopped`
/// reads as "started" exactly like the lifecycle diagram:
///
/// ```text
///            start()                 all handlers valid
/// STOPPED ──────────► INVALID ◄──────────────────────────► VALID
///    ▲                   │        any handler invalid        │
///    └──── stop() ───────┴───────────────────────────────────┘
///
/// * ── dispose() / kill() ──► DISPOSED (terminal)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    /// Terminal state; handlers and objects were released
    Disposed,
    /// Configured but not running
    #[default]
    Stopped,
    /// Running, at least one handler reports invalid
    Invalid,
    /// Running, every handler reports valid
    Valid,
}

impl InstanceState {
    /// Whether the instance has been started (state beyond STOPPED)
    pub fn is_started(self) -> bool {
        self > Self::Stopped
    }

    /// Uppercase label used in logs and descriptions
    pub fn label(self) -> &'static str {
        match self {
            Self::Disposed => "DISPOSED",
            Self::Stopped => "STOPPED",
            Self::Invalid => "INVALID",
            Self::Valid => "VALID",
        }
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
