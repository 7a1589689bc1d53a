//! Hook bus policy configuration.

use serde::{Deserialize, Serialize};

/// What the hook bus does when a callback fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackErrorPolicy {
    /// Log the failure and run the next callback.
    #[default]
    Continue,
    /// Stop the chain and return the failure to the caller.
    Halt,
}

/// Whether a hook may be fired again while it is already running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentrancyPolicy {
    /// No guard; callbacks are trusted not to recurse.
    #[default]
    Allow,
    /// Reject a fire of a hook already on the active-hook stack.
    Forbid,
}

/// Hook bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookConfig {
    /// Callback failure policy.
    #[serde(default)]
    pub on_callback_error: CallbackErrorPolicy,
    /// Re-entrancy policy.
    #[serde(default)]
    pub reentrancy: ReentrancyPolicy,
    /// Priority given to callbacks registered without one.
    #[serde(default = "default_priority")]
    pub default_priority: i32,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            on_callback_error: CallbackErrorPolicy::default(),
            reentrancy: ReentrancyPolicy::default(),
            default_priority: default_priority(),
        }
    }
}

fn default_priority() -> i32 {
    100
}
