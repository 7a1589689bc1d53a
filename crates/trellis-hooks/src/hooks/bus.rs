//! Hook bus: runs registered callbacks in action or filter mode.
//!
//! Action mode:
//! - Callbacks are called in `(priority, registration)` order.
//! - Return values are discarded.
//!
//! Filter mode:
//! - The accumulator is threaded through every callback in the same order.
//! - Each callback's return value replaces the accumulator, including a
//!   `null` returned by a callback that forgot to hand the value back.
//!
//! A failing callback is turned into a `HookCallback` error. Under
//! [`CallbackErrorPolicy::Continue`] it is logged and recorded in the
//! [`HookReport`] and the next callback runs; under
//! [`CallbackErrorPolicy::Halt`] the run stops and the error is returned.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use trellis_core::config::{CallbackErrorPolicy, HookConfig, ReentrancyPolicy};
use trellis_core::types::RegistrationId;
use trellis_core::{AppError, AppResult};

use super::definitions::{HookArgs, HookMode};
use super::guard::{self, ActiveHook};
use super::registry::{HookHandler, HookRegistry};

/// One callback failure recorded during a run.
#[derive(Debug, Clone)]
pub struct HookFailure {
    /// Plugin owning the callback.
    pub plugin_id: String,
    /// Callback name.
    pub callback: String,
    /// The `HookCallback` error.
    pub error: AppError,
}

/// Outcome of running one hook.
#[derive(Debug, Clone, Default)]
pub struct HookReport {
    /// Hook name.
    pub hook: String,
    /// Number of callbacks invoked.
    pub invoked: usize,
    /// Failures tolerated under the `continue` policy.
    pub failures: Vec<HookFailure>,
}

impl HookReport {
    fn new(hook: &str) -> Self {
        Self {
            hook: hook.to_string(),
            ..Self::default()
        }
    }

    /// Whether every callback succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Process-wide hook bus: registry plus invocation policies.
///
/// Populated through `&mut self` during boot, then shared read-only.
#[derive(Debug)]
pub struct HookBus {
    /// Registered callbacks.
    registry: HookRegistry,
    /// Invocation policies.
    config: HookConfig,
    /// Identity on the active-hook stack.
    owner: u64,
}

impl HookBus {
    /// Creates an empty bus with the given policies.
    pub fn new(config: HookConfig) -> Self {
        Self {
            registry: HookRegistry::new(config.default_priority),
            config,
            owner: guard::next_owner(),
        }
    }

    /// Registers a callback using the handler's priority or the default.
    pub fn register(
        &mut self,
        hook: impl AsRef<str>,
        handler: Arc<dyn HookHandler>,
    ) -> RegistrationId {
        self.registry.register(hook.as_ref(), handler, None)
    }

    /// Registers a callback with an explicit priority.
    pub fn register_with_priority(
        &mut self,
        hook: impl AsRef<str>,
        handler: Arc<dyn HookHandler>,
        priority: i32,
    ) -> RegistrationId {
        self.registry.register(hook.as_ref(), handler, Some(priority))
    }

    /// Runs every callback for side effects.
    pub fn run_action(&self, hook: impl AsRef<str>, args: HookArgs) -> AppResult<HookReport> {
        self.run(hook.as_ref(), Value::Null, &args, HookMode::Action)
            .map(|(_, report)| report)
    }

    /// Threads `initial` through every callback and returns the final value.
    pub fn run_filter(
        &self,
        hook: impl AsRef<str>,
        initial: Value,
        args: HookArgs,
    ) -> AppResult<Value> {
        self.run_filter_with_report(hook, initial, args)
            .map(|(value, _)| value)
    }

    /// Like [`run_filter`](Self::run_filter), also returning the run report.
    pub fn run_filter_with_report(
        &self,
        hook: impl AsRef<str>,
        initial: Value,
        args: HookArgs,
    ) -> AppResult<(Value, HookReport)> {
        self.run(hook.as_ref(), initial, &args, HookMode::Filter)
    }

    /// Returns the registry.
    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Returns the policies.
    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    fn run(
        &self,
        hook: &str,
        initial: Value,
        args: &HookArgs,
        mode: HookMode,
    ) -> AppResult<(Value, HookReport)> {
        let entries = self.registry.entries(hook);
        let mut report = HookReport::new(hook);

        if entries.is_empty() {
            return Ok((initial, report));
        }

        let (_active, reentrant) = ActiveHook::enter(self.owner, hook);
        if reentrant {
            match self.config.reentrancy {
                ReentrancyPolicy::Forbid => {
                    warn!(hook = %hook, "Re-entrant hook fire rejected");
                    return Err(AppError::hook_reentrancy(hook));
                }
                ReentrancyPolicy::Allow => {
                    debug!(hook = %hook, "Re-entrant hook fire");
                }
            }
        }

        debug!(
            hook = %hook,
            handler_count = entries.len(),
            mode = ?mode,
            "Dispatching hook"
        );

        let mut value = initial;

        for entry in entries {
            let handler = &entry.handler;
            let input = match mode {
                HookMode::Action => Value::Null,
                _ => value.clone(),
            };

            report.invoked += 1;

            match invoke(handler.as_ref(), input, args) {
                Ok(next) => {
                    if mode == HookMode::Filter {
                        if next.is_null() && !value.is_null() {
                            warn!(
                                hook = %hook,
                                plugin_id = %handler.plugin_id(),
                                callback = %handler.name(),
                                "Filter callback returned null, accumulator dropped"
                            );
                        }
                        value = next;
                    }
                }
                Err(cause) => {
                    let error = AppError::hook_callback(
                        hook,
                        handler.plugin_id(),
                        handler.name(),
                        &cause,
                    );

                    warn!(
                        hook = %hook,
                        plugin_id = %handler.plugin_id(),
                        callback = %handler.name(),
                        error = %cause,
                        "Hook callback failed"
                    );

                    match self.config.on_callback_error {
                        CallbackErrorPolicy::Halt => return Err(error),
                        CallbackErrorPolicy::Continue => report.failures.push(HookFailure {
                            plugin_id: handler.plugin_id().to_string(),
                            callback: handler.name().to_string(),
                            error,
                        }),
                    }
                }
            }
        }

        Ok((value, report))
    }
}

impl Default for HookBus {
    fn default() -> Self {
        Self::new(HookConfig::default())
    }
}

/// Calls one handler, converting a panic into an error.
fn invoke(handler: &dyn HookHandler, input: Value, args: &HookArgs) -> AppResult<Value> {
    catch_unwind(AssertUnwindSafe(|| handler.handle(input, args))).unwrap_or_else(|panic| {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(AppError::internal(format!("callback panicked: {message}")))
    })
}
