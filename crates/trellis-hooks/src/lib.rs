//! # trellis-hooks
//!
//! Hook bus for Trellis. Provides:
//!
//! - Named hook points with positional JSON arguments
//! - A registry ordered by priority, then registration
//! - Action and filter invocation with continue/halt failure policies
//! - An optional guard against re-entrant hook fires

pub mod hooks;
pub mod macros;
pub mod traits;

pub use hooks::{HookArgs, HookBus, HookHandler, HookMode, HookPoint, HookReport};
pub use traits::ClosureHandler;

#[doc(hidden)]
pub use serde_json as __serde_json;
