//! Hook system: definitions, registry, bus, and re-entrancy guard.

pub mod bus;
pub mod definitions;
pub mod guard;
pub mod registry;

pub use bus::{HookBus, HookFailure, HookReport};
pub use definitions::{HookArgs, HookMode, HookPoint};
pub use registry::{HookEntry, HookHandler, HookRegistry, HookSummary};
