//! Request handlers.

pub mod dispatch;
pub mod health;
