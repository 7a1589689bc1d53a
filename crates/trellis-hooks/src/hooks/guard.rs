//! Active-hook stack used to detect re-entrant fires.
//!
//! Hooks run synchronously on the calling thread, so a per-thread stack
//! sees exactly the hooks that are live on the current call stack. Entries
//! are keyed by the owning bus, so two buses never see each other's fires.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static ACTIVE: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// Hands out a process-unique identity for a bus.
pub fn next_owner() -> u64 {
    NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
}

/// Marks a hook as running on one bus until dropped.
#[derive(Debug)]
pub struct ActiveHook {
    owner: u64,
    hook: String,
}

impl ActiveHook {
    /// Pushes `(owner, hook)` onto the active stack.
    ///
    /// Returns the guard and whether the hook was already active on that bus.
    pub fn enter(owner: u64, hook: &str) -> (Self, bool) {
        let reentrant = is_active(owner, hook);
        ACTIVE.with(|stack| stack.borrow_mut().push((owner, hook.to_string())));
        (
            Self {
                owner,
                hook: hook.to_string(),
            },
            reentrant,
        )
    }
}

impl Drop for ActiveHook {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack
                .iter()
                .rposition(|(owner, hook)| *owner == self.owner && *hook == self.hook)
            {
                stack.remove(pos);
            }
        });
    }
}

/// Whether `hook` is running on bus `owner` somewhere on the current call stack.
pub fn is_active(owner: u64, hook: &str) -> bool {
    ACTIVE.with(|stack| {
        stack
            .borrow()
            .iter()
            .any(|(o, h)| *o == owner && h == hook)
    })
}

/// Number of hook invocations live on the current call stack.
pub fn depth() -> usize {
    ACTIVE.with(|stack| stack.borrow().len())
}
