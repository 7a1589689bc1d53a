//! Convenience macros for hook callers.

/// Builds a [`HookArgs`](crate::hooks::definitions::HookArgs) from positional values.
///
/// # Example
/// ```rust,ignore
/// let args = hook_args!["cms_posts", 42, json!({"title": "hi"})];
/// ```
#[macro_export]
macro_rules! hook_args {
    () => {
        $crate::hooks::definitions::HookArgs::new()
    };
    ($($value:expr),+ $(,)?) => {{
        let args = $crate::hooks::definitions::HookArgs::new();
        $(
            let args = args.with($crate::__serde_json::json!($value));
        )+
        args
    }};
}
