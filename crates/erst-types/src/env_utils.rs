//! Environment variable parsing utilities.
//!
//! Configuration is always passed explicitly into constructors; these helpers
//! only exist so `from_env()` constructors read variables the same way.
//!
//! # Example
//!
//! ```
//! use erst_types::env_utils::{env_bool, env_var_or};
//!
//! let batch: usize = env_var_or("ERST_BATCH_SIZE", 50);
//! let cache = env_bool("ERST_CACHE");
//! # let _ = (batch, cache);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse an environment variable with a default value.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Check if an environment variable is set to a truthy value.
///
/// Returns `true` for "1", "true", "yes", or "on" (case-insensitive).
pub fn env_bool(key: &str) -> bool {
    std::env::var(key).map(|v| is_truthy(&v)).unwrap_or(false)
}

/// Check if an environment variable is set to a truthy value, with a default
/// used when the variable is absent.
pub fn env_bool_or(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => is_truthy(&v),
        Err(_) => default,
    }
}

/// Get an environment variable as a string with a default value.
pub fn env_string_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
