//! Test-only utilities for safely mutating process-global state in tests.
//!
//! # Usage
//!
//! ```rust
//! use holochat_async::config::ENV_API_KEY;
//! use holochat_async::test_support::EnvGuard;
//!
//! // Both OpenAI variables cleared, then the key set; all restored on drop.
//! let _env = EnvGuard::isolated().with(ENV_API_KEY, "sk-test");
//! // ... test body, run under `#[serial(env)]` ...
//! ```

use crate::config::{ENV_API_KEY, ENV_BASE_URL};

/// RAII guard over a set of environment variables
///
/// Every variable the guard touches is restored to its previous state (or
/// removed if it was not set) when the guard is dropped. Callers serialize
/// env-mutating tests through `#[serial(env)]`.
#[derive(Debug, Default)]
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    /// A guard with every variable the client reads from the environment unset
    #[must_use]
    pub fn isolated() -> Self {
        Self::default().without(ENV_API_KEY).without(ENV_BASE_URL)
    }

    /// Sets `key` for the lifetime of the guard
    #[must_use]
    pub fn with(mut self, key: &'static str, val: &str) -> Self {
        self.save(key);
        // SAFETY: env-mutating tests run under #[serial(env)]
        unsafe { std::env::set_var(key, val) };
        self
    }

    /// Unsets `key` for the lifetime of the guard
    #[must_use]
    pub fn without(mut self, key: &'static str) -> Self {
        self.save(key);
        // SAFETY: env-mutating tests run under #[serial(env)]
        unsafe { std::env::remove_var(key) };
        self
    }

    // Only the value from before the guard existed is worth restoring
    fn save(&mut self, key: &'static str) {
        if self.saved.iter().all(|(k, _)| *k != key) {
            self.saved.push((key, std::env::var(key).ok()));
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, prev) in self.saved.drain(..).rev() {
            match prev {
                // SAFETY: restores a value captured under the same serialization
                Some(v) => unsafe { std::env::set_var(key, v) },
                // SAFETY: as above
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}
