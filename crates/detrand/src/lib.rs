//! Deterministically random functionality.
//!
//! The pseudo-randomness here is seeded by the program binary itself: draws
//! never change within one process, but differ between builds. It exists to
//! destabilize orders that callers must not depend on, so that such
//! dependencies break early instead of silently hardening.
//!
//! This is not a source of unpredictability and must never be used where
//! security depends on it.
//!
//! # Example
//!
//! ```
//! let a = protopack_detrand::intn(5);
//! assert!(a < 5);
//! assert_eq!(a, protopack_detrand::intn(5));
//! ```

mod fnv;
mod source;

use std::sync::OnceLock;

pub use fnv::Fnv64;
pub use source::{DetrandError, Source};

static GLOBAL: OnceLock<Source> = OnceLock::new();

/// Returns the process-wide source, deriving its seed on first use.
pub fn global() -> &'static Source {
    GLOBAL.get_or_init(Source::from_current_exe)
}

/// Returns a deterministically random boolean.
pub fn boolean() -> bool {
    global().boolean()
}

/// Returns a deterministically random integer within `[0, n)`.
///
/// # Panics
///
/// Panics if `n <= 0`.
pub fn intn(n: i64) -> usize {
    global().intn(n)
}

/// Like [`intn`], but reports a non-positive bound as an error.
pub fn try_intn(n: i64) -> Result<usize, DetrandError> {
    global().try_intn(n)
}

/// Permutes `items` in a way that is stable for this build.
pub fn shuffle<T>(items: &mut [T]) {
    global().shuffle(items);
}
