//! Process-wide eigenvalue regulariser.
//!
//! [`entropy`](crate::entropy), [`free_energy`](crate::free_energy) and
//! [`trace_distance`](crate::trace_distance) add a small `eps` to eigenvalues
//! before taking logarithms or square roots. Passing `None` for `eps` reads
//! [`DEFAULT_EPS`], which may be changed at runtime with [`set_default_eps`].

use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Regulariser that is negative, infinite or NaN.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("Invalid eps value: {0}. eps must be finite and non-negative.")]
pub struct InvalidEpsError(pub f64);

/// An f64 shared across threads, stored as its bit pattern.
///
/// # Example
///
/// ```
/// use qunet::GlobalDefault;
///
/// static CUTOFF: GlobalDefault = GlobalDefault::new(1e-12);
///
/// let before = CUTOFF.get();
/// CUTOFF.set(1e-10).unwrap();
/// assert!(CUTOFF.get() > before);
/// ```
pub struct GlobalDefault {
    bits: AtomicU64,
}

impl GlobalDefault {
    /// Start from `initial`; not validated.
    #[must_use]
    pub const fn new(initial: f64) -> Self {
        Self {
            bits: AtomicU64::new(initial.to_bits()),
        }
    }

    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Store `value` if it is a usable regulariser.
    pub fn set(&self, value: f64) -> Result<(), InvalidEpsError> {
        let value = validate(value)?;
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }
}

fn validate(value: f64) -> Result<f64, InvalidEpsError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(InvalidEpsError(value))
    }
}

/// Default regulariser for eigenvalue logarithms and square roots.
pub static DEFAULT_EPS: GlobalDefault = GlobalDefault::new(1e-12);

/// Current value of [`DEFAULT_EPS`].
pub fn default_eps() -> f64 {
    DEFAULT_EPS.get()
}

/// Replace the value of [`DEFAULT_EPS`].
pub fn set_default_eps(value: f64) -> Result<(), InvalidEpsError> {
    DEFAULT_EPS.set(value)
}

/// The caller's `eps` after validation, or [`default_eps`] when absent.
pub(crate) fn resolve_eps(eps: Option<f64>) -> Result<f64, InvalidEpsError> {
    match eps {
        Some(value) => validate(value),
        None => Ok(default_eps()),
    }
}
