//! Dense tensors and the numeric backend for qunet.
//!
//! This crate provides:
//! - [`DenseTensor`]: row-major complex tensor of dynamic rank, with
//!   permutation, pairwise contraction (faer GEMM) and axis traces
//! - [`Backend`]: matrix-level numeric capability (eigensolves, matrix
//!   functions, sampling) and its implementation [`DenseBackend`]
//!
//! This crate re-exports `mdarray` and `num_complex` for downstream use.

pub mod backend;
pub mod error;
pub mod storage;

pub use backend::{Backend, DenseBackend, EighResult};
pub use error::{BackendError, Result};
pub use storage::DenseTensor;

// Re-export underlying crates for downstream use
pub use mdarray;
pub use num_complex;
pub use num_complex::Complex64;
