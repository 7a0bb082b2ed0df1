//! Numeric backend capability.
//!
//! [`Backend`] collects the matrix-level primitives the quantum-information
//! layer needs: products, Hermitian eigendecomposition and the matrix
//! functions built from it, and categorical sampling. [`DenseBackend`] is the
//! implementation over [`DenseTensor`], using nalgebra for eigensolves and
//! rand for sampling.

use crate::error::{BackendError, Result};
use crate::storage::{gemm, DenseTensor};
use nalgebra::DMatrix;
use num_complex::Complex64;
use num_traits::Zero;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

/// Result of a Hermitian eigendecomposition.
#[derive(Debug, Clone)]
pub struct EighResult {
    /// Eigenvalues in ascending order.
    pub eigenvalues: Vec<f64>,
    /// Eigenvectors as columns, in the same order as `eigenvalues`.
    pub eigenvectors: DenseTensor,
}

/// Matrix-level numeric operations over an array engine.
///
/// Matrices are rank-2 [`DenseTensor`]s. Methods that take a matrix return
/// [`BackendError::NotAMatrix`] for any other rank, and methods that need a
/// square matrix return [`BackendError::NonSquare`].
pub trait Backend {
    /// Matrix product `a * b`.
    fn matmul(&self, a: &DenseTensor, b: &DenseTensor) -> Result<DenseTensor>;

    /// Conjugate transpose.
    fn adjoint(&self, a: &DenseTensor) -> Result<DenseTensor>;

    /// Sum of the diagonal of a square matrix.
    fn trace(&self, a: &DenseTensor) -> Result<Complex64>;

    /// Diagonal of a square matrix as a rank-1 tensor.
    fn diagonal(&self, a: &DenseTensor) -> Result<DenseTensor>;

    /// Eigendecomposition of a Hermitian matrix.
    fn eigh(&self, a: &DenseTensor) -> Result<EighResult>;

    /// Eigenvalues of a Hermitian matrix, ascending.
    fn eigvalsh(&self, a: &DenseTensor) -> Result<Vec<f64>> {
        Ok(self.eigh(a)?.eigenvalues)
    }

    /// Matrix exponential of a Hermitian matrix.
    fn expm(&self, a: &DenseTensor) -> Result<DenseTensor>;

    /// Principal square root of a Hermitian positive semi-definite matrix.
    ///
    /// Negative eigenvalues from round-off are clipped to zero.
    fn sqrtmh(&self, a: &DenseTensor) -> Result<DenseTensor>;

    /// Kronecker product.
    fn kron(&self, a: &DenseTensor, b: &DenseTensor) -> Result<DenseTensor>;

    /// Frobenius norm.
    fn norm(&self, a: &DenseTensor) -> f64 {
        a.norm()
    }

    /// Draw `shots` indices from the categorical distribution `probs`.
    fn implicit_random_choice<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        shots: usize,
        probs: &[f64],
    ) -> Result<Vec<usize>>;

    /// Sorted distinct values with their multiplicities.
    fn unique_with_counts(&self, values: &[usize]) -> (Vec<usize>, Vec<usize>) {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        let mut unique: Vec<usize> = Vec::new();
        let mut counts: Vec<usize> = Vec::new();
        for v in sorted {
            if unique.last() == Some(&v) {
                if let Some(last) = counts.last_mut() {
                    *last += 1;
                }
            } else {
                unique.push(v);
                counts.push(1);
            }
        }
        (unique, counts)
    }

    /// Dense vector of length `size` with `values[i]` placed at `indices[i]`.
    fn scatter(&self, size: usize, indices: &[usize], values: &[usize]) -> Result<Vec<usize>> {
        let mut out = vec![0; size];
        for (&i, &v) in indices.iter().zip(values) {
            if i >= size {
                return Err(BackendError::AxisOutOfRange { axis: i, rank: size });
            }
            out[i] = v;
        }
        Ok(out)
    }

    /// Reshape preserving row-major element order.
    fn reshape(&self, a: &DenseTensor, dims: &[usize]) -> Result<DenseTensor> {
        a.reshape(dims)
    }

    /// Axis permutation.
    fn transpose(&self, a: &DenseTensor, perm: &[usize]) -> Result<DenseTensor> {
        a.permute(perm)
    }

    /// Element-wise complex conjugate.
    fn conj(&self, a: &DenseTensor) -> DenseTensor {
        a.conj()
    }

    /// Real parts of all elements.
    fn real(&self, a: &DenseTensor) -> Vec<f64> {
        a.real_parts()
    }
}

/// Backend over [`DenseTensor`] with nalgebra eigensolvers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseBackend;

impl DenseBackend {
    /// Create the dense backend.
    pub fn new() -> Self {
        Self
    }

    /// Apply `f` to the eigenvalues of a Hermitian matrix: `V f(L) V^dagger`.
    fn hermitian_function(
        &self,
        a: &DenseTensor,
        f: impl Fn(f64) -> Complex64,
    ) -> Result<DenseTensor> {
        let EighResult {
            eigenvalues,
            eigenvectors,
        } = self.eigh(a)?;
        let n = eigenvalues.len();
        let v = eigenvectors.as_slice();
        let mut data = vec![Complex64::zero(); n * n];
        for (k, &lambda) in eigenvalues.iter().enumerate() {
            let fl = f(lambda);
            for i in 0..n {
                let vik = v[i * n + k] * fl;
                for j in 0..n {
                    data[i * n + j] += vik * v[j * n + k].conj();
                }
            }
        }
        DenseTensor::from_vec_with_shape(data, &[n, n])
    }
}

fn matrix_dims(a: &DenseTensor) -> Result<(usize, usize)> {
    let dims = a.dims();
    if let [rows, cols] = dims[..] {
        return Ok((rows, cols));
    }
    Err(BackendError::NotAMatrix { dims })
}

fn square_dim(a: &DenseTensor) -> Result<usize> {
    let (rows, cols) = matrix_dims(a)?;
    if rows != cols {
        return Err(BackendError::NonSquare { rows, cols });
    }
    Ok(rows)
}

impl Backend for DenseBackend {
    fn matmul(&self, a: &DenseTensor, b: &DenseTensor) -> Result<DenseTensor> {
        let (m, k) = matrix_dims(a)?;
        let (k_b, n) = matrix_dims(b)?;
        if k != k_b {
            return Err(BackendError::DimensionMismatch { left: k, right: k_b });
        }
        let data = gemm(a.as_slice(), b.as_slice(), m, k, n);
        DenseTensor::from_vec_with_shape(data, &[m, n])
    }

    fn adjoint(&self, a: &DenseTensor) -> Result<DenseTensor> {
        matrix_dims(a)?;
        Ok(a.permute(&[1, 0])?.conj())
    }

    fn trace(&self, a: &DenseTensor) -> Result<Complex64> {
        let n = square_dim(a)?;
        let data = a.as_slice();
        Ok((0..n).map(|i| data[i * n + i]).sum())
    }

    fn diagonal(&self, a: &DenseTensor) -> Result<DenseTensor> {
        let n = square_dim(a)?;
        let data = a.as_slice();
        DenseTensor::from_vec_with_shape((0..n).map(|i| data[i * n + i]).collect(), &[n])
    }

    fn eigh(&self, a: &DenseTensor) -> Result<EighResult> {
        let n = square_dim(a)?;
        let matrix = DMatrix::from_row_slice(n, n, a.as_slice());
        let eigen = matrix.symmetric_eigen();

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]));

        let eigenvalues = order.iter().map(|&k| eigen.eigenvalues[k]).collect();
        let mut vectors = vec![Complex64::zero(); n * n];
        for (col, &k) in order.iter().enumerate() {
            for row in 0..n {
                vectors[row * n + col] = eigen.eigenvectors[(row, k)];
            }
        }
        Ok(EighResult {
            eigenvalues,
            eigenvectors: DenseTensor::from_vec_with_shape(vectors, &[n, n])?,
        })
    }

    fn expm(&self, a: &DenseTensor) -> Result<DenseTensor> {
        self.hermitian_function(a, |x| Complex64::new(x.exp(), 0.0))
    }

    fn sqrtmh(&self, a: &DenseTensor) -> Result<DenseTensor> {
        self.hermitian_function(a, |x| Complex64::new(x.max(0.0).sqrt(), 0.0))
    }

    fn kron(&self, a: &DenseTensor, b: &DenseTensor) -> Result<DenseTensor> {
        let (ra, ca) = matrix_dims(a)?;
        let (rb, cb) = matrix_dims(b)?;
        // outer gives [ra, ca, rb, cb]; interleave rows then columns
        let outer = a.outer(b)?.permute(&[0, 2, 1, 3])?;
        outer.reshape(&[ra * rb, ca * cb])
    }

    fn implicit_random_choice<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        shots: usize,
        probs: &[f64],
    ) -> Result<Vec<usize>> {
        let dist = WeightedIndex::new(probs).map_err(|e| BackendError::InvalidProbabilities {
            message: e.to_string(),
        })?;
        Ok((0..shots).map(|_| dist.sample(rng)).collect())
    }
}
