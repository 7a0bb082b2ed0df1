use crate::error::{BackendError, Result};
use faer::linalg::matmul::matmul as faer_matmul;
use faer::{Accum, Par};
use mdarray::{DynRank, Shape, Tensor};
use num_complex::Complex64;
use num_traits::{One, Zero};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::borrow::Cow;
use std::ops::Deref;

/// Dense complex tensor, wrapping mdarray's Tensor with dynamic rank.
///
/// Elements are stored in row-major order. A rank-0 tensor holds exactly one
/// element and represents a scalar.
#[derive(Debug, Clone)]
pub struct DenseTensor(Tensor<Complex64, DynRank>);

impl DenseTensor {
    /// Create a tensor from flat row-major data and a shape.
    ///
    /// # Errors
    /// Returns [`BackendError::ShapeMismatch`] if the product of `dims`
    /// differs from `data.len()`.
    pub fn from_vec_with_shape(data: Vec<Complex64>, dims: &[usize]) -> Result<Self> {
        let expected_len: usize = dims.iter().product();
        if data.len() != expected_len {
            return Err(BackendError::ShapeMismatch {
                len: data.len(),
                dims: dims.to_vec(),
            });
        }
        let tensor = Tensor::from(data).into_shape(DynRank::from_dims(dims));
        Ok(Self(tensor))
    }

    /// Create a tensor from real row-major data.
    pub fn from_real(data: &[f64], dims: &[usize]) -> Result<Self> {
        let data = data.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        Self::from_vec_with_shape(data, dims)
    }

    /// Create a rank-0 tensor holding a single value.
    pub fn scalar(value: Complex64) -> Self {
        let tensor = Tensor::from(vec![value]).into_shape(DynRank::from_dims(&[]));
        Self(tensor)
    }

    /// Create a zero tensor of the given shape.
    pub fn zeros(dims: &[usize]) -> Self {
        let size: usize = dims.iter().product();
        let tensor =
            Tensor::from(vec![Complex64::zero(); size]).into_shape(DynRank::from_dims(dims));
        Self(tensor)
    }

    /// Identity matrix of size `dim x dim`.
    pub fn identity(dim: usize) -> Self {
        Self::delta(2, dim)
    }

    /// Copy tensor: one where all indices agree, zero elsewhere.
    ///
    /// Rank 2 gives the identity matrix, rank 0 gives the scalar 1.
    pub fn delta(rank: usize, dim: usize) -> Self {
        let dims = vec![dim; rank];
        let mut out = Self::zeros(&dims);
        if rank == 0 {
            out.0[0] = Complex64::one();
            return out;
        }
        // Stride of the all-equal diagonal in row-major order: 1 + d + d^2 + ...
        let step: usize = (0..rank).map(|k| dim.pow(k as u32)).sum();
        for i in 0..dim {
            out.0[i * step] = Complex64::one();
        }
        out
    }

    /// Random tensor with real and imaginary parts drawn from a standard normal.
    pub fn random<R: Rng>(rng: &mut R, dims: &[usize]) -> Self {
        let size: usize = dims.iter().product();
        let data: Vec<Complex64> = (0..size)
            .map(|_| Complex64::new(StandardNormal.sample(rng), StandardNormal.sample(rng)))
            .collect();
        let tensor = Tensor::from(data).into_shape(DynRank::from_dims(dims));
        Self(tensor)
    }

    /// Get the shape (dimensions) of the tensor.
    pub fn dims(&self) -> Vec<usize> {
        self.0.shape().with_dims(|d| d.to_vec())
    }

    /// Get the rank (number of dimensions).
    pub fn rank(&self) -> usize {
        self.0.rank()
    }

    /// Get underlying data as a row-major slice.
    pub fn as_slice(&self) -> &[Complex64] {
        &self.0[..]
    }

    /// Convert to Vec, consuming the tensor.
    pub fn into_vec(self) -> Vec<Complex64> {
        self.0.into_vec()
    }

    /// Get the total number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element at a multi-index.
    ///
    /// # Errors
    /// Returns an error if the index has the wrong length or is out of range.
    pub fn get(&self, index: &[usize]) -> Result<Complex64> {
        let dims = self.dims();
        if index.len() != dims.len() {
            return Err(BackendError::AxisOutOfRange {
                axis: index.len(),
                rank: dims.len(),
            });
        }
        let mut flat = 0;
        for (axis, (&i, &d)) in index.iter().zip(dims.iter()).enumerate() {
            if i >= d {
                return Err(BackendError::AxisOutOfRange { axis, rank: dims.len() });
            }
            flat = flat * d + i;
        }
        Ok(self.0[flat])
    }

    /// Value of a rank-0 (or single-element) tensor.
    pub fn scalar_value(&self) -> Option<Complex64> {
        (self.len() == 1).then(|| self.0[0])
    }

    /// Reinterpret the data with a new shape of equal size.
    pub fn reshape(&self, dims: &[usize]) -> Result<Self> {
        let size: usize = dims.iter().product();
        if size != self.len() {
            return Err(BackendError::ReshapeMismatch {
                from: self.dims(),
                to: dims.to_vec(),
            });
        }
        Self::from_vec_with_shape(self.as_slice().to_vec(), dims)
    }

    /// Permute the axes: axis `i` of the result is axis `perm[i]` of `self`.
    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        let rank = self.rank();
        let mut seen = vec![false; rank];
        let valid = perm.len() == rank
            && perm.iter().all(|&p| p < rank && !std::mem::replace(&mut seen[p], true));
        if !valid {
            return Err(BackendError::InvalidPermutation {
                perm: perm.to_vec(),
                rank,
            });
        }
        if perm.iter().enumerate().all(|(i, &p)| i == p) {
            return Ok(self.clone());
        }
        let permuted = self.0.permute(perm).to_tensor();
        Ok(Self(permuted))
    }

    /// Element-wise complex conjugate.
    pub fn conj(&self) -> Self {
        self.map(|z| z.conj())
    }

    /// Real parts of all elements, in row-major order.
    pub fn real_parts(&self) -> Vec<f64> {
        self.as_slice().iter().map(|z| z.re).collect()
    }

    /// Multiply every element by `factor`.
    pub fn scale(&self, factor: Complex64) -> Self {
        self.map(|z| z * factor)
    }

    /// Element-wise sum with a tensor of identical shape.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference with a tensor of identical shape.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_with(other, |a, b| a - b)
    }

    /// Frobenius norm.
    pub fn norm(&self) -> f64 {
        self.as_slice().iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Apply `f` to every element.
    pub fn map(&self, f: impl Fn(Complex64) -> Complex64) -> Self {
        let data = self.as_slice().iter().map(|&z| f(z)).collect::<Vec<_>>();
        let tensor = Tensor::from(data).into_shape(DynRank::from_dims(&self.dims()));
        Self(tensor)
    }

    fn zip_with(&self, other: &Self, f: impl Fn(Complex64, Complex64) -> Complex64) -> Result<Self> {
        let dims = self.dims();
        if dims != other.dims() {
            return Err(BackendError::ShapeMismatch {
                len: other.len(),
                dims,
            });
        }
        let data = self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Self::from_vec_with_shape(data, &dims)
    }

    /// Contract this tensor with another over paired axes.
    ///
    /// The result carries the free axes of `self` followed by the free axes of
    /// `other`, each in their original order. Contracted axes are made
    /// contiguous by permutation before a single GEMM call.
    pub fn contract(&self, axes: &[usize], other: &Self, other_axes: &[usize]) -> Result<Self> {
        let dims = self.dims();
        let other_dims = other.dims();
        if axes.len() != other_axes.len() {
            return Err(BackendError::DimensionMismatch {
                left: axes.len(),
                right: other_axes.len(),
            });
        }
        for (&a, &b) in axes.iter().zip(other_axes) {
            if a >= dims.len() {
                return Err(BackendError::AxisOutOfRange { axis: a, rank: dims.len() });
            }
            if b >= other_dims.len() {
                return Err(BackendError::AxisOutOfRange {
                    axis: b,
                    rank: other_dims.len(),
                });
            }
            if dims[a] != other_dims[b] {
                return Err(BackendError::DimensionMismatch {
                    left: dims[a],
                    right: other_dims[b],
                });
            }
        }

        // self: contracted axes to the end, other: contracted axes to the front
        let (perm_self, new_dims_self) = contraction_permutation(&dims, axes, false);
        let (perm_other, new_dims_other) = contraction_permutation(&other_dims, other_axes, true);

        let lhs: Cow<'_, Self> = if is_identity_perm(&perm_self) {
            Cow::Borrowed(self)
        } else {
            Cow::Owned(self.permute(&perm_self)?)
        };
        let rhs: Cow<'_, Self> = if is_identity_perm(&perm_other) {
            Cow::Borrowed(other)
        } else {
            Cow::Owned(other.permute(&perm_other)?)
        };

        let naxes = axes.len();
        let m: usize = new_dims_self[..new_dims_self.len() - naxes].iter().product();
        let k: usize = new_dims_self[new_dims_self.len() - naxes..].iter().product();
        let n: usize = new_dims_other[naxes..].iter().product();
        let data = gemm(lhs.as_slice(), rhs.as_slice(), m, k, n);

        let result_dims: Vec<usize> = new_dims_self[..new_dims_self.len() - naxes]
            .iter()
            .chain(&new_dims_other[naxes..])
            .copied()
            .collect();
        Self::from_vec_with_shape(data, &result_dims)
    }

    /// Outer product: all axes of `self` followed by all axes of `other`.
    pub fn outer(&self, other: &Self) -> Result<Self> {
        self.contract(&[], other, &[])
    }

    /// Trace over a pair of axes, removing both from the result.
    pub fn trace_axes(&self, axis_a: usize, axis_b: usize) -> Result<Self> {
        let dims = self.dims();
        let rank = dims.len();
        for axis in [axis_a, axis_b] {
            if axis >= rank {
                return Err(BackendError::AxisOutOfRange { axis, rank });
            }
        }
        if axis_a == axis_b {
            return Err(BackendError::InvalidPermutation {
                perm: vec![axis_a, axis_b],
                rank,
            });
        }
        if dims[axis_a] != dims[axis_b] {
            return Err(BackendError::DimensionMismatch {
                left: dims[axis_a],
                right: dims[axis_b],
            });
        }
        let d = dims[axis_a];
        let rest: Vec<usize> = (0..rank).filter(|&i| i != axis_a && i != axis_b).collect();
        let perm: Vec<usize> = rest.iter().copied().chain([axis_a, axis_b]).collect();
        let moved = self.permute(&perm)?;
        let rest_dims: Vec<usize> = rest.iter().map(|&i| dims[i]).collect();
        let outer: usize = rest_dims.iter().product();
        let block = d * d;
        let src = moved.as_slice();
        let data = (0..outer)
            .map(|o| (0..d).map(|i| src[o * block + i * d + i]).sum())
            .collect();
        Self::from_vec_with_shape(data, &rest_dims)
    }
}

impl Deref for DenseTensor {
    type Target = Tensor<Complex64, DynRank>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Complex64> for DenseTensor {
    fn from(value: Complex64) -> Self {
        Self::scalar(value)
    }
}

fn is_identity_perm(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &p)| i == p)
}

/// Permutation making contracted axes contiguous, at the front or the end.
///
/// Contracted axes keep the order given in `axes` so the pairing with the
/// other operand is preserved. Returns (permutation, permuted dims).
fn contraction_permutation(
    dims: &[usize],
    axes: &[usize],
    axes_at_front: bool,
) -> (Vec<usize>, Vec<usize>) {
    let free: Vec<usize> = (0..dims.len()).filter(|i| !axes.contains(i)).collect();
    let perm: Vec<usize> = if axes_at_front {
        axes.iter().chain(free.iter()).copied().collect()
    } else {
        free.iter().chain(axes.iter()).copied().collect()
    };
    let new_dims = perm.iter().map(|&i| dims[i]).collect();
    (perm, new_dims)
}

/// Row-major `C[m, n] = A[m, k] * B[k, n]`.
pub(crate) fn gemm(a: &[Complex64], b: &[Complex64], m: usize, k: usize, n: usize) -> Vec<Complex64> {
    let mut c = vec![Complex64::zero(); m * n];
    if m == 0 || n == 0 || k == 0 {
        return c;
    }
    // Row-major views: row stride is the column count, column stride is 1.
    let a_mat = unsafe { faer::MatRef::from_raw_parts(a.as_ptr(), m, k, k as isize, 1) };
    let b_mat = unsafe { faer::MatRef::from_raw_parts(b.as_ptr(), k, n, n as isize, 1) };
    let mut c_mat =
        unsafe { faer::MatMut::from_raw_parts_mut(c.as_mut_ptr(), m, n, n as isize, 1) };
    faer_matmul(&mut c_mat, Accum::Replace, a_mat, b_mat, Complex64::one(), Par::Seq);
    c
}
