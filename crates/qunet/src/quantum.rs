//! Quantum-information quantities over dense matrices or operator networks.
//!
//! Every function takes the numeric [`Backend`] as its first argument and
//! accepts its operands as [`Operand`]s, so a density matrix may be given
//! either as a dense tensor or as a [`QuOperator`]. Network operands are
//! evaluated on a copy; the caller's operator is left uncontracted.
//!
//! # Example
//!
//! ```
//! use qunet::{entropy, DenseBackend, DenseTensor, Operand};
//!
//! let rho = DenseTensor::from_real(&[0.5, 0.0, 0.0, 0.5], &[2, 2]).unwrap();
//! let s = entropy(&DenseBackend::new(), Operand::from(&rho), None).unwrap();
//! assert!((s - 2f64.ln()).abs() < 1e-9);
//! ```

use log::debug;
use num_complex::Complex64;
use qunet_backend::{Backend, DenseTensor};
use rand::Rng;

use crate::defaults::resolve_eps;
use crate::error::{QuantumError, Result};
use crate::operator::QuOperator;
use crate::specialize::Quantum;

/// A dense tensor or an operator network.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// A dense matrix (or vector, where the function accepts states).
    Dense(&'a DenseTensor),
    /// An operator network; evaluated on a copy when a dense value is needed.
    Network(&'a QuOperator),
}

impl<'a> From<&'a DenseTensor> for Operand<'a> {
    fn from(tensor: &'a DenseTensor) -> Self {
        Operand::Dense(tensor)
    }
}

impl<'a> From<&'a QuOperator> for Operand<'a> {
    fn from(op: &'a QuOperator) -> Self {
        Operand::Network(op)
    }
}

impl<'a> From<&'a Quantum> for Operand<'a> {
    fn from(q: &'a Quantum) -> Self {
        Operand::Network(q.as_operator())
    }
}

impl Operand<'_> {
    /// Dense matrix `(prod(out_space), prod(in_space))` for networks, the
    /// tensor itself otherwise.
    pub fn to_matrix(&self) -> Result<DenseTensor> {
        match self {
            Operand::Dense(t) => Ok((*t).clone()),
            Operand::Network(op) => {
                let mut op = (*op).clone();
                op.eval_matrix(None)
            }
        }
    }

    /// Like [`to_matrix`](Self::to_matrix), but network vectors and adjoint
    /// vectors become flat rank-1 tensors.
    pub fn to_state(&self) -> Result<DenseTensor> {
        match self {
            Operand::Network(op) if op.is_vector() || op.is_adjoint_vector() => {
                let matrix = self.to_matrix()?;
                let len = matrix.len();
                Ok(matrix.reshape(&[len])?)
            }
            _ => self.to_matrix(),
        }
    }

    fn to_operator(self) -> Result<QuOperator> {
        match self {
            Operand::Dense(t) => QuOperator::from_tensor(t.clone(), None, None),
            Operand::Network(op) => Ok(op.clone()),
        }
    }
}

/// Subsystems removed by a partial trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cut {
    /// The first `n` subsystems.
    Leading(usize),
    /// The listed subsystems.
    Subsystems(Vec<usize>),
}

impl Cut {
    /// Positions of the traced-out subsystems.
    pub fn traced(&self) -> Vec<usize> {
        match self {
            Cut::Leading(n) => (0..*n).collect(),
            Cut::Subsystems(list) => list.clone(),
        }
    }
}

impl From<usize> for Cut {
    fn from(n: usize) -> Self {
        Cut::Leading(n)
    }
}

impl From<Vec<usize>> for Cut {
    fn from(list: Vec<usize>) -> Self {
        Cut::Subsystems(list)
    }
}

/// Result that is a network or a dense tensor depending on the input.
#[derive(Debug, Clone)]
pub enum QuantumOutput {
    /// Network result, left uncontracted.
    Network(Quantum),
    /// Dense result.
    Dense(DenseTensor),
}

impl QuantumOutput {
    /// The dense value; networks are evaluated as a matrix.
    pub fn into_dense(self) -> Result<DenseTensor> {
        match self {
            QuantumOutput::Network(mut q) => q.eval_matrix(None),
            QuantumOutput::Dense(t) => Ok(t),
        }
    }
}

/// Outcome histogram of [`measurement_counts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasurementCounts {
    /// Observed outcomes (ascending) with their counts.
    Sparse {
        /// Basis-state indices that occurred.
        outcomes: Vec<usize>,
        /// Number of occurrences of each outcome.
        counts: Vec<usize>,
    },
    /// Count for every basis state.
    Dense(Vec<usize>),
}

/// Von Neumann entropy `-sum(l * ln(l + eps))` over the eigenvalues of `rho`.
///
/// Negative eigenvalues from round-off are clipped to zero. `eps` defaults
/// to [`default_eps`](crate::default_eps).
pub fn entropy<B: Backend>(backend: &B, rho: Operand<'_>, eps: Option<f64>) -> Result<f64> {
    let eps = resolve_eps(eps)?;
    let rho = rho.to_matrix()?;
    let eigenvalues = backend.eigvalsh(&rho)?;
    Ok(-eigenvalues
        .iter()
        .map(|&l| {
            let l = l.max(0.0);
            l * (l + eps).ln()
        })
        .sum::<f64>())
}

/// `Tr(O_1 O_2 ... O_n)`.
///
/// With any network operand the product is built by composition and only
/// the closed trace is evaluated; dense operands are wrapped with their axes
/// split evenly.
pub fn trace_product<B: Backend>(backend: &B, operands: &[Operand<'_>]) -> Result<Complex64> {
    let Some((first, rest)) = operands.split_first() else {
        return Err(QuantumError::InvalidArgument {
            message: "trace of an empty product".to_string(),
        });
    };

    if operands.iter().any(|o| matches!(o, Operand::Network(_))) {
        let mut product = first.to_operator()?;
        for operand in rest {
            product = product.compose(&operand.to_operator()?)?.into_operator();
        }
        let (out_space, in_space) = (product.out_space()?, product.in_space()?);
        if out_space != in_space {
            return Err(QuantumError::InvalidOperation {
                message: format!(
                    "trace of a product mapping {:?} to {:?}",
                    in_space, out_space
                ),
            });
        }
        let Quantum::Scalar(mut traced) = product.trace()? else {
            return Err(QuantumError::InvalidOperation {
                message: "trace of the product left open edges".to_string(),
            });
        };
        return traced.value();
    }

    let mut product = first.to_matrix()?;
    for operand in rest {
        product = backend.matmul(&product, &operand.to_matrix()?)?;
    }
    Ok(backend.trace(&product)?)
}

/// Reduced density matrix of a qubit state.
///
/// See [`reduced_density_matrix_qudit`].
pub fn reduced_density_matrix<B: Backend>(
    backend: &B,
    state: Operand<'_>,
    cut: &Cut,
    p: Option<&[f64]>,
) -> Result<QuantumOutput> {
    reduced_density_matrix_qudit(backend, state, cut, p, 2)
}

/// Reduced density matrix after tracing out the subsystems in `cut`.
///
/// A network state is traced structurally and returned uncontracted; a
/// vector is first turned into its projector. `p` is not supported there.
///
/// A dense state is flattened and normalised, split into subsystems of
/// dimension `local_dim`, and reduced to `w w^dagger` over the kept
/// subsystems. With `p`, the traced block is weighted by `diag(p)` and the
/// result renormalised by its trace.
pub fn reduced_density_matrix_qudit<B: Backend>(
    backend: &B,
    state: Operand<'_>,
    cut: &Cut,
    p: Option<&[f64]>,
    local_dim: usize,
) -> Result<QuantumOutput> {
    let traced = cut.traced();
    let state = match state {
        Operand::Network(op) => {
            if p.is_some() {
                return Err(QuantumError::NotSupported {
                    message: "weights p with a network state".to_string(),
                });
            }
            let reduced = if op.is_vector() {
                op.compose(op.adjoint()?.as_operator())?.partial_trace(&traced)?
            } else {
                op.partial_trace(&traced)?
            };
            return Ok(QuantumOutput::Network(reduced));
        }
        Operand::Dense(t) => t,
    };

    if local_dim < 2 {
        return Err(QuantumError::InvalidArgument {
            message: format!("local dimension {} is below 2", local_dim),
        });
    }
    let size = state.len();
    let mut freedom = 0;
    let mut full = 1;
    while full < size {
        full *= local_dim;
        freedom += 1;
    }
    if full != size {
        return Err(QuantumError::InvalidArgument {
            message: format!("{} amplitudes do not split into dimension-{} subsystems", size, local_dim),
        });
    }
    for (i, &t) in traced.iter().enumerate() {
        if t >= freedom || traced[..i].contains(&t) {
            return Err(QuantumError::InvalidArgument {
                message: format!("cannot trace out subsystem {} of {}", t, freedom),
            });
        }
    }

    let kept: Vec<usize> = (0..freedom).filter(|i| !traced.contains(i)).collect();
    let perm: Vec<usize> = kept.iter().chain(&traced).copied().collect();
    let traced_size = local_dim.pow(traced.len() as u32);

    let w = state
        .scale(Complex64::new(1.0 / state.norm(), 0.0))
        .reshape(&vec![local_dim; freedom])?
        .permute(&perm)?
        .reshape(&[size / traced_size, traced_size])?;
    let w_dag = backend.adjoint(&w)?;

    let rho = match p {
        None => backend.matmul(&w, &w_dag)?,
        Some(p) => {
            if p.len() != traced_size {
                return Err(QuantumError::InvalidArgument {
                    message: format!("{} weights for {} traced basis states", p.len(), traced_size),
                });
            }
            let mut diag = vec![Complex64::new(0.0, 0.0); traced_size * traced_size];
            for (i, &pi) in p.iter().enumerate() {
                diag[i * traced_size + i] = Complex64::new(pi, 0.0);
            }
            let diag = DenseTensor::from_vec_with_shape(diag, &[traced_size, traced_size])?;
            let rho = backend.matmul(&backend.matmul(&w, &diag)?, &w_dag)?;
            let tr = backend.trace(&rho)?;
            rho.scale(Complex64::new(1.0, 0.0) / tr)
        }
    };
    Ok(QuantumOutput::Dense(rho))
}

/// `Re Tr(rho h) - S(rho) / beta`.
pub fn free_energy<B: Backend>(
    backend: &B,
    rho: Operand<'_>,
    h: Operand<'_>,
    beta: f64,
    eps: Option<f64>,
) -> Result<f64> {
    let energy = trace_product(backend, &[rho, h])?.re;
    let s = entropy(backend, rho, eps)?;
    Ok(energy - s / beta)
}

/// `Re Tr(rho h) - S_k(rho) / beta` with the Renyi entropy
/// `S_k = -ln |Tr(rho^k)|`.
pub fn renyi_free_energy<B: Backend>(
    backend: &B,
    rho: Operand<'_>,
    h: Operand<'_>,
    beta: f64,
    k: usize,
) -> Result<f64> {
    if k == 0 {
        return Err(QuantumError::InvalidArgument {
            message: "Renyi order must be positive".to_string(),
        });
    }
    let energy = trace_product(backend, &[rho, h])?.re;
    let s = -trace_product(backend, &vec![rho; k])?.norm().ln();
    Ok(energy - s / beta)
}

/// `1/2 sum sqrt(l + eps)` over the eigenvalues `l` of `D^dagger D`,
/// `D = rho - rho0`.
pub fn trace_distance<B: Backend>(
    backend: &B,
    rho: Operand<'_>,
    rho0: Operand<'_>,
    eps: Option<f64>,
) -> Result<f64> {
    let eps = resolve_eps(eps)?;
    let diff = rho.to_matrix()?.sub(&rho0.to_matrix()?)?;
    let square = backend.matmul(&backend.adjoint(&diff)?, &diff)?;
    let eigenvalues = backend.eigvalsh(&square)?;
    Ok(0.5 * eigenvalues.iter().map(|&l| (l.max(0.0) + eps).sqrt()).sum::<f64>())
}

/// Uhlmann fidelity `(Re Tr sqrt(sqrt(rho) rho0 sqrt(rho)))^2`.
pub fn fidelity<B: Backend>(backend: &B, rho: Operand<'_>, rho0: Operand<'_>) -> Result<f64> {
    let root = backend.sqrtmh(&rho.to_matrix()?)?;
    let inner = backend.matmul(&backend.matmul(&root, &rho0.to_matrix()?)?, &root)?;
    let tr = backend.trace(&backend.sqrtmh(&inner)?)?;
    Ok(tr.re * tr.re)
}

/// Thermal state `exp(-beta h) / Tr exp(-beta h)` of a Hermitian `h`.
pub fn gibbs_state<B: Backend>(backend: &B, h: Operand<'_>, beta: f64) -> Result<DenseTensor> {
    let h = h.to_matrix()?;
    let rho = backend.expm(&h.scale(Complex64::new(-beta, 0.0)))?;
    let tr = backend.trace(&rho)?;
    Ok(rho.scale(Complex64::new(1.0, 0.0) / tr))
}

/// Thermofield double: `exp(-beta h / 2)` flattened and normalised.
pub fn double_state<B: Backend>(backend: &B, h: Operand<'_>, beta: f64) -> Result<DenseTensor> {
    let h = h.to_matrix()?;
    let rho = backend.expm(&h.scale(Complex64::new(-beta / 2.0, 0.0)))?;
    let state = rho.reshape(&[rho.len()])?;
    let norm = backend.norm(&state);
    Ok(state.scale(Complex64::new(1.0 / norm, 0.0)))
}

/// Sample `shots` computational-basis measurements of `state`.
///
/// A matrix is read as a density matrix (normalised by its trace, diagonal
/// taken); any other shape as amplitudes (normalised, squared modulus).
pub fn measurement_counts<B: Backend, R: Rng + ?Sized>(
    backend: &B,
    rng: &mut R,
    state: Operand<'_>,
    shots: usize,
    sparse: bool,
) -> Result<MeasurementCounts> {
    let state = state.to_state()?;
    let probs: Vec<f64> = if state.rank() == 2 {
        let tr = backend.trace(&state)?;
        let diag = backend.diagonal(&state.scale(Complex64::new(1.0, 0.0) / tr))?;
        backend.real(&diag)
    } else {
        let scaled = state.scale(Complex64::new(1.0 / backend.norm(&state), 0.0));
        scaled.as_slice().iter().map(|a| a.norm_sqr()).collect()
    };
    let probs: Vec<f64> = probs.into_iter().map(|p| p.max(0.0)).collect();
    debug!(shots = shots, outcomes = probs.len(); "Sampling measurement outcomes");

    let raw = backend.implicit_random_choice(rng, shots, &probs)?;
    let (outcomes, counts) = backend.unique_with_counts(&raw);
    if sparse {
        return Ok(MeasurementCounts::Sparse { outcomes, counts });
    }
    Ok(MeasurementCounts::Dense(backend.scatter(
        probs.len(),
        &outcomes,
        &counts,
    )?))
}

/// Tensor product of local terms, each wrapped with its axes split evenly.
///
/// Returns the dense matrix when `matrix_form` is set, the network otherwise.
pub fn generate_local_hamiltonian(terms: &[DenseTensor], matrix_form: bool) -> Result<QuantumOutput> {
    let Some((first, rest)) = terms.split_first() else {
        return Err(QuantumError::InvalidArgument {
            message: "no Hamiltonian terms".to_string(),
        });
    };
    let mut hop = QuOperator::from_tensor(first.clone(), None, None)?;
    for term in rest {
        let next = QuOperator::from_tensor(term.clone(), None, None)?;
        hop = hop.tensor_product(&next)?.into_operator();
    }
    if matrix_form {
        return Ok(QuantumOutput::Dense(hop.eval_matrix(None)?));
    }
    Ok(QuantumOutput::Network(Quantum::from(hop)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use qunet_backend::DenseBackend;

    fn real(data: &[f64], dims: &[usize]) -> DenseTensor {
        DenseTensor::from_real(data, dims).unwrap()
    }

    #[test]
    fn test_cut_traced_positions() {
        assert_eq!(Cut::from(2).traced(), vec![0, 1]);
        assert_eq!(Cut::from(vec![3, 1]).traced(), vec![3, 1]);
    }

    #[test]
    fn test_entropy_clips_negative_eigenvalues() {
        let rho = real(&[1.0, 0.0, 0.0, -1e-14], &[2, 2]);
        let s = entropy(&DenseBackend::new(), Operand::from(&rho), None).unwrap();
        assert!(s.is_finite());
        assert_abs_diff_eq!(s, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_trace_product_empty() {
        assert!(matches!(
            trace_product(&DenseBackend::new(), &[]),
            Err(QuantumError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_entropy_rejects_negative_eps() {
        let rho = real(&[1.0, 0.0, 0.0, 0.0], &[2, 2]);
        let err = entropy(&DenseBackend::new(), Operand::from(&rho), Some(-1e-3)).unwrap_err();
        assert!(matches!(err, QuantumError::InvalidEps(_)));
    }

    #[test]
    fn test_trace_product_rejects_non_square_network() {
        let backend = DenseBackend::new();
        let tall = real(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], &[4, 2]);
        assert!(matches!(
            trace_product(&backend, &[Operand::from(&tall)]),
            Err(QuantumError::Backend(_))
        ));

        let op = QuOperator::from_tensor(tall, Some(&[0]), Some(&[1])).unwrap();
        assert!(matches!(
            trace_product(&backend, &[Operand::from(&op)]),
            Err(QuantumError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_trace_product_rejects_lone_vector() {
        let psi = real(&[3.0, 4.0], &[2]);
        let v = QuOperator::from_tensor(psi, Some(&[0]), Some(&[])).unwrap();
        assert!(v.is_vector());
        assert!(matches!(
            trace_product(&DenseBackend::new(), &[Operand::from(&v)]),
            Err(QuantumError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_renyi_order_zero() {
        let rho = real(&[1.0, 0.0, 0.0, 0.0], &[2, 2]);
        let err = renyi_free_energy(
            &DenseBackend::new(),
            Operand::from(&rho),
            Operand::from(&rho),
            1.0,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, QuantumError::InvalidArgument { .. }));
    }

    #[test]
    fn test_reduced_density_rejects_bad_length() {
        let psi = real(&[1.0, 0.0, 0.0], &[3]);
        let err =
            reduced_density_matrix(&DenseBackend::new(), Operand::from(&psi), &Cut::from(1), None)
                .unwrap_err();
        assert!(matches!(err, QuantumError::InvalidArgument { .. }));
    }

    #[test]
    fn test_double_state_is_normalised() {
        let h = real(&[1.0, 0.0, 0.0, -1.0], &[2, 2]);
        let psi = double_state(&DenseBackend::new(), Operand::from(&h), 0.7).unwrap();
        assert_eq!(psi.dims(), vec![4]);
        assert_abs_diff_eq!(psi.norm(), 1.0, epsilon = 1e-12);
    }
}
