//! Integration tests for the quantum-information functions.

use approx::assert_abs_diff_eq;
use qunet::{
    double_state, entropy, fidelity, free_energy, generate_local_hamiltonian,
    gibbs_state, measurement_counts, reduced_density_matrix, reduced_density_matrix_qudit,
    renyi_free_energy, trace_distance, trace_product, Backend, Complex64, Cut, DenseBackend,
    DenseTensor, MeasurementCounts, Operand, QuOperator, QuVector, QuantumError, QuantumOutput,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ============================================================================
// Helpers
// ============================================================================

fn assert_tensors_close(a: &DenseTensor, b: &DenseTensor) {
    assert_eq!(a.dims(), b.dims());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_abs_diff_eq!(x.re, y.re, epsilon = 1e-9);
        assert_abs_diff_eq!(x.im, y.im, epsilon = 1e-9);
    }
}

fn real(data: &[f64], dims: &[usize]) -> DenseTensor {
    DenseTensor::from_real(data, dims).unwrap()
}

fn ket0_density() -> DenseTensor {
    real(&[1.0, 0.0, 0.0, 0.0], &[2, 2])
}

fn maximally_mixed(dim: usize) -> DenseTensor {
    DenseTensor::identity(dim).scale(Complex64::new(1.0 / dim as f64, 0.0))
}

/// Random density matrix `A A^dagger / Tr(A A^dagger)`.
fn random_density(rng: &mut ChaCha8Rng, dim: usize) -> DenseTensor {
    let backend = DenseBackend::new();
    let a = DenseTensor::random(rng, &[dim, dim]);
    let aa = backend.matmul(&a, &backend.adjoint(&a).unwrap()).unwrap();
    let tr = backend.trace(&aa).unwrap();
    aa.scale(Complex64::new(1.0, 0.0) / tr)
}

fn pauli_z() -> DenseTensor {
    real(&[1.0, 0.0, 0.0, -1.0], &[2, 2])
}

// ============================================================================
// Entropies and distances
// ============================================================================

#[test]
fn test_entropy_of_pure_state_is_zero() {
    let s = entropy(&DenseBackend::new(), Operand::from(&ket0_density()), None).unwrap();
    assert_abs_diff_eq!(s, 0.0, epsilon = 1e-9);
}

#[test]
fn test_entropy_of_maximally_mixed_state() {
    let s = entropy(&DenseBackend::new(), Operand::from(&maximally_mixed(4)), Some(1e-12)).unwrap();
    assert_abs_diff_eq!(s, 4f64.ln(), epsilon = 1e-9);
}

#[test]
fn test_entropy_of_network_operand() {
    let rho = QuOperator::from_tensor(maximally_mixed(2), None, None).unwrap();
    let s = entropy(&DenseBackend::new(), Operand::from(&rho), None).unwrap();
    assert_abs_diff_eq!(s, 2f64.ln(), epsilon = 1e-9);
    // the operand is evaluated on a copy
    assert_eq!(rho.out_space().unwrap(), vec![2]);
}

#[test]
fn test_fidelity_with_itself_is_one() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let rho = random_density(&mut rng, 3);
    let f = fidelity(&DenseBackend::new(), Operand::from(&rho), Operand::from(&rho)).unwrap();
    assert_abs_diff_eq!(f, 1.0, epsilon = 1e-8);
}

#[test]
fn test_fidelity_of_orthogonal_states() {
    let ket1 = real(&[0.0, 0.0, 0.0, 1.0], &[2, 2]);
    let f = fidelity(
        &DenseBackend::new(),
        Operand::from(&ket0_density()),
        Operand::from(&ket1),
    )
    .unwrap();
    assert_abs_diff_eq!(f, 0.0, epsilon = 1e-9);
}

#[test]
fn test_trace_distance() {
    let backend = DenseBackend::new();
    let ket1 = real(&[0.0, 0.0, 0.0, 1.0], &[2, 2]);
    let d = trace_distance(&backend, Operand::from(&ket0_density()), Operand::from(&ket1), Some(0.0))
        .unwrap();
    assert_abs_diff_eq!(d, 1.0, epsilon = 1e-9);

    let same = trace_distance(
        &backend,
        Operand::from(&ket0_density()),
        Operand::from(&ket0_density()),
        Some(0.0),
    )
    .unwrap();
    assert_abs_diff_eq!(same, 0.0, epsilon = 1e-9);
}

// ============================================================================
// Traces and free energies
// ============================================================================

#[test]
fn test_trace_product_dense_and_network_agree() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let a = DenseTensor::random(&mut rng, &[2, 2]);
    let b = DenseTensor::random(&mut rng, &[2, 2]);
    let c = DenseTensor::random(&mut rng, &[2, 2]);

    let dense = trace_product(
        &backend,
        &[Operand::from(&a), Operand::from(&b), Operand::from(&c)],
    )
    .unwrap();
    let b_op = QuOperator::from_tensor(b.clone(), None, None).unwrap();
    let mixed = trace_product(
        &backend,
        &[Operand::from(&a), Operand::from(&b_op), Operand::from(&c)],
    )
    .unwrap();

    let expected = backend
        .trace(&backend.matmul(&backend.matmul(&a, &b).unwrap(), &c).unwrap())
        .unwrap();
    assert_abs_diff_eq!(dense.re, expected.re, epsilon = 1e-10);
    assert_abs_diff_eq!(dense.im, expected.im, epsilon = 1e-10);
    assert_abs_diff_eq!(mixed.re, expected.re, epsilon = 1e-10);
    assert_abs_diff_eq!(mixed.im, expected.im, epsilon = 1e-10);
}

#[test]
fn test_free_energy_of_maximally_mixed_state() {
    let backend = DenseBackend::new();
    let rho = maximally_mixed(2);
    let h = pauli_z();
    let f = free_energy(&backend, Operand::from(&rho), Operand::from(&h), 2.0, None).unwrap();
    // <Z> = 0, S = ln 2
    assert_abs_diff_eq!(f, -(2f64.ln()) / 2.0, epsilon = 1e-9);
}

#[test]
fn test_renyi_free_energy_of_pure_state() {
    let backend = DenseBackend::new();
    let rho = ket0_density();
    let h = pauli_z();
    let f = renyi_free_energy(&backend, Operand::from(&rho), Operand::from(&h), 1.0, 2).unwrap();
    // <0|Z|0> = 1, Tr(rho^2) = 1
    assert_abs_diff_eq!(f, 1.0, epsilon = 1e-9);
}

// ============================================================================
// States
// ============================================================================

#[test]
fn test_gibbs_state_of_zero_hamiltonian_is_uniform() {
    let h = DenseTensor::zeros(&[4, 4]);
    let rho = gibbs_state(&DenseBackend::new(), Operand::from(&h), 1.0).unwrap();
    assert_tensors_close(&rho, &maximally_mixed(4));
}

#[test]
fn test_gibbs_state_populations() {
    let beta: f64 = 0.8;
    let rho = gibbs_state(&DenseBackend::new(), Operand::from(&pauli_z()), beta).unwrap();
    let z = 2.0 * beta.cosh();
    assert_abs_diff_eq!(rho.get(&[0, 0]).unwrap().re, (-beta).exp() / z, epsilon = 1e-10);
    assert_abs_diff_eq!(rho.get(&[1, 1]).unwrap().re, beta.exp() / z, epsilon = 1e-10);
}

#[test]
fn test_double_state_reduces_to_gibbs_state() {
    let backend = DenseBackend::new();
    let beta = 1.3;
    let h = pauli_z();
    let psi = double_state(&backend, Operand::from(&h), beta).unwrap();
    let rho = reduced_density_matrix(&backend, Operand::from(&psi), &Cut::Leading(1), None)
        .unwrap()
        .into_dense()
        .unwrap();
    let gibbs = gibbs_state(&backend, Operand::from(&h), beta).unwrap();
    assert_tensors_close(&rho, &gibbs);
}

// ============================================================================
// Reduced density matrices
// ============================================================================

#[test]
fn test_reduced_density_of_product_state() {
    let backend = DenseBackend::new();
    // |0> (x) |+>
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let psi = real(&[h, h, 0.0, 0.0], &[4]);
    let rho_b = reduced_density_matrix(&backend, Operand::from(&psi), &Cut::from(1), None)
        .unwrap()
        .into_dense()
        .unwrap();
    assert_tensors_close(&rho_b, &real(&[0.5, 0.5, 0.5, 0.5], &[2, 2]));

    let rho_a = reduced_density_matrix(&backend, Operand::from(&psi), &Cut::from(vec![1]), None)
        .unwrap()
        .into_dense()
        .unwrap();
    assert_tensors_close(&rho_a, &ket0_density());
}

#[test]
fn test_reduced_density_normalises_state() {
    let backend = DenseBackend::new();
    let psi = real(&[3.0, 0.0, 0.0, 3.0], &[4]);
    let rho = reduced_density_matrix(&backend, Operand::from(&psi), &Cut::from(1), None)
        .unwrap()
        .into_dense()
        .unwrap();
    assert_tensors_close(&rho, &maximally_mixed(2));
}

#[test]
fn test_reduced_density_with_weights() {
    let backend = DenseBackend::new();
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let bell = real(&[h, 0.0, 0.0, h], &[4]);
    let rho = reduced_density_matrix(
        &backend,
        Operand::from(&bell),
        &Cut::from(vec![1]),
        Some(&[1.0, 0.0]),
    )
    .unwrap()
    .into_dense()
    .unwrap();
    assert_tensors_close(&rho, &ket0_density());
}

#[test]
fn test_reduced_density_qutrits() {
    let backend = DenseBackend::new();
    let mut data = vec![0.0; 9];
    for i in 0..3 {
        data[i * 3 + i] = 1.0;
    }
    let psi = real(&data, &[9]);
    let rho = reduced_density_matrix_qudit(&backend, Operand::from(&psi), &Cut::from(1), None, 3)
        .unwrap()
        .into_dense()
        .unwrap();
    assert_tensors_close(&rho, &maximally_mixed(3));
}

#[test]
fn test_reduced_density_of_network_state() {
    let backend = DenseBackend::new();
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let bell = QuVector::from_tensor(real(&[h, 0.0, 0.0, h], &[2, 2]), None).unwrap();
    let out = reduced_density_matrix(&backend, Operand::from(&*bell), &Cut::from(1), None).unwrap();
    assert!(matches!(out, QuantumOutput::Network(_)));
    assert_tensors_close(&out.into_dense().unwrap(), &maximally_mixed(2));

    let rho = bell.projector().unwrap();
    let out = reduced_density_matrix(&backend, Operand::from(&rho), &Cut::from(vec![0]), None)
        .unwrap()
        .into_dense()
        .unwrap();
    assert_tensors_close(&out, &maximally_mixed(2));
}

#[test]
fn test_reduced_density_weights_rejected_for_networks() {
    let rho = QuOperator::from_tensor(ket0_density(), None, None).unwrap();
    let err = reduced_density_matrix(
        &DenseBackend::new(),
        Operand::from(&rho),
        &Cut::from(1),
        Some(&[1.0]),
    )
    .unwrap_err();
    assert!(matches!(err, QuantumError::NotSupported { .. }));
}

// ============================================================================
// Measurement sampling
// ============================================================================

#[test]
fn test_measurement_counts_of_basis_state() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let rho = ket0_density();

    let sparse = measurement_counts(&backend, &mut rng, Operand::from(&rho), 100, true).unwrap();
    assert_eq!(
        sparse,
        MeasurementCounts::Sparse {
            outcomes: vec![0],
            counts: vec![100]
        }
    );

    let dense = measurement_counts(&backend, &mut rng, Operand::from(&rho), 100, false).unwrap();
    assert_eq!(dense, MeasurementCounts::Dense(vec![100, 0]));
}

#[test]
fn test_measurement_counts_of_amplitudes() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    // unnormalised |01> + |11>
    let psi = real(&[0.0, 2.0, 0.0, 2.0], &[4]);
    let shots = 1000;
    let counts = measurement_counts(&backend, &mut rng, Operand::from(&psi), shots, false).unwrap();
    let MeasurementCounts::Dense(counts) = counts else {
        panic!("expected dense counts");
    };
    assert_eq!(counts.len(), 4);
    assert_eq!(counts[0] + counts[2], 0);
    assert_eq!(counts.iter().sum::<usize>(), shots);
    assert!(counts[1] > 350 && counts[3] > 350);
}

#[test]
fn test_measurement_counts_of_network_vector() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let v = QuVector::from_tensor(real(&[0.0, 0.0, 1.0, 0.0], &[2, 2]), None).unwrap();
    let counts = measurement_counts(&backend, &mut rng, Operand::from(&*v), 10, false).unwrap();
    assert_eq!(counts, MeasurementCounts::Dense(vec![0, 0, 10, 0]));
}

// ============================================================================
// Local Hamiltonians
// ============================================================================

#[test]
fn test_generate_local_hamiltonian_matrix_form() {
    let backend = DenseBackend::new();
    let x = real(&[0.0, 1.0, 1.0, 0.0], &[2, 2]);
    let z = pauli_z();
    let h = generate_local_hamiltonian(&[x.clone(), z.clone()], true)
        .unwrap()
        .into_dense()
        .unwrap();
    assert_tensors_close(&h, &backend.kron(&x, &z).unwrap());
}

#[test]
fn test_generate_local_hamiltonian_network_form() {
    let x = real(&[0.0, 1.0, 1.0, 0.0], &[2, 2]);
    let out = generate_local_hamiltonian(&[x.clone(), x.clone(), x], false).unwrap();
    let QuantumOutput::Network(h) = out else {
        panic!("expected a network");
    };
    assert_eq!(h.out_space().unwrap(), vec![2, 2, 2]);
    assert_eq!(h.in_space().unwrap(), vec![2, 2, 2]);
    assert!(generate_local_hamiltonian(&[], true).is_err());
}
