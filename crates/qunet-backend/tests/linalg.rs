//! Integration tests for the dense backend.

use approx::assert_abs_diff_eq;
use qunet_backend::{Backend, BackendError, Complex64, DenseBackend, DenseTensor};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn assert_tensors_close(a: &DenseTensor, b: &DenseTensor, tol: f64) {
    assert_eq!(a.dims(), b.dims());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_abs_diff_eq!(x.re, y.re, epsilon = tol);
        assert_abs_diff_eq!(x.im, y.im, epsilon = tol);
    }
}

/// Random Hermitian matrix `(A + A^dagger) / 2`.
fn random_hermitian(rng: &mut ChaCha8Rng, n: usize) -> DenseTensor {
    let backend = DenseBackend::new();
    let a = DenseTensor::random(rng, &[n, n]);
    a.add(&backend.adjoint(&a).unwrap())
        .unwrap()
        .scale(Complex64::new(0.5, 0.0))
}

#[test]
fn test_eigh_reconstructs_matrix() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let h = random_hermitian(&mut rng, 5);

    let eig = backend.eigh(&h).unwrap();
    assert!(eig.eigenvalues.windows(2).all(|w| w[0] <= w[1]));

    let v = &eig.eigenvectors;
    let mut lambda = DenseTensor::zeros(&[5, 5]).into_vec();
    for (i, &l) in eig.eigenvalues.iter().enumerate() {
        lambda[i * 5 + i] = Complex64::new(l, 0.0);
    }
    let lambda = DenseTensor::from_vec_with_shape(lambda, &[5, 5]).unwrap();
    let rebuilt = backend
        .matmul(
            &backend.matmul(v, &lambda).unwrap(),
            &backend.adjoint(v).unwrap(),
        )
        .unwrap();
    assert_tensors_close(&rebuilt, &h, 1e-10);
}

#[test]
fn test_expm_of_hermitian_matches_eigenvalue_exponentials() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let h = random_hermitian(&mut rng, 4);

    let eigenvalues = backend.eigvalsh(&h).unwrap();
    let expected: Complex64 = eigenvalues
        .iter()
        .map(|l| Complex64::new(l.exp(), 0.0))
        .sum();
    let tr = backend.trace(&backend.expm(&h).unwrap()).unwrap();
    assert_abs_diff_eq!(tr.re, expected.re, epsilon = 1e-9);
    assert_abs_diff_eq!(tr.im, 0.0, epsilon = 1e-9);
}

#[test]
fn test_sqrtmh_of_positive_matrix() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let a = DenseTensor::random(&mut rng, &[3, 3]);
    let p = backend.matmul(&a, &backend.adjoint(&a).unwrap()).unwrap();

    let root = backend.sqrtmh(&p).unwrap();
    assert_tensors_close(&backend.matmul(&root, &root).unwrap(), &p, 1e-9);
    assert_tensors_close(&backend.adjoint(&root).unwrap(), &root, 1e-10);
}

#[test]
fn test_kron_with_identity_is_block_diagonal() {
    let backend = DenseBackend::new();
    let a = DenseTensor::from_real(&[1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
    let k = backend.kron(&DenseTensor::identity(2), &a).unwrap();
    assert_eq!(k.dims(), vec![4, 4]);
    for i in 0..2 {
        for j in 0..2 {
            assert_eq!(k.get(&[i, j]).unwrap(), a.get(&[i, j]).unwrap());
            assert_eq!(k.get(&[i + 2, j + 2]).unwrap(), a.get(&[i, j]).unwrap());
            assert_eq!(k.get(&[i, j + 2]).unwrap(), Complex64::new(0.0, 0.0));
        }
    }
}

#[test]
fn test_contract_matches_matmul() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let a = DenseTensor::random(&mut rng, &[3, 4]);
    let b = DenseTensor::random(&mut rng, &[4, 2]);
    let contracted = a.contract(&[1], &b, &[0]).unwrap();
    assert_tensors_close(&contracted, &backend.matmul(&a, &b).unwrap(), 1e-12);

    // contracting the leading axis of `a` is a^T b
    let c = DenseTensor::random(&mut rng, &[3, 2]);
    let at_c = a.contract(&[0], &c, &[0]).unwrap();
    let expected = backend
        .matmul(&a.permute(&[1, 0]).unwrap(), &c)
        .unwrap();
    assert_tensors_close(&at_c, &expected, 1e-12);
}

#[test]
fn test_matrix_operations_reject_other_ranks() {
    let backend = DenseBackend::new();
    let v = DenseTensor::zeros(&[4]);
    assert!(matches!(
        backend.trace(&v),
        Err(BackendError::NotAMatrix { .. })
    ));
    assert!(matches!(
        backend.eigh(&DenseTensor::zeros(&[2, 3])),
        Err(BackendError::NonSquare { rows: 2, cols: 3 })
    ));
}

#[test]
fn test_sampling_pipeline() {
    let backend = DenseBackend::new();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let draws = backend
        .implicit_random_choice(&mut rng, 500, &[0.0, 0.25, 0.0, 0.75])
        .unwrap();
    assert_eq!(draws.len(), 500);

    let (values, counts) = backend.unique_with_counts(&draws);
    assert!(values.iter().all(|&v| v == 1 || v == 3));
    assert_eq!(counts.iter().sum::<usize>(), 500);

    let dense = backend.scatter(4, &values, &counts).unwrap();
    assert_eq!(dense[0] + dense[2], 0);
    assert_eq!(dense[1] + dense[3], 500);
    assert!(backend.scatter(2, &[3], &[1]).is_err());
}
