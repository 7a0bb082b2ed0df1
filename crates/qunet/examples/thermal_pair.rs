//! Two-qubit transverse-field Ising pair: thermal quantities from dense and
//! network representations of the same Hamiltonian.

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use qunet::{
    double_state, entropy, fidelity, free_energy, generate_local_hamiltonian,
    gibbs_state, identity, measurement_counts, reduced_density_matrix, Complex64, Cut,
    DenseBackend, DenseTensor, MeasurementCounts, Operand, QuOperator, QuantumOutput,
};

fn main() -> Result<()> {
    let backend = DenseBackend::new();
    let beta = 0.7;

    let z = DenseTensor::from_real(&[1.0, 0.0, 0.0, -1.0], &[2, 2])?;
    let x = DenseTensor::from_real(&[0.0, 1.0, 1.0, 0.0], &[2, 2])?;

    // H = Z Z + 0.5 (X I + I X)
    let zz = generate_local_hamiltonian(&[z.clone(), z], false)?;
    let QuantumOutput::Network(mut zz) = zz else {
        anyhow::bail!("expected a network Hamiltonian");
    };
    let mut x1 = QuOperator::from_local_tensor(x.clone(), &[2, 2], &[0], None, None)?;
    let mut x2 = identity(&[2])?.tensor_product(&QuOperator::from_tensor(x, None, None)?)?;

    let field = x1
        .eval_matrix(None)?
        .add(&x2.eval_matrix(None)?)?
        .scale(Complex64::new(0.5, 0.0));
    let h = zz.eval_matrix(None)?.add(&field)?;

    let rho = gibbs_state(&backend, Operand::from(&h), beta)?;
    let s = entropy(&backend, Operand::from(&rho), None)?;
    let f = free_energy(&backend, Operand::from(&rho), Operand::from(&h), beta, None)?;
    println!("beta = {beta}: S = {s:.6}, F = {f:.6}");

    let tfd = double_state(&backend, Operand::from(&h), beta)?;
    let reduced = reduced_density_matrix(&backend, Operand::from(&tfd), &Cut::Leading(2), None)?
        .into_dense()?;
    let overlap = fidelity(&backend, Operand::from(&reduced), Operand::from(&rho))?;
    println!("fidelity(Tr_A |TFD><TFD|, rho) = {overlap:.9}");

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    if let MeasurementCounts::Dense(counts) =
        measurement_counts(&backend, &mut rng, Operand::from(&rho), 4096, false)?
    {
        for (state, count) in counts.iter().enumerate() {
            println!("|{state:02b}>: {count}");
        }
    }
    Ok(())
}
