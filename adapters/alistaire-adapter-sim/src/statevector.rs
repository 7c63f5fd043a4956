//! Statevector simulation engine.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use alistaire_hal::Counts;
use alistaire_ir::{Operation, OperationKind};
use num_complex::Complex64;
use rand::Rng;

/// Row-major 2x2 matrix acting on one slot.
type Matrix2 = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

fn pauli_x() -> Matrix2 {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn pauli_y() -> Matrix2 {
    [[ZERO, -I], [I, ZERO]]
}

fn hadamard() -> Matrix2 {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn phase(theta: f64) -> Matrix2 {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

fn rx(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new(0.0, -(theta / 2.0).sin());
    [[c, s], [s, c]]
}

fn ry(theta: f64) -> Matrix2 {
    let c = Complex64::new((theta / 2.0).cos(), 0.0);
    let s = Complex64::new((theta / 2.0).sin(), 0.0);
    [[c, -s], [s, c]]
}

fn rz(theta: f64) -> Matrix2 {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

/// Amplitudes over `num_slots` slots; bit `k` of an index is slot `k`.
pub struct Statevector {
    amplitudes: Vec<Complex64>,
    num_slots: usize,
}

impl Statevector {
    /// The all-zero state.
    pub fn new(num_slots: usize) -> Self {
        let mut amplitudes = vec![ZERO; 1 << num_slots];
        amplitudes[0] = ONE;
        Self {
            amplitudes,
            num_slots,
        }
    }

    /// Apply one operation. Targets are assumed checked against the job.
    pub fn apply(&mut self, op: &Operation) {
        let t: Vec<usize> = op.targets.iter().map(|s| s.index()).collect();
        match op.kind {
            OperationKind::I => {}
            OperationKind::X => self.apply_controlled(&[], t[0], &pauli_x()),
            OperationKind::Y => self.apply_controlled(&[], t[0], &pauli_y()),
            OperationKind::Z => self.apply_controlled(&[], t[0], &phase(PI)),
            OperationKind::H => self.apply_controlled(&[], t[0], &hadamard()),
            OperationKind::S => self.apply_controlled(&[], t[0], &phase(PI / 2.0)),
            OperationKind::Sdg => self.apply_controlled(&[], t[0], &phase(-PI / 2.0)),
            OperationKind::T => self.apply_controlled(&[], t[0], &phase(PI / 4.0)),
            OperationKind::Tdg => self.apply_controlled(&[], t[0], &phase(-PI / 4.0)),
            OperationKind::Rx(theta) => self.apply_controlled(&[], t[0], &rx(theta)),
            OperationKind::Ry(theta) => self.apply_controlled(&[], t[0], &ry(theta)),
            OperationKind::Rz(theta) => self.apply_controlled(&[], t[0], &rz(theta)),
            OperationKind::P(theta) => self.apply_controlled(&[], t[0], &phase(theta)),
            OperationKind::CX => self.apply_controlled(&t[..1], t[1], &pauli_x()),
            OperationKind::CY => self.apply_controlled(&t[..1], t[1], &pauli_y()),
            OperationKind::CZ => self.apply_controlled(&t[..1], t[1], &phase(PI)),
            OperationKind::Swap => self.apply_swap(&[], t[0], t[1]),
            OperationKind::CCX => self.apply_controlled(&t[..2], t[2], &pauli_x()),
            OperationKind::CSwap => self.apply_swap(&t[..1], t[1], t[2]),
        }
    }

    /// Apply `m` to `target` on the subspace where every control is 1.
    fn apply_controlled(&mut self, controls: &[usize], target: usize, m: &Matrix2) {
        let ctrl_mask = controls.iter().fold(0usize, |acc, &c| acc | (1 << c));
        let tgt_mask = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & ctrl_mask == ctrl_mask && i & tgt_mask == 0 {
                let j = i | tgt_mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
                self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
            }
        }
    }

    fn apply_swap(&mut self, controls: &[usize], a: usize, b: usize) {
        let ctrl_mask = controls.iter().fold(0usize, |acc, &c| acc | (1 << c));
        let (mask_a, mask_b) = (1 << a, 1 << b);
        for i in 0..self.amplitudes.len() {
            if i & ctrl_mask == ctrl_mask && i & mask_a != 0 && i & mask_b == 0 {
                let j = (i & !mask_a) | mask_b;
                self.amplitudes.swap(i, j);
            }
        }
    }

    /// Probability of each basis index.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a.norm_sqr()).collect()
    }

    /// Draw `shots` samples from the final state.
    ///
    /// Basis states with zero amplitude are never drawn.
    pub fn sample_counts<R: Rng + ?Sized>(&self, shots: u32, rng: &mut R) -> Counts {
        let mut cumulative = Vec::with_capacity(self.amplitudes.len());
        let mut acc = 0.0;
        for p in self.probabilities() {
            acc += p;
            cumulative.push(acc);
        }
        let last = cumulative.len() - 1;

        let mut hits = vec![0u64; cumulative.len()];
        for _ in 0..shots {
            let r = rng.r#gen::<f64>() * acc;
            let idx = cumulative.partition_point(|&c| c <= r).min(last);
            hits[idx] += 1;
        }

        hits.iter()
            .enumerate()
            .filter(|&(_, &n)| n > 0)
            .map(|(idx, &n)| (self.label(idx), n))
            .collect()
    }

    /// Fixed-width label for a basis index, slot 0 leftmost.
    pub fn label(&self, index: usize) -> String {
        (0..self.num_slots)
            .map(|slot| if index >> slot & 1 == 1 { '1' } else { '0' })
            .collect()
    }
}
