//! Limited memory BFGS approximation of the inverse Hessian.
//!
//! The memory keeps the last m pairs (sₖ, yₖ) of steps and gradient
//! changes and applies the inverse Hessian approximation with the
//! two-loop recursion of Nocedal. The initial approximation is γI with
//! γ = ⟨s, y⟩ / ⟨y, y⟩ for the most recent pair.
//!
//! All storage is allocated once, when the memory is created; new pairs
//! overwrite the oldest ones.

use optidrive_core::{
    error::{OptimizerError, OptimizerResult},
    vector::{AsElementsMut, Vector, VectorSpace},
};

/// One memorized pair of step and gradient change.
#[derive(Debug, Clone)]
pub struct Pair {
    /// Step sₖ = xₖ₊₁ - xₖ.
    pub s: Vector,
    /// Gradient change yₖ = gₖ₊₁ - gₖ.
    pub y: Vector,
    rho: f64,
}

/// Ring buffer of the last m pairs.
#[derive(Debug, Clone)]
pub struct LbfgsMemory {
    pairs: Vec<Pair>,
    alpha: Vec<f64>,
    count: usize,
    newest: usize,
}

impl LbfgsMemory {
    /// Allocates storage for `m` pairs.
    pub fn new(space: &VectorSpace, m: usize) -> OptimizerResult<Self> {
        if m < 1 {
            return Err(OptimizerError::invalid_argument("invalid number of memorized steps"));
        }
        let pairs = (0..m)
            .map(|_| {
                Ok(Pair {
                    s: space.create_vector()?,
                    y: space.create_vector()?,
                    rho: 0.0,
                })
            })
            .collect::<OptimizerResult<Vec<_>>>()?;
        Ok(Self {
            pairs,
            alpha: vec![0.0; m],
            count: 0,
            newest: m - 1,
        })
    }

    /// Maximum number of pairs.
    pub fn capacity(&self) -> usize {
        self.pairs.len()
    }

    /// Number of pairs currently memorized.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no pair is memorized.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Forgets every pair.
    pub fn clear(&mut self) {
        self.count = 0;
    }

    /// Storage for the next pair; it only becomes part of the memory once
    /// [`commit`](Self::commit) is called.
    pub fn next_slot(&mut self) -> &mut Pair {
        let m = self.pairs.len();
        &mut self.pairs[(self.newest + 1) % m]
    }

    /// Adds the pair written in [`next_slot`](Self::next_slot), given
    /// ⟨s, y⟩ > 0.
    pub fn commit(&mut self, sy: f64) {
        let m = self.pairs.len();
        self.newest = (self.newest + 1) % m;
        self.pairs[self.newest].rho = 1.0 / sy;
        self.count = (self.count + 1).min(m);
    }

    /// Index of the k-th most recent pair.
    fn index(&self, k: usize) -> usize {
        let m = self.pairs.len();
        (self.newest + m - k) % m
    }

    /// Replaces `v` by H·v where H approximates the inverse Hessian.
    ///
    /// Does nothing when the memory is empty.
    pub fn apply(&mut self, space: &VectorSpace, v: &mut impl AsElementsMut) -> OptimizerResult<()> {
        if self.count == 0 {
            return Ok(());
        }
        // First loop (backward)
        for k in 0..self.count {
            let pair = &self.pairs[self.index(k)];
            let alpha = pair.rho * space.dot(&pair.s, &*v)?;
            space.axpy(v, -alpha, &pair.y)?;
            self.alpha[k] = alpha;
        }

        // Scale by initial Hessian approximation
        let newest = &self.pairs[self.newest];
        let yy = space.dot(&newest.y, &newest.y)?;
        space.scale(v, 1.0 / (newest.rho * yy))?;

        // Second loop (forward)
        for k in (0..self.count).rev() {
            let pair = &self.pairs[self.index(k)];
            let beta = pair.rho * space.dot(&pair.y, &*v)?;
            space.axpy(v, self.alpha[k] - beta, &pair.s)?;
        }
        Ok(())
    }
}
