use crate::error::{RbcError, Result};

/// Carried state of the geometric recurrence `w_{i+1} = w_i * phi`.
#[derive(Debug, Clone, Copy)]
struct Recurrence {
    phi: f64,
    next: f64,
}

/// Rank-biased weights `(1 - phi) * phi^i`, indexed by zero-based rank.
///
/// The table only ever grows. Values already computed are never touched
/// again, and the multiplier is carried between calls, so a table built in
/// several steps is bit-identical to one built in a single step.
#[derive(Debug, Default, Clone)]
pub struct WeightSchedule {
    weights: Vec<f64>,
    recurrence: Option<Recurrence>,
}

impl WeightSchedule {
    pub fn new() -> Self { Self::default() }

    /// Grow the table to `new_len` entries. No-op when it is already that deep.
    pub fn extend(&mut self, phi: f64, new_len: usize) -> Result<()> {
        if !(phi > 0.0 && phi < 1.0) {
            return Err(RbcError::InvalidPhi(phi));
        }
        if let Some(r) = self.recurrence {
            if r.phi.to_bits() != phi.to_bits() {
                return Err(RbcError::PhiMismatch { fixed: r.phi, given: phi });
            }
        }
        if new_len <= self.weights.len() {
            return Ok(());
        }

        let mut r = self.recurrence.unwrap_or(Recurrence { phi, next: 1.0 - phi });
        self.weights.try_reserve_exact(new_len - self.weights.len())?;
        let prev = self.weights.len();
        for _ in prev..new_len {
            self.weights.push(r.next);
            r.next *= r.phi;
        }
        self.recurrence = Some(r);
        tracing::debug!(from = prev, to = new_len, phi, "extended weight table");
        Ok(())
    }

    pub fn weight_at(&self, rank: usize) -> Result<f64> {
        self.get(rank).ok_or(RbcError::OutOfRange { rank, len: self.weights.len() })
    }

    #[inline]
    pub fn get(&self, rank: usize) -> Option<f64> { self.weights.get(rank).copied() }

    pub fn len(&self) -> usize { self.weights.len() }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }

    /// Persistence fixed by the first growing call, if any.
    pub fn phi(&self) -> Option<f64> { self.recurrence.map(|r| r.phi) }

    pub fn as_slice(&self) -> &[f64] { &self.weights }
}
