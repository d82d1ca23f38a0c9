//! The particle bank: pending states within one history.

use smallvec::SmallVec;

use crate::particle::ParticleState;

/// A stack of particle states still requiring simulation within the
/// current history, on the current thread.
///
/// One bank is owned per worker thread and never shared, so pushes of
/// collision secondaries take no locks. Most histories produce only a
/// handful of secondaries, so the backing store keeps four states
/// inline before spilling to the heap.
///
/// Invariant: a history is complete exactly when its bank is empty.
#[derive(Debug, Default)]
pub struct ParticleBank {
    stack: SmallVec<[ParticleState; 4]>,
}

impl ParticleBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self {
            stack: SmallVec::new(),
        }
    }

    /// Push a pending state (a source sample or a collision secondary).
    ///
    /// Unbounded: a pathological collision model that always splits can
    /// grow the bank without limit. Defensive caps belong to the
    /// physics model, not the bank.
    pub fn push(&mut self, state: ParticleState) {
        self.stack.push(state);
    }

    /// The most recently pushed state, mutable, without removing it.
    ///
    /// Used to set fields (home cell, etc.) before dispatch. `None` on
    /// an empty bank.
    pub fn top_mut(&mut self) -> Option<&mut ParticleState> {
        self.stack.last_mut()
    }

    /// Remove and return the most recently pushed state.
    pub fn pop(&mut self) -> Option<ParticleState> {
        self.stack.pop()
    }

    /// Whether the bank holds no pending states.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Number of pending states.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Move all of `other`'s contents into this bank, leaving `other`
    /// empty. Not used on the hot path; consolidation/diagnostics only.
    pub fn splice(&mut self, other: &mut ParticleBank) {
        self.stack.append(&mut other.stack);
    }

    /// Iterate over the pending states mutably (bottom to top).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ParticleState> {
        self.stack.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::HistoryId;
    use crate::particle::ParticleType;

    fn state(energy: f64) -> ParticleState {
        let mut p = ParticleState::new(ParticleType::Neutron, HistoryId(0));
        p.energy = energy;
        p
    }

    #[test]
    fn lifo_order() {
        let mut bank = ParticleBank::new();
        bank.push(state(1.0));
        bank.push(state(2.0));
        bank.push(state(3.0));

        assert_eq!(bank.len(), 3);
        assert_eq!(bank.pop().unwrap().energy, 3.0);
        assert_eq!(bank.pop().unwrap().energy, 2.0);
        assert_eq!(bank.pop().unwrap().energy, 1.0);
        assert!(bank.pop().is_none());
        assert!(bank.is_empty());
    }

    #[test]
    fn top_mut_exposes_most_recent_without_removal() {
        let mut bank = ParticleBank::new();
        bank.push(state(1.0));
        bank.push(state(2.0));

        bank.top_mut().unwrap().energy = 9.0;
        assert_eq!(bank.len(), 2);
        assert_eq!(bank.pop().unwrap().energy, 9.0);
    }

    #[test]
    fn top_mut_on_empty_is_none() {
        let mut bank = ParticleBank::new();
        assert!(bank.top_mut().is_none());
    }

    #[test]
    fn splice_drains_other_bank() {
        let mut a = ParticleBank::new();
        let mut b = ParticleBank::new();
        a.push(state(1.0));
        b.push(state(2.0));
        b.push(state(3.0));

        a.splice(&mut b);
        assert_eq!(a.len(), 3);
        assert!(b.is_empty());
        // Spliced states sit above the original contents.
        assert_eq!(a.pop().unwrap().energy, 3.0);
    }

    #[test]
    fn iter_mut_visits_all_states() {
        let mut bank = ParticleBank::new();
        bank.push(state(1.0));
        bank.push(state(2.0));
        for p in bank.iter_mut() {
            p.energy *= 10.0;
        }
        assert_eq!(bank.pop().unwrap().energy, 20.0);
        assert_eq!(bank.pop().unwrap().energy, 10.0);
    }
}
