//! Partitioning a history range into dispatchable batches.

use std::error::Error;
use std::fmt;

use crate::comm::BatchRange;

/// A contiguous, gap-free partition of a history range into batches.
///
/// Every batch except the last has the same size; the last absorbs the
/// division remainder. When the requested batch count exceeds the
/// number of histories, the plan degrades to one history per batch so
/// no batch is ever empty (an empty assignment would read as the stop
/// sentinel).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    start: u64,
    end: u64,
    batch_size: u64,
    number_of_batches: u64,
}

impl BatchPlan {
    /// Partition `[start, end)` into at most `requested_batches`
    /// batches.
    pub fn new(start: u64, end: u64, requested_batches: u64) -> Result<Self, PlanError> {
        if end <= start {
            return Err(PlanError::NoHistories);
        }
        if requested_batches == 0 {
            return Err(PlanError::NoBatches);
        }
        let total = end - start;
        let number_of_batches = requested_batches.min(total);
        let batch_size = total / number_of_batches;
        Ok(Self {
            start,
            end,
            batch_size,
            number_of_batches,
        })
    }

    /// Number of batches in the plan.
    pub fn number_of_batches(&self) -> u64 {
        self.number_of_batches
    }

    /// The `index`th batch, or `None` past the end of the plan.
    pub fn batch(&self, index: u64) -> Option<BatchRange> {
        if index >= self.number_of_batches {
            return None;
        }
        let start = self.start + index * self.batch_size;
        let end = if index + 1 == self.number_of_batches {
            self.end
        } else {
            start + self.batch_size
        };
        Some(BatchRange { start, end })
    }

    /// Iterate over every batch in dispatch order.
    pub fn batches(&self) -> impl Iterator<Item = BatchRange> + '_ {
        (0..self.number_of_batches).map_while(|i| self.batch(i))
    }
}

/// Errors building a [`BatchPlan`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanError {
    /// The history range is empty.
    NoHistories,
    /// Zero batches were requested.
    NoBatches,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHistories => write!(f, "history range is empty"),
            Self::NoBatches => write!(f, "at least one batch is required"),
        }
    }
}

impl Error for PlanError {}
