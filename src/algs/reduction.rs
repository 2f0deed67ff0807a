//! Rank-local accumulators that are reduced exactly once.
//!
//! An accumulator starts at the identity of its operator, collects rank-local
//! contributions and is consumed by [`SumAccumulator::reduce`] /
//! [`MinAccumulator::reduce`], which issue a single collective call for the
//! whole buffer. Consuming `self` makes a second reduction of the same partial
//! results impossible.

use crate::algs::communicator::Communicator;

/// Buffer of partial sums.
#[derive(Clone, Debug, PartialEq)]
pub struct SumAccumulator {
    values: Vec<f64>,
}

impl SumAccumulator {
    /// `len` zeros.
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    #[inline]
    pub fn add(&mut self, idx: usize, value: f64) {
        self.values[idx] += value;
    }

    /// Add `values` component-wise, starting at slot 0.
    pub fn add_all(&mut self, values: &[f64]) {
        for (acc, v) in self.values.iter_mut().zip(values) {
            *acc += v;
        }
    }

    /// Rank-local partial values.
    pub fn partial(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Global sum over all ranks of `comm`.
    pub fn reduce<C: Communicator + ?Sized>(mut self, comm: &C) -> Vec<f64> {
        comm.allreduce_sum(&mut self.values);
        self.values
    }
}

/// Buffer of partial minima, starting at `+∞`.
#[derive(Clone, Debug, PartialEq)]
pub struct MinAccumulator {
    values: Vec<f64>,
}

impl MinAccumulator {
    /// `len` slots at `+∞`.
    pub fn infinite(len: usize) -> Self {
        Self {
            values: vec![f64::INFINITY; len],
        }
    }

    /// Lower slot `idx` to `value` if smaller. Returns true if it was lowered.
    #[inline]
    pub fn offer(&mut self, idx: usize, value: f64) -> bool {
        if value < self.values[idx] {
            self.values[idx] = value;
            true
        } else {
            false
        }
    }

    /// Overwrite slot `idx`.
    #[inline]
    pub fn set(&mut self, idx: usize, value: f64) {
        self.values[idx] = value;
    }

    pub fn partial(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Global minimum over all ranks of `comm`.
    pub fn reduce<C: Communicator + ?Sized>(mut self, comm: &C) -> Vec<f64> {
        comm.allreduce_min(&mut self.values);
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::{NoComm, ThreadComm};

    #[test]
    fn serial_reduce_returns_partials() {
        let mut acc = SumAccumulator::zeros(2);
        acc.add(0, 1.5);
        acc.add_all(&[0.5, 2.0]);
        assert_eq!(acc.partial(), &[2.0, 2.0]);
        assert_eq!(acc.reduce(&NoComm), vec![2.0, 2.0]);

        let mut min = MinAccumulator::infinite(2);
        assert!(min.offer(1, 3.0));
        assert!(!min.offer(1, 4.0));
        assert_eq!(min.reduce(&NoComm), vec![f64::INFINITY, 3.0]);
    }

    #[test]
    fn infinities_are_discarded_by_min() {
        let out = ThreadComm::run(3, |comm| {
            let mut acc = MinAccumulator::infinite(1);
            if comm.rank() == 2 {
                acc.set(0, 7.0);
            }
            acc.reduce(&comm)
        });
        assert!(out.iter().all(|v| v == &vec![7.0]));
    }

    #[test]
    fn sums_across_ranks() {
        let out = ThreadComm::run(2, |comm| {
            let mut acc = SumAccumulator::zeros(3);
            acc.add(comm.rank(), 1.0);
            acc.reduce(&comm)
        });
        assert_eq!(out[0], vec![1.0, 1.0, 0.0]);
        assert_eq!(out[0], out[1]);
    }
}
