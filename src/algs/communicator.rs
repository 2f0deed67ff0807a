//! Thin façade over collective reductions across ranks.
//!
//! Three backends:
//! - [`NoComm`]: a single rank, reductions are identities.
//! - [`ThreadComm`]: `n` ranks as threads of one process sharing a collective
//!   group. Used to exercise partitioned runs without an MPI launcher.
//! - `MpiComm` (feature `mpi-support`): `MPI_Allreduce` on the world
//!   communicator.
//!
//! Every rank of a group must issue the same collectives in the same order
//! with buffers of the same length; there is no timeout.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Blocking collective reductions over `f64` buffers.
pub trait Communicator {
    /// Rank of the calling process within the group.
    fn rank(&self) -> usize;
    /// Number of ranks in the group.
    fn size(&self) -> usize;
    /// Element-wise global sum, in place. Every rank receives the same values.
    fn allreduce_sum(&self, buf: &mut [f64]);
    /// Element-wise global minimum, in place. Every rank receives the same values.
    fn allreduce_min(&self, buf: &mut [f64]);
}

/// Single-rank communicator for serial runs.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn allreduce_sum(&self, _buf: &mut [f64]) {}
    fn allreduce_min(&self, _buf: &mut [f64]) {}
}

/// Reduction operator of a collective call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReduceOp {
    Sum,
    Min,
}

impl ReduceOp {
    fn combine(self, acc: &mut [f64], other: &[f64]) {
        for (a, &b) in acc.iter_mut().zip(other) {
            *a = match self {
                ReduceOp::Sum => *a + b,
                ReduceOp::Min => a.min(b),
            };
        }
    }
}

// --- ThreadComm: intra-process / multi-thread ---

#[derive(Debug)]
struct GroupState {
    generation: u64,
    op: Option<ReduceOp>,
    contributions: Vec<Option<Vec<f64>>>,
    arrived: usize,
    result: Arc<Vec<f64>>,
    poisoned: bool,
}

#[derive(Debug)]
struct CollectiveGroup {
    size: usize,
    state: Mutex<GroupState>,
    ready: Condvar,
}

impl CollectiveGroup {
    fn poison(&self) {
        self.state.lock().poisoned = true;
        self.ready.notify_all();
    }
}

/// One rank of an in-process collective group.
///
/// Contributions are combined in rank order once every rank has arrived, so
/// results are bitwise reproducible regardless of thread scheduling.
#[derive(Clone, Debug)]
pub struct ThreadComm {
    rank: usize,
    group: Arc<CollectiveGroup>,
}

impl ThreadComm {
    /// Create the `size` ranks of a new group.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let group = Arc::new(CollectiveGroup {
            size,
            state: Mutex::new(GroupState {
                generation: 0,
                op: None,
                contributions: vec![None; size],
                arrived: 0,
                result: Arc::new(Vec::new()),
                poisoned: false,
            }),
            ready: Condvar::new(),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                group: Arc::clone(&group),
            })
            .collect()
    }

    /// Run `f` once per rank on its own thread and collect results by rank.
    ///
    /// A panic on one rank releases the ranks blocked in a collective, which
    /// then panic as well; the first panic is propagated to the caller.
    pub fn run<R, F>(size: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(ThreadComm) -> R + Sync,
    {
        let comms = ThreadComm::group(size);
        std::thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .map(|comm| {
                    let f = &f;
                    scope.spawn(move || {
                        let group = Arc::clone(&comm.group);
                        match panic::catch_unwind(AssertUnwindSafe(|| f(comm))) {
                            Ok(out) => out,
                            Err(payload) => {
                                group.poison();
                                panic::resume_unwind(payload)
                            }
                        }
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(out) => out,
                    Err(payload) => panic::resume_unwind(payload),
                })
                .collect()
        })
    }

    /// # Panics
    /// On a collective mismatch (different operator or buffer length across
    /// ranks) or when another rank of the group panicked.
    fn allreduce(&self, op: ReduceOp, buf: &mut [f64]) {
        let group = &self.group;
        let mut state = group.state.lock();
        if state.poisoned {
            drop(state);
            panic!("collective group poisoned by a failed rank");
        }
        match state.op {
            None => state.op = Some(op),
            Some(current) => {
                if current != op {
                    state.poisoned = true;
                    group.ready.notify_all();
                    drop(state);
                    panic!("rank {} issued {op:?} while the group is in {current:?}", self.rank);
                }
            }
        }
        state.contributions[self.rank] = Some(buf.to_vec());
        state.arrived += 1;
        let generation = state.generation;

        if state.arrived == group.size {
            let mut contributions = std::mem::replace(&mut state.contributions, vec![None; group.size]);
            let mut acc = contributions[0].take().unwrap_or_default();
            for other in contributions.iter().skip(1).flatten() {
                if other.len() != acc.len() {
                    state.poisoned = true;
                    group.ready.notify_all();
                    drop(state);
                    panic!("collective buffer lengths differ: {} vs {}", acc.len(), other.len());
                }
                op.combine(&mut acc, other);
            }
            state.result = Arc::new(acc);
            state.arrived = 0;
            state.op = None;
            state.generation += 1;
            group.ready.notify_all();
        } else {
            while state.generation == generation && !state.poisoned {
                group.ready.wait(&mut state);
            }
            if state.generation == generation {
                drop(state);
                panic!("collective group poisoned by a failed rank");
            }
        }
        let result = Arc::clone(&state.result);
        drop(state);
        buf.copy_from_slice(&result);
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.group.size
    }
    fn allreduce_sum(&self, buf: &mut [f64]) {
        self.allreduce(ReduceOp::Sum, buf);
    }
    fn allreduce_min(&self, buf: &mut [f64]) {
        self.allreduce(ReduceOp::Min, buf);
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Communicator;
    use crate::post_error::PostError;
    use mpi::collective::SystemOperation;
    use mpi::environment::Universe;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{Communicator as _, CommunicatorCollectives};

    /// World communicator; finalises MPI when dropped.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    impl MpiComm {
        /// Initialise MPI. Fails if MPI was already initialised.
        pub fn new() -> Result<Self, PostError> {
            let universe = mpi::initialize()
                .ok_or_else(|| PostError::Mpi("MPI is already initialised".into()))?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }
        fn allreduce_sum(&self, buf: &mut [f64]) {
            let local = buf.to_vec();
            self.world
                .all_reduce_into(&local[..], buf, SystemOperation::sum());
        }
        fn allreduce_min(&self, buf: &mut [f64]) {
            let local = buf.to_vec();
            self.world
                .all_reduce_into(&local[..], buf, SystemOperation::min());
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_comm_is_identity() {
        let comm = NoComm;
        let mut buf = [1.0, -2.0];
        comm.allreduce_sum(&mut buf);
        comm.allreduce_min(&mut buf);
        assert_eq!(buf, [1.0, -2.0]);
        assert_eq!((comm.rank(), comm.size()), (0, 1));
    }

    #[test]
    fn thread_group_sum_and_min() {
        let out = ThreadComm::run(3, |comm| {
            let r = comm.rank() as f64;
            let mut s = [r, 1.0];
            comm.allreduce_sum(&mut s);
            let mut m = [r + 5.0, f64::INFINITY];
            comm.allreduce_min(&mut m);
            (s, m)
        });
        for (s, m) in out {
            assert_eq!(s, [3.0, 3.0]);
            assert_eq!(m, [5.0, f64::INFINITY]);
        }
    }

    #[test]
    fn repeated_collectives_stay_in_step() {
        let out = ThreadComm::run(4, |comm| {
            (0..50)
                .map(|i| {
                    let mut b = [(comm.rank() * i) as f64];
                    comm.allreduce_sum(&mut b);
                    b[0]
                })
                .collect::<Vec<_>>()
        });
        let expected: Vec<f64> = (0..50).map(|i| (6 * i) as f64).collect();
        assert!(out.iter().all(|v| *v == expected));
    }

    #[test]
    #[should_panic]
    fn rank_panic_releases_group() {
        ThreadComm::run(2, |comm| {
            if comm.rank() == 1 {
                panic!("rank 1 fails before the collective");
            }
            let mut b = [1.0];
            comm.allreduce_sum(&mut b);
        });
    }
}
