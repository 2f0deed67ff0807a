//! Distributed solution vectors and their ghost-extended copies.
//!
//! A [`DistributedVector`] stores the entries this rank owns. Reading field
//! values on a cell also needs entries owned by neighbouring ranks, so every
//! read pass first builds a [`GhostedVector`] restricted to the relevant index
//! set with [`DistributedVector::to_ghosted`].

use std::collections::{BTreeMap, HashMap};

use crate::algs::communicator::Communicator;
use crate::data::dof::DofHandler;
use crate::post_error::PostError;
use crate::topology::mesh::MeshView;

/// Indexed read access to solution entries.
pub trait SolutionRead {
    /// Value at global `index`.
    fn read(&self, index: usize) -> Result<f64, PostError>;
}

/// Locally owned part of a globally indexed vector.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributedVector {
    size: usize,
    owned: BTreeMap<usize, f64>,
}

impl DistributedVector {
    /// Zero vector of global length `size` owning `owned` indices.
    pub fn zeros<I>(size: usize, owned: I) -> Result<Self, PostError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut map = BTreeMap::new();
        for index in owned {
            if index >= size {
                return Err(PostError::DofOutOfRange { index, size });
            }
            map.insert(index, 0.0);
        }
        Ok(Self { size, owned: map })
    }

    /// Global length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether `index` is owned here.
    pub fn is_owned(&self, index: usize) -> bool {
        self.owned.contains_key(&index)
    }

    /// Owned entry at `index`.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.owned.get(&index).copied()
    }

    /// Overwrite an owned entry.
    pub fn set(&mut self, index: usize, value: f64) -> Result<(), PostError> {
        match self.owned.get_mut(&index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None if index >= self.size => Err(PostError::DofOutOfRange {
                index,
                size: self.size,
            }),
            None => Err(PostError::MissingDof(index)),
        }
    }

    /// Ghost-extended copy holding `relevant` entries.
    ///
    /// Collective: every rank of `comm` must call it. Owned entries are
    /// scattered into a zero-padded global buffer which is sum-reduced; owned
    /// sets are disjoint across ranks, so every entry is the owner's value
    /// exactly.
    ///
    /// The exchange is dense: each call costs `O(size)` memory and traffic per
    /// rank regardless of how few ghosts `relevant` names, because
    /// [`Communicator`] only offers reductions. This is fine for one pass per
    /// output step; a neighbour exchange over the overlap needs point-to-point
    /// messages in the communicator first. Only the `relevant` entries are kept.
    pub fn to_ghosted<C: Communicator + ?Sized>(
        &self,
        relevant: &[usize],
        comm: &C,
    ) -> Result<GhostedVector, PostError> {
        let mut global = vec![0.0; self.size];
        for (&i, &v) in &self.owned {
            global[i] = v;
        }
        comm.allreduce_sum(&mut global);

        let mut values = HashMap::with_capacity(relevant.len());
        for &index in relevant {
            let value = *global.get(index).ok_or(PostError::DofOutOfRange {
                index,
                size: self.size,
            })?;
            values.insert(index, value);
        }
        log::trace!(
            "rank {}: ghosted vector with {} of {} entries",
            comm.rank(),
            values.len(),
            self.size
        );
        Ok(GhostedVector { values })
    }
}

impl SolutionRead for DistributedVector {
    fn read(&self, index: usize) -> Result<f64, PostError> {
        self.get(index).ok_or(PostError::MissingDof(index))
    }
}

/// Owned plus ghost entries of a distributed vector, read-only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GhostedVector {
    values: HashMap<usize, f64>,
}

impl GhostedVector {
    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no entry is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl SolutionRead for GhostedVector {
    fn read(&self, index: usize) -> Result<f64, PostError> {
        self.values
            .get(&index)
            .copied()
            .ok_or(PostError::MissingDof(index))
    }
}

/// Build the owned part of a field by evaluating `f(position, component)` at
/// every owned vertex.
pub fn interpolate<const D: usize, M, F>(
    dofs: &DofHandler<D>,
    mesh: &M,
    f: F,
) -> Result<DistributedVector, PostError>
where
    M: MeshView<D>,
    F: Fn(&[f64; D], usize) -> f64,
{
    let mut vector = DistributedVector::zeros(dofs.n_dofs(), dofs.locally_owned_dofs(mesh)?)?;
    for vertex in dofs.locally_owned_vertices(mesh) {
        let x = mesh
            .vertex_position(vertex)
            .ok_or_else(|| PostError::InvalidMesh(format!("missing position for vertex {vertex}")))?;
        for c in 0..dofs.n_components() {
            vector.set(dofs.vertex_dof_index(vertex, c)?, f(&x, c))?;
        }
    }
    Ok(vector)
}
