#![allow(dead_code)]
use phasefield_post::prelude::*;

/// Lamé parameters used throughout the integration tests.
pub fn elastic() -> ElasticParameters {
    ElasticParameters::new(1.5, 0.75)
}

/// Everything one rank needs to run a postprocessing pass.
pub struct RankState<const D: usize> {
    pub mesh: MeshPartition<D>,
    pub dofs: DofHandler<D>,
    pub solution: DistributedVector,
}

/// Build `rank`'s partition of `builder` and interpolate `field` onto it.
pub fn rank_state<const D: usize, F>(
    builder: &BoxMeshBuilder<D>,
    rank: usize,
    layout: DofLayout,
    field: F,
) -> RankState<D>
where
    F: Fn(&[f64; D], usize) -> f64,
{
    let mesh = builder.build(rank).unwrap();
    let dofs = DofHandler::<D>::phase_field(builder.n_vertices(), layout);
    let solution = interpolate(&dofs, &mesh, field).unwrap();
    RankState {
        mesh,
        dofs,
        solution,
    }
}

/// Pseudo-random cell owners from a seed (splitmix64 of cell id and seed).
pub fn scrambled_owner(seed: u64, n_ranks: usize) -> impl Fn(CellId, [f64; 2]) -> usize + Sync {
    move |cell: CellId, _: [f64; 2]| {
        let mut z = (cell.get() as u64).wrapping_add(seed).wrapping_add(0x9e37_79b9_7f4a_7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        (z % n_ranks as u64) as usize
    }
}

/// Linear displacement `u = grad·x` with phase field `φ = phi0 + phi_grad·x`.
pub fn affine_field<const D: usize>(
    grad: [[f64; D]; D],
    phi0: f64,
    phi_grad: [f64; D],
) -> impl Fn(&[f64; D], usize) -> f64 + Sync {
    move |x: &[f64; D], c: usize| -> f64 {
        if c < D {
            (0..D).map(|j| grad[c][j] * x[j]).sum()
        } else {
            phi0 + (0..D).map(|j| phi_grad[j] * x[j]).sum::<f64>()
        }
    }
}

pub fn assert_close(got: f64, want: f64, tol: f64) {
    assert!(
        (got - want).abs() <= tol * (1.0 + want.abs()),
        "got {got}, want {want} (tol {tol})"
    );
}

pub fn assert_all_close(got: &[f64], want: &[f64], tol: f64) {
    assert_eq!(got.len(), want.len(), "length mismatch\n got={got:?}\nwant={want:?}");
    for (g, w) in got.iter().zip(want) {
        assert_close(*g, *w, tol);
    }
}
