mod util;

use phasefield_post::prelude::*;
use util::{assert_all_close, rank_state};

/// Constant displacement `u`, phase field `1 + g·x`.
fn field(u: [f64; 2], g: [f64; 2]) -> impl Fn(&[f64; 2], usize) -> f64 + Sync {
    move |x: &[f64; 2], c: usize| if c < 2 { u[c] } else { 1.0 + g[0] * x[0] + g[1] * x[1] }
}

fn cod(
    n_ranks: usize,
    n: usize,
    settings: &CodSettings,
    u: [f64; 2],
    g: [f64; 2],
) -> Vec<Result<Vec<f64>, PostError>> {
    let builder = BoxMeshBuilder::<2>::new([n, n]).with_strips(n_ranks);
    ThreadComm::run(n_ranks, |comm| {
        let state = rank_state(&builder, comm.rank(), DofLayout::Blocked, field(u, g));
        CrackOpeningProfileSampler::new(&comm).compute(&state.mesh, &state.dofs, &state.solution, settings)
    })
}

#[test]
fn horizontal_crack_on_unit_square() {
    let settings = CodSettings::new(0, vec![0.5]).with_tolerance(1e-7);
    for n_ranks in 1..=4 {
        for out in cod(n_ranks, 4, &settings, [0.0, 1.0], [0.0, -2.0]) {
            // interior faces of total length 1, seen from both sides: 2 · 0.5 · (-2)
            assert_all_close(&out.unwrap(), &[-2.0], 1e-12);
        }
        let once = settings.clone().with_face_policy(FaceVisitPolicy::Once);
        for out in cod(n_ranks, 4, &once, [0.0, 1.0], [0.0, -2.0]) {
            assert_all_close(&out.unwrap(), &[-1.0], 1e-12);
        }
    }
}

#[test]
fn displacement_orthogonal_to_gradient_opens_nothing() {
    let settings = CodSettings::new(0, vec![0.5]);
    for out in cod(2, 4, &settings, [1.0, 0.0], [0.0, -2.0]) {
        assert_all_close(&out.unwrap(), &[0.0], 1e-14);
    }
}

#[test]
fn boundary_lines_count_once_under_both_policies() {
    for policy in [FaceVisitPolicy::BothSides, FaceVisitPolicy::Once] {
        let settings = CodSettings::new(0, vec![0.0, 1.0]).with_face_policy(policy);
        for out in cod(3, 6, &settings, [0.0, 1.0], [0.0, -2.0]) {
            assert_all_close(&out.unwrap(), &[-1.0, -1.0], 1e-12);
        }
    }
}

#[test]
fn vertical_crack_uses_the_other_axis() {
    let settings = CodSettings::new(1, vec![0.25, 0.5, 0.6]);
    for out in cod(2, 4, &settings, [1.0, 0.0], [-2.0, 0.0]) {
        assert_all_close(&out.unwrap(), &[-2.0, -2.0, 0.0], 1e-12);
    }
}

#[test]
fn invalid_direction_fails_on_every_rank() {
    let settings = CodSettings::new(2, vec![0.5]);
    for out in cod(3, 3, &settings, [0.0, 1.0], [0.0, -2.0]) {
        assert_eq!(out, Err(PostError::InvalidDirection { direction: 2, dim: 2 }));
    }
}

#[test]
fn no_lines_yields_empty_profile() {
    for out in cod(2, 2, &CodSettings::new(0, Vec::new()), [0.0, 1.0], [0.0, -2.0]) {
        assert_eq!(out, Ok(Vec::new()));
    }
}

#[test]
fn sub_micron_box_gives_scale_free_opening() {
    let side = 1e-7;
    let builder = BoxMeshBuilder::<2>::new([4, 4])
        .with_bounds([0.0; 2], [side; 2])
        .with_strips(2);
    let settings = CodSettings::new(0, vec![0.5 * side]).with_tolerance(1e-3 * side);
    let out = ThreadComm::run(2, |comm| {
        let state = rank_state(&builder, comm.rank(), DofLayout::Blocked, field([0.0, 1.0], [0.0, -2.0 / side]));
        CrackOpeningProfileSampler::new(&comm).compute(&state.mesh, &state.dofs, &state.solution, &settings)
    });
    for opening in out {
        assert_all_close(&opening.unwrap(), &[-2.0], 1e-9);
    }
}
