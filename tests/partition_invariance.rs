mod util;

use phasefield_post::prelude::*;
use proptest::prelude::*;
use util::{assert_all_close, elastic, rank_state, scrambled_owner};

/// Smooth nonlinear displacement with a phase field that varies across y.
fn field(x: &[f64; 2], c: usize) -> f64 {
    match c {
        0 => 0.1 * x[0] * x[1] + 0.05 * x[0] * x[0],
        1 => 0.2 * (x[0] + 1.0).ln() - 0.1 * x[1] * x[1],
        _ => 1.0 - (-4.0 * (x[1] - 0.5).abs()).exp(),
    }
}

fn run_all(builder: &BoxMeshBuilder<2>, config: &PostprocessConfig) -> Vec<PostprocessReport> {
    ThreadComm::run(builder.n_ranks(), |comm| {
        let state = rank_state(builder, comm.rank(), DofLayout::Blocked, field);
        Postprocessor::new(&comm)
            .run(config, &state.mesh, &state.dofs, &state.solution)
            .unwrap()
    })
}

fn assert_reports_close(got: &PostprocessReport, want: &PostprocessReport) {
    assert_eq!(got.boundary_loads.len(), want.boundary_loads.len());
    for ((gid, g), (wid, w)) in got.boundary_loads.iter().zip(&want.boundary_loads) {
        assert_eq!(gid, wid);
        assert_all_close(g, w, 1e-11);
    }
    assert_all_close(&got.crack_opening, &want.crack_opening, 1e-11);
    assert_eq!(got.point_values, want.point_values);
}

fn config(ny: usize, points: &[(f64, f64)]) -> PostprocessConfig {
    let mut cfg = PostprocessConfig::new(elastic());
    cfg.load_boundary_ids = vec![0, 1, 2, 3];
    let lines = (0..=ny).map(|j| j as f64 / ny as f64).collect();
    cfg.cod = Some(CodSettings::new(0, lines).with_tolerance(1e-9));
    cfg.sample_points = points.iter().map(|&(x, y)| vec![x, y]).collect();
    cfg.sample_component = 2;
    cfg
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]
    #[test]
    fn quantities_do_not_depend_on_partitioning(
        n_ranks in 1usize..=4,
        nx in 2usize..6,
        ny in 2usize..6,
        seed in any::<u64>(),
        points in prop::collection::vec((0.0f64..1.0, 0.0f64..1.0), 1..5),
        half_steps in prop::collection::vec((0usize..24, 0usize..24), 0..6),
    ) {
        // multiples of half a cell width land on vertices, edge midpoints and cell centres
        let mut points = points;
        points.extend(half_steps.iter().map(|&(i, j)| {
            ((i % (2 * nx + 3)) as f64 / (2 * nx) as f64, (j % (2 * ny + 3)) as f64 / (2 * ny) as f64)
        }));
        let cfg = config(ny, &points);
        let serial = run_all(&BoxMeshBuilder::<2>::new([nx, ny]), &cfg);

        let strips = BoxMeshBuilder::<2>::new([nx, ny]).with_strips(n_ranks);
        let scrambled = BoxMeshBuilder::<2>::new([nx, ny])
            .with_owner_fn(n_ranks, scrambled_owner(seed, n_ranks))
            .unwrap();
        for builder in [strips, scrambled] {
            let reports = run_all(&builder, &cfg);
            prop_assert_eq!(reports.len(), n_ranks);
            for report in &reports {
                assert_reports_close(report, &serial[0]);
                prop_assert_eq!(report, &reports[0]);
            }
        }
    }
}

#[test]
fn serial_and_thread_group_of_one_agree() {
    let builder = BoxMeshBuilder::<2>::new([3, 4]);
    let cfg = config(4, &[(0.2, 0.7)]);
    let state = rank_state(&builder, 0, DofLayout::Blocked, field);
    let serial = Postprocessor::new(&NoComm)
        .run(&cfg, &state.mesh, &state.dofs, &state.solution)
        .unwrap();
    assert_eq!(run_all(&builder, &cfg)[0], serial);
    assert_eq!(serial.crack_opening.len(), 5);
    assert_eq!(serial.boundary_loads.len(), 4);
}
