use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use phasefield_post::prelude::*;

fn field(x: &[f64; 2], c: usize) -> f64 {
    match c {
        0 => 0.01 * x[0] * x[1],
        1 => -0.02 * x[1],
        _ => 1.0 - (-8.0 * (x[1] - 0.5).abs()).exp(),
    }
}

fn bench_postprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("postprocess");
    let elastic = ElasticParameters::new(1.5, 0.75);

    for &n in &[16usize, 64] {
        let builder = BoxMeshBuilder::<2>::new([n, n]);
        let mesh = builder.build(0).expect("mesh");
        let dofs = DofHandler::<2>::phase_field(builder.n_vertices(), DofLayout::Blocked);
        let u = interpolate(&dofs, &mesh, field).expect("field");
        let lines: Vec<f64> = (0..=8).map(|k| k as f64 / 8.0).collect();
        let cod = CodSettings::new(0, lines);
        let points: Vec<[f64; 2]> = (0..32).map(|k| [k as f64 / 31.0, 0.5]).collect();

        group.bench_with_input(BenchmarkId::new("boundary_load", n), &n, |b, _| {
            let integrator = BoundaryLoadIntegrator::new(&NoComm);
            b.iter(|| black_box(integrator.compute(&mesh, &dofs, &u, &elastic, 3).expect("load")))
        });
        group.bench_with_input(BenchmarkId::new("crack_opening", n), &n, |b, _| {
            let sampler = CrackOpeningProfileSampler::new(&NoComm);
            b.iter(|| black_box(sampler.compute(&mesh, &dofs, &u, &cod).expect("cod")))
        });
        group.bench_with_input(BenchmarkId::new("nearest_vertex", n), &n, |b, _| {
            let sampler = NearestVertexSampler::new(&NoComm);
            b.iter(|| black_box(sampler.sample(&mesh, &dofs, &u, 2, &points).expect("values")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_postprocess);
criterion_main!(benches);
