use phasefield_post::algs::communicator::{Communicator, NoComm, ThreadComm};
use phasefield_post::algs::reduction::{MinAccumulator, SumAccumulator};

#[test]
fn thread_group_reports_rank_and_size() {
    let out = ThreadComm::run(3, |comm| (comm.rank(), comm.size()));
    assert_eq!(out, vec![(0, 3), (1, 3), (2, 3)]);
}

#[test]
fn sum_is_identical_on_every_rank() {
    // contributions whose floating-point sum depends on the order
    let out = ThreadComm::run(4, |comm| {
        let mut acc = SumAccumulator::zeros(1);
        acc.add(0, [1e16, 1.0, -1e16, 1.0][comm.rank()]);
        acc.reduce(&comm)
    });
    for v in &out {
        assert_eq!(v, &out[0]);
    }
}

#[test]
fn min_reduction_with_infinities() {
    let out = ThreadComm::run(3, |comm| {
        let mut acc = MinAccumulator::infinite(3);
        acc.offer(comm.rank(), comm.rank() as f64 - 1.0);
        acc.reduce(&comm)
    });
    for v in out {
        assert_eq!(v, vec![-1.0, 0.0, 1.0]);
    }
}

#[test]
fn groups_are_independent() {
    let a = ThreadComm::run(2, |comm| {
        let mut b = [1.0];
        comm.allreduce_sum(&mut b);
        b[0]
    });
    let b = ThreadComm::run(5, |comm| {
        let mut b = [1.0];
        comm.allreduce_sum(&mut b);
        b[0]
    });
    assert_eq!(a, vec![2.0; 2]);
    assert_eq!(b, vec![5.0; 5]);
}

#[test]
#[should_panic]
fn mismatched_lengths_panic() {
    ThreadComm::run(2, |comm| {
        let mut b = vec![0.0; comm.rank() + 1];
        comm.allreduce_sum(&mut b);
    });
}

#[test]
fn serial_accumulators_are_local() {
    let mut acc = SumAccumulator::zeros(2);
    acc.add_all(&[1.0, 2.0]);
    assert_eq!(acc.reduce(&NoComm), vec![1.0, 2.0]);
}

#[cfg(feature = "mpi-support")]
mod mpi {
    use phasefield_post::algs::communicator::{Communicator, MpiComm};
    use phasefield_post::algs::meshgen::BoxMeshBuilder;
    use phasefield_post::data::dof::{DofHandler, DofLayout};
    use phasefield_post::data::vector::interpolate;
    use phasefield_post::physics::elasticity::ElasticParameters;
    use phasefield_post::postprocess::BoundaryLoadIntegrator;
    use serial_test::serial;

    #[test]
    #[serial]
    fn mpi_boundary_load_smoke() {
        let comm = MpiComm::new().expect("MPI init");
        let builder = BoxMeshBuilder::<2>::new([4, 2]).with_strips(comm.size());
        let mesh = builder.build(comm.rank()).expect("partition");
        let dofs = DofHandler::<2>::phase_field(builder.n_vertices(), DofLayout::Blocked);
        let u = interpolate(&dofs, &mesh, |x, c| if c == 0 { 0.01 * x[0] } else { 0.0 }).expect("field");
        let load = BoundaryLoadIntegrator::new(&comm)
            .compute(&mesh, &dofs, &u, &ElasticParameters::new(1.0, 1.0), 1)
            .expect("load");
        assert!((load[0] - 0.03).abs() < 1e-12);
    }
}
