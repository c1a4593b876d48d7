use approx::{assert_abs_diff_eq, assert_relative_eq};
use galaxy_nbody::{
    diagnostics, random_cube, BarnesHut, BodySet, DirectSummation, ForceEvaluator, Leapfrog,
    Octree, PotentialEstimate, Simulation, SimulationParameters,
};
use nalgebra::Vector3;

/// Two unit masses at distance 1 on a circular orbit around their common center of mass.
fn circular_orbit() -> BodySet {
    let v = 0.5f64.sqrt();
    BodySet::new(
        vec![1., 1.],
        vec![Vector3::new(-0.5, 0., 0.), Vector3::new(0.5, 0., 0.)],
        vec![Vector3::new(0., -v, 0.), Vector3::new(0., v, 0.)],
    )
    .unwrap()
}

fn forces(
    evaluator: &mut impl ForceEvaluator,
    bodies: &BodySet,
    params: &SimulationParameters,
) -> Vec<Vector3<f64>> {
    let mut forces = vec![Vector3::zeros(); bodies.len()];
    evaluator
        .calculate_forces(bodies, &mut forces, params)
        .unwrap();
    forces
}

fn mean_relative_error(approx: &[Vector3<f64>], exact: &[Vector3<f64>]) -> f64 {
    approx
        .iter()
        .zip(exact)
        .map(|(a, e)| (a - e).norm() / e.norm())
        .sum::<f64>()
        / exact.len() as f64
}

#[test]
fn newtons_third_law() {
    let params = SimulationParameters::default().with_g(0.7);
    let cube = random_cube(20, 3., 21).unwrap();

    for i in 0..cube.len() {
        for j in i + 1..cube.len() {
            let pair = BodySet::new(
                vec![cube.masses()[i], cube.masses()[j]],
                vec![cube.positions()[i], cube.positions()[j]],
                vec![Vector3::zeros(); 2],
            )
            .unwrap();

            let f = forces(&mut DirectSummation::new(), &pair, &params);
            assert_eq!(f[0], -f[1]);
        }
    }
}

#[test]
fn unit_pair_without_softening() {
    let bodies = BodySet::new(
        vec![1., 1.],
        vec![Vector3::zeros(), Vector3::new(1., 0., 0.)],
        vec![Vector3::zeros(); 2],
    )
    .unwrap();
    let params = SimulationParameters::default().with_g(1.).with_softening(0.);

    let f = forces(&mut DirectSummation::new(), &bodies, &params);

    assert_abs_diff_eq!(f[0].norm(), 1.);
    assert_abs_diff_eq!(f[1].norm(), 1.);
    assert_abs_diff_eq!(f[0], Vector3::new(1., 0., 0.));
    assert_abs_diff_eq!(f[1], Vector3::new(-1., 0., 0.));
}

#[test]
fn single_body_feels_nothing() {
    let bodies = BodySet::new(
        vec![10.],
        vec![Vector3::new(3., -1., 2.)],
        vec![Vector3::new(1., 1., 1.)],
    )
    .unwrap();
    let params = SimulationParameters::default();

    assert_eq!(
        forces(&mut DirectSummation::new(), &bodies, &params),
        [Vector3::zeros()]
    );
    assert_eq!(
        forces(&mut BarnesHut::new(), &bodies, &params),
        [Vector3::zeros()]
    );
}

#[test]
fn barnes_hut_theta_zero_reproduces_direct_on_orbit() {
    let params = SimulationParameters::default().with_softening(0.).with_theta(0.);
    let mut bodies = circular_orbit();
    let mut leapfrog = Leapfrog::new();
    let mut ds = DirectSummation::new();

    for _ in 0..10 {
        let bh = forces(&mut BarnesHut::new(), &bodies, &params);
        let direct = forces(&mut ds, &bodies, &params);
        for (b, d) in bh.iter().zip(&direct) {
            assert_relative_eq!(b, d, max_relative = 1e-14, epsilon = 1e-15);
        }
        for _ in 0..100 {
            leapfrog.step(&mut bodies, &mut ds, &params).unwrap();
        }
    }
}

#[test]
fn two_body_energy_over_one_period() {
    let params = SimulationParameters::default()
        .with_softening(0.)
        .with_dt(1e-3)
        .approximate(false);
    let period = std::f64::consts::PI * 2f64.sqrt();
    let num_steps = (period / params.dt).round() as usize;

    let mut simulation = Simulation::new(circular_orbit(), params).unwrap();
    let reports = simulation.simulate(num_steps, num_steps / 4).unwrap();

    for report in &reports {
        assert!(report.energy_drift < 1e-2, "drift {}", report.energy_drift);
        assert!(!report.diverging);
    }

    // back where it started
    let start = circular_orbit();
    for (p, p0) in simulation.bodies().positions().iter().zip(start.positions()) {
        assert_abs_diff_eq!(p, p0, epsilon = 1e-2);
    }
}

#[test]
fn long_run_conserves_angular_momentum_and_center_of_mass() {
    let bodies = random_cube(50, 1., 13).unwrap();
    let params = SimulationParameters::default()
        .with_softening(0.05)
        .with_dt(1e-3)
        .approximate(false);

    let mut simulation = Simulation::new(bodies, params).unwrap();
    let start = simulation.diagnostics();
    simulation.simulate(500, 0).unwrap();
    let end = simulation.diagnostics();

    assert_abs_diff_eq!(end.angular_momentum, start.angular_momentum, epsilon = 1e-9);

    let total_mass = simulation.bodies().total_mass();
    let momentum: Vector3<f64> = simulation
        .bodies()
        .iter()
        .map(|(m, _, v)| v * m)
        .sum();
    let expected_com = start.center_of_mass + momentum / total_mass * (500. * params.dt);
    assert_abs_diff_eq!(end.center_of_mass, expected_com, epsilon = 1e-9);
}

#[test]
fn octree_root_mass_is_total_mass() {
    for seed in 0..5 {
        let bodies = random_cube(300 + 100 * seed as usize, 50., seed).unwrap();
        let octree = Octree::build(&bodies).unwrap();
        let root = octree.node(octree.root().unwrap());

        assert_relative_eq!(root.total_mass(), bodies.total_mass(), max_relative = 1e-12);
        assert_relative_eq!(
            *root.center_of_mass(),
            diagnostics::center_of_mass(&bodies),
            max_relative = 1e-10,
            epsilon = 1e-10
        );
    }
}

#[test]
fn diagnostics_are_idempotent() {
    let bodies = random_cube(200, 10., 4).unwrap();
    let params = SimulationParameters::default();

    let first = diagnostics::snapshot(&bodies, &params, PotentialEstimate::Exact);
    let second = diagnostics::snapshot(&bodies, &params, PotentialEstimate::Exact);
    assert_eq!(first, second);
}

#[test]
fn smaller_opening_angle_is_more_accurate() {
    let bodies = random_cube(200, 1., 42).unwrap();
    let params = SimulationParameters::default();
    let direct = forces(&mut DirectSummation::new(), &bodies, &params);

    let errors: Vec<f64> = [1.2, 0.8, 0.4, 0.]
        .into_iter()
        .map(|theta| {
            let bh = forces(&mut BarnesHut::new(), &bodies, &params.with_theta(theta));
            mean_relative_error(&bh, &direct)
        })
        .collect();

    for pair in errors.windows(2) {
        assert!(pair[1] <= pair[0], "errors not decreasing: {errors:?}");
    }
    assert!(errors[3] < 1e-12);
}
