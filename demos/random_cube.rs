//! Compare direct summation and Barnes-Hut on random bodies in a cube:
//! time per force evaluation and relative force error for a few opening angles.
//!
//! Run with `cargo run --release --features randomization,rayon --example random_cube [n]`.

use std::{env, time::Instant};

use galaxy_nbody::{
    random_cube, BarnesHut, BodySet, DirectSummation, ForceEvaluator, PotentialEstimate,
    Simulation, SimulationParameters,
};
use nalgebra::Vector3;

fn timed(
    evaluator: &mut impl ForceEvaluator,
    bodies: &BodySet,
    params: &SimulationParameters,
) -> anyhow::Result<(Vec<Vector3<f64>>, f64)> {
    let mut forces = vec![Vector3::zeros(); bodies.len()];
    let start = Instant::now();
    evaluator.calculate_forces(bodies, &mut forces, params)?;
    Ok((forces, start.elapsed().as_secs_f64()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let n = match env::args().nth(1) {
        Some(n) => n.parse()?,
        None => 2_000,
    };
    let bodies = random_cube(n, 10., 0)?;
    let params = SimulationParameters::default();

    let (exact, direct_time) = timed(&mut DirectSummation::new(), &bodies, &params)?;
    println!("{n} bodies");
    println!("direct summation: {:.4} s", direct_time);

    for theta in [0.3, 0.5, 0.7, 1.0] {
        let params = params.with_theta(theta);
        let (approx, bh_time) = timed(&mut BarnesHut::new(), &bodies, &params)?;

        let (mean, max) = approx
            .iter()
            .zip(&exact)
            .map(|(a, e)| (a - e).norm() / e.norm())
            .fold((0., 0f64), |(sum, max), err| (sum + err, max.max(err)));

        println!(
            "barnes-hut theta = {theta}: {bh_time:.4} s, speedup {:.1}x, mean error {:.2e}, max error {:.2e}",
            direct_time / bh_time,
            mean / n as f64,
            max
        );
    }

    // a short run to show the drift reports
    let mut simulation = Simulation::with_potential(
        bodies,
        params.with_softening(0.1),
        PotentialEstimate::Sampled { sample_size: 1_000 },
    )?
    .rayon_iter();
    for report in simulation.simulate(100, 25)? {
        println!(
            "step {:>4}: drift {:.3e}, virial {:?}, potential scale {:.2}",
            report.step,
            report.energy_drift,
            report.diagnostics.virial_ratio,
            report.diagnostics.potential_scale
        );
    }

    Ok(())
}
