//! Two equal masses on a circular orbit, integrated for a few periods.
//!
//! Run with `RUST_LOG=info cargo run --example two_body [params.yaml]`.
//! The optional YAML file may set `G`, `softening`, `dt`, `theta` and `useApproximate`.

use std::{env, f64::consts::PI, fs};

use anyhow::Context;
use galaxy_nbody::{BodySet, Simulation, SimulationParameters};
use nalgebra::Vector3;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let params = match env::args().nth(1) {
        Some(path) => {
            let yaml = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            serde_yaml::from_str(&yaml).with_context(|| format!("parsing {path}"))?
        }
        None => SimulationParameters::default().with_softening(0.),
    };
    log::info!("parameters: {params:?}");

    // separation 1, total mass 2
    let v = (params.g / 2.).sqrt();
    let bodies = BodySet::new(
        vec![1., 1.],
        vec![Vector3::new(-0.5, 0., 0.), Vector3::new(0.5, 0., 0.)],
        vec![Vector3::new(0., -v, 0.), Vector3::new(0., v, 0.)],
    )?;

    let period = 2. * PI * 0.5 / v;
    let steps_per_period = (period / params.dt).round() as usize;
    let num_periods = 3;

    let mut simulation = Simulation::new(bodies, params)?;
    let reports = simulation.simulate(num_periods * steps_per_period, steps_per_period)?;

    for report in &reports {
        println!(
            "step {:>7}: E = {:.9}, drift = {:.3e}, L_z = {:.9}",
            report.step,
            report.diagnostics.total_energy,
            report.energy_drift,
            report.diagnostics.angular_momentum.z
        );
    }

    let positions = simulation.bodies().positions();
    println!(
        "after {num_periods} periods: {:?} {:?}",
        positions[0].as_slice(),
        positions[1].as_slice()
    );

    Ok(())
}
