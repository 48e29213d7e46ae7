use std::f64::consts::PI;

use convdiff::{
    methods, Coefficients, Domain, Driver, ErrorTracker, FourierModes, Logger, Method, Problem,
    Simulation,
};

fn report<M: Method>(sim: Simulation<M>) -> Result<(), convdiff::SimError> {
    let mut errors = ErrorTracker::new();
    let name = sim.method().name();
    Driver::new(sim)
        .with_observer(Logger)
        .with_observer(&mut errors)
        .run()?;

    for (t, e) in errors.errors() {
        println!("{name:>20} t={t:.2}: max {:.3e}, L2 {:.3e}", e.max, e.l2);
    }
    Ok(())
}

fn main() -> Result<(), convdiff::SimError> {
    tracing_subscriber::fmt::init();

    let problem = Problem::new(
        "fourier_modes",
        Coefficients::new(4.0, 1.0, -0.2),
        Domain::centered(2.0 * PI, 1.0),
        FourierModes::default(),
    );

    let sim = Simulation::new(problem)
        .with_grid_exponent(8)
        .with_samples(11);

    report(sim.clone().using(methods::ForwardEuler::default()))?;
    report(sim)
}
