//! Finite-difference solver for `u_t + C u_x = D u_xx + S u` on a periodic
//! 1D domain.
//!
//! Runnable programs live in `demos/` and are declared as cargo examples,
//! so `cargo run --example convection_diffusion` works as usual.

pub mod analytic;
pub mod archive;
pub mod driver;
pub mod faer_add;
pub mod mesh;
pub mod method;
pub mod methods;
pub mod operator;
pub mod parameters;
pub mod problem;
pub mod sim;

pub use analytic::{AnalyticReference, ErrorNorms};
pub use archive::Archive;
pub use driver::{ArchiveWriter, Driver, ErrorTracker, Logger, ObsCtx, Observer, SimError};
pub use mesh::{Grid, Mesh};
pub use method::{Method, Snapshots};
pub use operator::Operator;
pub use parameters::Parameters;
pub use problem::{Coefficients, Domain, FourierModes, GaussianPulse, Problem, Profile};
pub use sim::Simulation;

/// Floating point type used for every field, grid and operator.
pub type Float = f64;

/// Everything a time integrator needs to know about the run it is part of.
#[derive(Clone, Copy)]
pub struct Ctx<'ctx> {
    pub problem: &'ctx Problem,
    pub mesh: &'ctx Mesh,
    pub operator: &'ctx Operator,
}
