use std::fmt;

use crate::{
    mesh::{Grid, Mesh},
    method::Method,
    methods,
    problem::Problem,
};

/// Grid exponent `n` of the default `2ⁿ`-node periodic grid.
pub const DEFAULT_GRID_EXPONENT: u32 = 8;
/// Number of sample times of the default mesh, both bounds included.
pub const DEFAULT_SAMPLES: usize = 21;

#[derive(Debug, Clone)]
pub struct Simulation<M> {
    pub(crate) problem: Problem,
    pub(crate) mesh: Mesh,
    pub(crate) method: M,
}

impl Simulation<methods::AdaptiveRk> {
    pub fn new(problem: Problem) -> Self {
        let mesh = Mesh::new(
            Grid::from_steps(
                problem.domain.time.0,
                problem.domain.time.1,
                DEFAULT_SAMPLES - 1,
            ),
            Grid::from_steps(
                problem.domain.space.0,
                problem.domain.space.1,
                1 << DEFAULT_GRID_EXPONENT,
            ),
        );

        Self {
            problem,
            mesh,
            method: methods::AdaptiveRk::default(),
        }
    }
}

impl<M: Method> Simulation<M> {
    /// Uses `2^exponent` periodic nodes. Sizes the driver cannot run on
    /// are reported by [`Driver::run`](crate::Driver::run).
    pub fn with_grid_exponent(mut self, exponent: u32) -> Self {
        let size = 1usize.checked_shl(exponent).unwrap_or(0);
        self.mesh.space = self.mesh.space.with_steps(size);
        self
    }

    /// Samples the solution at `samples` equally spaced times, both ends
    /// of the time span included.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.mesh.time = self.mesh.time.with_steps(samples.saturating_sub(1));
        self
    }

    pub fn with_method<N: Method + Default>(self) -> Simulation<N> {
        self.using(N::default())
    }

    pub fn using<N: Method>(self, method: N) -> Simulation<N> {
        Simulation {
            problem: self.problem,
            mesh: self.mesh,
            method,
        }
    }

    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn method(&self) -> &M {
        &self.method
    }
}

impl<M: Method> fmt::Display for Simulation<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "simulation of `{}` problem:\n\t- `{}` method\n\t- Δx = {:e} ({} nodes)\n\t- {} samples in [{}, {}]",
            self.problem.name,
            self.method.name(),
            self.mesh.space.delta,
            self.mesh.space.steps,
            self.mesh.time.steps + 1,
            self.mesh.time.lower,
            self.mesh.time.upper,
        )
    }
}
