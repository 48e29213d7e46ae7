use std::io::Write;

use faer::{Mat, MatRef};
use thiserror::Error;

use crate::{
    analytic::{AnalyticReference, ErrorNorms},
    archive, faer_add,
    mesh::Mesh,
    method::{Method, Snapshots},
    operator::Operator,
    problem::Problem,
    sim::Simulation,
    Ctx, Float,
};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("output error")]
    Io(#[from] std::io::Error),
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("adaptive solver failed after t={time}: {reason}")]
    Solver { time: Float, reason: String },
    #[error("malformed archive: {0}")]
    Archive(String),
}

pub struct ObsCtx<'ctx> {
    // Meta
    problem: &'ctx Problem,
    mesh: &'ctx Mesh,
    method: &'ctx dyn Method,
    grid: MatRef<'ctx, Float>,

    // Snapshot info
    iter: usize,
    time: Float,
    solution: MatRef<'ctx, Float>,
}

impl<'ctx> ObsCtx<'ctx> {
    pub fn problem(&self) -> &Problem {
        self.problem
    }

    pub fn mesh(&self) -> &Mesh {
        self.mesh
    }

    pub fn method(&self) -> &dyn Method {
        self.method
    }

    /// Positions of the periodic nodes.
    pub fn grid(&self) -> MatRef<'_, Float> {
        self.grid
    }

    /// Index of the snapshot among the sample times.
    pub fn iter(&self) -> usize {
        self.iter
    }

    pub fn time(&self) -> Float {
        self.time
    }

    pub fn solution(&self) -> MatRef<'_, Float> {
        self.solution
    }
}

#[allow(unused_variables)]
pub trait Observer {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (**self).at_startup(ctx)
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (**self).at_each_iteration(ctx)
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (**self).at_cleanup(ctx)
    }
}

/// Runs a simulation: grid, operator, integration, then hands every
/// snapshot to the observers.
pub struct Driver<'d, M> {
    pub(crate) sim: Simulation<M>,
    pub(crate) observers: Vec<Box<dyn Observer + 'd>>,
}

impl<'d, M: Method> Driver<'d, M> {
    pub fn new(sim: Simulation<M>) -> Self {
        Self {
            sim,
            observers: Vec::new(),
        }
    }

    pub fn with_observer(mut self, observer: impl Observer + 'd) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn simulation(&self) -> &Simulation<M> {
        &self.sim
    }

    pub fn run(&mut self) -> Result<Snapshots, SimError> {
        let Simulation {
            problem,
            mesh,
            method,
        } = &mut self.sim;
        let (problem, mesh) = (&*problem, &*mesh);
        mesh.check()?;

        let grid = faer_add::linspace(mesh.space.lower, mesh.size(), mesh.space.delta);
        let u0 = problem.initial_condition(mesh);
        let operator = Operator::assemble(mesh.size(), mesh.space.delta, &problem.coefficients);

        let ctx = Ctx {
            problem,
            mesh,
            operator: &operator,
        };
        method.init(ctx);

        for o in self.observers.iter_mut() {
            o.at_startup(ObsCtx {
                problem,
                mesh,
                method: &*method,
                grid: grid.as_ref(),
                iter: 0,
                time: mesh.time.lower,
                solution: u0.as_ref(),
            })?;
        }

        let snapshots = method.integrate(ctx, u0.as_ref())?;

        for (n, (time, u)) in snapshots.iter().enumerate() {
            for o in self.observers.iter_mut() {
                o.at_each_iteration(ObsCtx {
                    problem,
                    mesh,
                    method: &*method,
                    grid: grid.as_ref(),
                    iter: n,
                    time,
                    solution: u,
                })?;
            }
        }

        if let Some(n) = snapshots.len().checked_sub(1) {
            for o in self.observers.iter_mut() {
                o.at_cleanup(ObsCtx {
                    problem,
                    mesh,
                    method: &*method,
                    grid: grid.as_ref(),
                    iter: n,
                    time: snapshots.time(n),
                    solution: snapshots.state(n),
                })?;
            }
        }

        Ok(snapshots)
    }
}

pub struct Logger;

impl Observer for Logger {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        let coefficients = ctx.problem().coefficients();
        tracing::event!(
            tracing::Level::INFO,
            "start of simulation of problem `{}` (`{}` method, C={}, D={}, S={}, Δx={:e} ({} nodes), {} samples up to t={})",
            ctx.problem().name(),
            ctx.method().name(),
            coefficients.convection,
            coefficients.diffusion,
            coefficients.reaction,
            ctx.mesh().space().delta(),
            ctx.mesh().size(),
            ctx.mesh().time().steps() + 1,
            ctx.mesh().time().upper(),
        );
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        tracing::event!(
            tracing::Level::TRACE,
            "problem `{}`: snapshot {} at t={}",
            ctx.problem().name(),
            ctx.iter(),
            ctx.time()
        );
        Ok(())
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        tracing::event!(
            tracing::Level::INFO,
            "finished simulation of problem `{}`",
            ctx.problem().name()
        );
        Ok(())
    }
}

/// Streams the grid, the sample times and every snapshot into an archive.
pub struct ArchiveWriter<W> {
    output: W,
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write> Observer for ArchiveWriter<W> {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        let grid = faer_add::column_to_vec(ctx.grid());
        archive::write_header(&mut self.output, &grid, &ctx.mesh().sample_times())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        archive::write_column(&mut self.output, ctx.solution())
    }

    fn at_cleanup(&mut self, _ctx: ObsCtx) -> Result<(), SimError> {
        archive::write_footer(&mut self.output)
    }
}

/// Compares every snapshot with the analytic solution of the problem.
#[derive(Default)]
pub struct ErrorTracker {
    errors: Vec<(Float, ErrorNorms)>,
    last_exact: Option<Mat<Float>>,
}

impl ErrorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[(Float, ErrorNorms)] {
        &self.errors
    }

    /// Analytic solution at the last sample time.
    pub fn last_exact(&self) -> Option<MatRef<'_, Float>> {
        self.last_exact.as_ref().map(|m| m.as_ref())
    }

    pub fn worst(&self) -> Option<ErrorNorms> {
        self.errors
            .iter()
            .map(|&(_, e)| e)
            .reduce(|a, b| ErrorNorms {
                max: a.max.max(b.max),
                l2: a.l2.max(b.l2),
            })
    }
}

impl Observer for ErrorTracker {
    fn at_startup(&mut self, _ctx: ObsCtx) -> Result<(), SimError> {
        self.errors.clear();
        self.last_exact = None;
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        let reference = AnalyticReference::new(ctx.problem(), ctx.grid());
        let norms = reference.compare(ctx.time(), ctx.solution());
        tracing::event!(
            tracing::Level::DEBUG,
            "t={}: max error {:e}, L2 error {:e}",
            ctx.time(),
            norms.max,
            norms.l2
        );
        self.errors.push((ctx.time(), norms));
        Ok(())
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        let reference = AnalyticReference::new(ctx.problem(), ctx.grid());
        self.last_exact = Some(reference.evaluate(ctx.time()));
        Ok(())
    }
}
