use faer::{Mat, MatMut, MatRef};
use faer_core::{mul::matmul, Parallelism};
use ode_solvers::{dopri5::Dopri5, DVector, System};

use crate::{
    driver::SimError,
    method::{check_sample_times, Method, Snapshots},
    operator::Operator,
    Ctx, Float,
};

pub const DEFAULT_RTOL: Float = 1e-6;
pub const DEFAULT_ATOL: Float = 1e-9;

type State = DVector<Float>;

// y ↦ -A y, the right-hand side handed to the solver
struct LinearRhs<'a> {
    operator: MatRef<'a, Float>,
}

impl System<Float, State> for LinearRhs<'_> {
    fn system(&self, _t: Float, y: &State, dy: &mut State) {
        let n = y.len();
        let u = MatRef::<Float>::from_column_major_slice(y.as_slice(), n, 1);
        let v = MatMut::<Float>::from_column_major_slice(dy.as_mut_slice(), n, 1);
        matmul(v, self.operator, u, None, -1.0, Parallelism::None);
    }
}

/// Dormand–Prince 5(4) embedded Runge–Kutta pair with adaptive steps and
/// local error control, delegated to `ode_solvers`.
///
/// The solver is restarted on every interval between two sample times so
/// that each snapshot lands exactly on its requested time.
#[derive(Debug, Clone)]
pub struct AdaptiveRk {
    rtol: Float,
    atol: Float,
}

impl Default for AdaptiveRk {
    fn default() -> Self {
        Self {
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
        }
    }
}

impl AdaptiveRk {
    pub fn new(rtol: Float, atol: Float) -> Self {
        Self { rtol, atol }
    }

    pub fn rtol(&self) -> Float {
        self.rtol
    }

    pub fn atol(&self) -> Float {
        self.atol
    }

    /// States at each of `times`, starting from `u0` at `times[0]`, which
    /// is stored verbatim.
    pub fn solve(
        &self,
        operator: &Operator,
        u0: MatRef<'_, Float>,
        times: &[Float],
    ) -> Result<Snapshots, SimError> {
        check_sample_times(times)?;
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return Err(SimError::InvalidParameters(format!(
                "solver tolerances must be positive, got rtol={} atol={}",
                self.rtol, self.atol
            )));
        }

        let n = u0.nrows();
        let mut snapshots = Snapshots::new(n, times.to_vec());
        snapshots.set(0, u0);

        let mut y = State::from_fn(n, |i, _| u0.read(i, 0));
        for (k, w) in times.windows(2).enumerate() {
            let span = w[1] - w[0];
            if span > 0.0 {
                y = self.segment(operator, y, w[0], span)?;
            }
            let u = Mat::<Float>::from_fn(n, 1, |i, _| y[i]);
            snapshots.set(k + 1, u.as_ref());
        }
        Ok(snapshots)
    }

    // The system is autonomous, so every segment runs on the local
    // interval [0, span]. The dense output step equals the span: the
    // solver emits the states at 0 and at span only.
    fn segment(
        &self,
        operator: &Operator,
        y: State,
        start: Float,
        span: Float,
    ) -> Result<State, SimError> {
        let rhs = LinearRhs {
            operator: operator.matrix(),
        };
        let mut stepper = Dopri5::new(rhs, 0.0, span, span, y, self.rtol, self.atol);
        let stats = stepper.integrate().map_err(|e| SimError::Solver {
            time: start,
            reason: e.to_string(),
        })?;
        tracing::event!(
            tracing::Level::DEBUG,
            "segment [{start}, {}]: {stats}",
            start + span
        );

        match (stepper.x_out().last(), stepper.y_out().last()) {
            (Some(&t), Some(y)) if (t - span).abs() <= 1e-9 * span => Ok(y.clone()),
            (t, _) => Err(SimError::Solver {
                time: start,
                reason: format!(
                    "no output at the end of the interval (last output at {:?})",
                    t.map(|t| start + t)
                ),
            }),
        }
    }
}

impl Method for AdaptiveRk {
    fn integrate(&mut self, ctx: Ctx<'_>, u0: MatRef<'_, Float>) -> Result<Snapshots, SimError> {
        self.solve(ctx.operator, u0, &ctx.mesh.sample_times())
    }

    fn name(&self) -> &'static str {
        "Dormand-Prince 5(4)"
    }
}
