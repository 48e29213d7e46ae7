mod adaptive;

pub use adaptive::{AdaptiveRk, DEFAULT_ATOL, DEFAULT_RTOL};

use faer::{Mat, MatRef};

use crate::{
    driver::SimError,
    method::{check_sample_times, Method, Snapshots},
    operator::Operator,
    problem::Coefficients,
    Ctx, Float,
};

/// Largest explicit Euler step keeping `dt · max(|C|/dx, D/dx²)` at
/// `fraction`.
///
/// Without convection and diffusion the reaction rate bounds the step
/// instead, and a zero operator gets an infinite step.
pub fn stable_time_step(coefficients: &Coefficients, delta: Float, fraction: Float) -> Float {
    let convection = coefficients.convection.abs() / delta;
    let diffusion = coefficients.diffusion.abs() / (delta * delta);
    let rate = match convection.max(diffusion) {
        rate if rate > 0.0 => rate,
        _ => coefficients.reaction.abs(),
    };
    fraction / rate
}

/// First-order explicit Euler with a fixed step, `u ← u - dt A u`.
///
/// Conditionally stable: the step comes from [`stable_time_step`] unless
/// set explicitly, and nothing detects a blow-up.
#[derive(Debug, Clone)]
pub struct ForwardEuler {
    stability_fraction: Float,
    time_step: Option<Float>,
}

impl Default for ForwardEuler {
    fn default() -> Self {
        Self {
            stability_fraction: 0.1,
            time_step: None,
        }
    }
}

impl ForwardEuler {
    pub fn with_stability_fraction(mut self, fraction: Float) -> Self {
        self.stability_fraction = fraction;
        self
    }

    pub fn with_time_step(mut self, time_step: Float) -> Self {
        self.time_step = Some(time_step);
        self
    }

    pub fn stability_fraction(&self) -> Float {
        self.stability_fraction
    }

    pub fn time_step(&self) -> Option<Float> {
        self.time_step
    }

    /// Advances `u` by `duration` with steps of `time_step`. The last step
    /// is shortened to land on `duration`. Only the final state is kept.
    pub fn advance(
        operator: &Operator,
        time_step: Float,
        u: MatRef<'_, Float>,
        duration: Float,
    ) -> Mat<Float> {
        let mut u = u.to_owned();
        let mut v = u.clone();

        let mut remaining = duration;
        let mut steps = 0usize;
        // the threshold avoids a last step made of rounding dust
        while remaining > time_step * 1e-9 {
            let dt = time_step.min(remaining);
            operator.euler_step_to(dt, u.as_ref(), v.as_mut());
            std::mem::swap(&mut u, &mut v);
            remaining -= dt;
            steps += 1;
        }

        tracing::event!(
            tracing::Level::TRACE,
            "advanced {duration} in {steps} Euler steps"
        );
        u
    }

    /// States at each of `times`, starting from `u0` at `times[0]`.
    pub fn solve(
        &self,
        operator: &Operator,
        time_step: Float,
        u0: MatRef<'_, Float>,
        times: &[Float],
    ) -> Result<Snapshots, SimError> {
        check_sample_times(times)?;
        if !(time_step > 0.0) {
            return Err(SimError::InvalidParameters(format!(
                "Euler time step must be positive, got {time_step}"
            )));
        }

        let mut snapshots = Snapshots::new(u0.nrows(), times.to_vec());
        snapshots.set(0, u0);

        let mut u = u0.to_owned();
        for (n, w) in times.windows(2).enumerate() {
            u = Self::advance(operator, time_step, u.as_ref(), w[1] - w[0]);
            snapshots.set(n + 1, u.as_ref());
        }
        Ok(snapshots)
    }
}

impl Method for ForwardEuler {
    fn init(&mut self, ctx: Ctx<'_>) {
        if self.time_step.is_none() {
            let dt = stable_time_step(
                ctx.problem.coefficients(),
                ctx.mesh.space().delta(),
                self.stability_fraction,
            );
            tracing::event!(
                tracing::Level::DEBUG,
                "Euler step Δt={dt:e} (stability fraction {})",
                self.stability_fraction
            );
            self.time_step = Some(dt);
        }
    }

    fn integrate(&mut self, ctx: Ctx<'_>, u0: MatRef<'_, Float>) -> Result<Snapshots, SimError> {
        if self.time_step.is_none() {
            self.init(ctx);
        }
        // only a zero operator gets no finite step
        let time_step = self.time_step.unwrap_or(Float::INFINITY);
        self.solve(ctx.operator, time_step, u0, &ctx.mesh.sample_times())
    }

    fn name(&self) -> &'static str {
        "Forward Euler"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faer_add;
    use approx::assert_abs_diff_eq;

    #[test]
    fn step_follows_dominant_rate() {
        let dx = 30.0 / 256.0;
        let dt = stable_time_step(&Coefficients::new(10.0, 0.5, -1.0), dx, 0.1);
        // C / dx ≈ 85.3 dominates D / dx² ≈ 36.4
        assert_abs_diff_eq!(dt, 0.1 * dx / 10.0, epsilon = 1e-15);

        let dt = stable_time_step(&Coefficients::new(0.0, 2.0, 0.0), 0.5, 0.1);
        assert_abs_diff_eq!(dt, 0.1 * 0.25 / 2.0, epsilon = 1e-15);

        let dt = stable_time_step(&Coefficients::new(0.0, 0.0, -4.0), 0.5, 0.1);
        assert_abs_diff_eq!(dt, 0.025, epsilon = 1e-15);
    }

    #[test]
    fn last_step_is_truncated() {
        // pure reaction: every node follows u' = S u with Euler factors (1 + S dt)
        let op = Operator::assemble(4, 1.0, &Coefficients::new(0.0, 0.0, -1.0));
        let u0 = faer_add::column_from_slice(&[1.0; 4]);
        let u = ForwardEuler::advance(&op, 0.3, u0.as_ref(), 1.0);
        let expected = 0.7_f64.powi(3) * 0.9;
        for i in 0..4 {
            assert_abs_diff_eq!(u.read(i, 0), expected, epsilon = 1e-14);
        }
    }

    #[test]
    fn zero_duration_keeps_state() {
        let op = Operator::assemble(4, 1.0, &Coefficients::new(1.0, 1.0, -1.0));
        let u0 = faer_add::column_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        let u = ForwardEuler::advance(&op, 0.1, u0.as_ref(), 0.0);
        assert_eq!(faer_add::column_to_vec(u.as_ref()), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn solve_rejects_bad_step() {
        let op = Operator::assemble(4, 1.0, &Coefficients::new(1.0, 1.0, -1.0));
        let u0 = faer_add::column_from_slice(&[1.0; 4]);
        let euler = ForwardEuler::default();
        assert!(euler.solve(&op, 0.0, u0.as_ref(), &[0.0, 1.0]).is_err());
        assert!(euler.solve(&op, 0.1, u0.as_ref(), &[1.0, 0.0]).is_err());
    }
}
