//! Closed-form solutions of `u_t + C u_x = D u_xx + S u`, used to judge
//! the numerical snapshots.

use faer::{Mat, MatRef};

use crate::{
    faer_add,
    problem::{Coefficients, FourierModes, GaussianPulse, Problem},
    Float,
};

/// Reduces a displacement to its periodic representative in `[-L/2, L/2]`.
pub fn minimum_image(d: Float, length: Float) -> Float {
    d - length * (d / length).round()
}

/// Spreading, drifting and decaying Gaussian:
///
/// `σ/√(σ² + 2Dt) · exp(-(x - μ - Ct)² / (2(σ² + 2Dt))) · exp(St)`
///
/// This is the unbounded-domain solution, the drift is only folded back
/// into the periodic domain. The cutoff of the initial pulse is ignored.
pub fn gaussian_pulse(
    pulse: &GaussianPulse,
    coefficients: &Coefficients,
    length: Float,
    x: Float,
    t: Float,
) -> Float {
    let variance = pulse.sigma * pulse.sigma + 2.0 * coefficients.diffusion * t;
    let d = minimum_image(x - pulse.center - coefficients.convection * t, length);
    pulse.sigma / variance.sqrt()
        * (-d * d / (2.0 * variance)).exp()
        * (coefficients.reaction * t).exp()
}

/// Every mode travels at speed `C` and is damped by `exp((-D k² + S) t)`.
pub fn fourier_modes(
    modes: &FourierModes,
    coefficients: &Coefficients,
    length: Float,
    x: Float,
    t: Float,
) -> Float {
    let xi = x - coefficients.convection * t;
    let damping =
        |k: Float| ((-coefficients.diffusion * k * k + coefficients.reaction) * t).exp();

    let sines: Float = modes
        .sines
        .iter()
        .map(|&m| FourierModes::wave_number(m, length))
        .map(|k| (k * xi).sin() * damping(k))
        .sum();
    let cosines: Float = modes
        .cosines
        .iter()
        .map(|&m| FourierModes::wave_number(m, length))
        .map(|k| (k * xi).cos() * damping(k))
        .sum();
    sines + cosines
}

/// Discrepancy between a numerical snapshot and the analytic solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorNorms {
    pub max: Float,
    /// Discrete L2 norm, `√(Σ e² dx)`
    pub l2: Float,
}

/// Analytic solution of a problem sampled on a fixed set of nodes.
pub struct AnalyticReference<'a> {
    problem: &'a Problem,
    positions: Mat<Float>,
    delta: Float,
}

impl<'a> AnalyticReference<'a> {
    pub fn new(problem: &'a Problem, positions: MatRef<'_, Float>) -> Self {
        let delta = problem.domain().length() / positions.nrows() as Float;
        Self {
            problem,
            positions: positions.to_owned(),
            delta,
        }
    }

    pub fn evaluate(&self, t: Float) -> Mat<Float> {
        let length = self.problem.domain().length();
        let coefficients = self.problem.coefficients();
        let profile = self.problem.profile();
        faer_add::apply_func(self.positions.as_ref(), |x| {
            profile.exact(x, t, coefficients, length)
        })
    }

    pub fn compare(&self, t: Float, numeric: MatRef<'_, Float>) -> ErrorNorms {
        let exact = self.evaluate(t);
        let mut max: Float = 0.0;
        let mut squares = 0.0;
        for i in 0..numeric.nrows() {
            let e = numeric.read(i, 0) - exact.read(i, 0);
            max = max.max(e.abs());
            squares += e * e;
        }
        ErrorNorms {
            max,
            l2: (squares * self.delta).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn minimum_image_folds_into_half_periods() {
        assert_abs_diff_eq!(minimum_image(20.0, 30.0), -10.0);
        assert_abs_diff_eq!(minimum_image(-20.0, 30.0), 10.0);
        assert_abs_diff_eq!(minimum_image(4.0, 30.0), 4.0);
    }

    #[test]
    fn pulse_matches_initial_field_at_time_zero() {
        let pulse = GaussianPulse::default();
        let coefficients = Coefficients::new(10.0, 0.5, -1.0);
        for x in [-11.0, -10.0, -9.5, -8.0] {
            let d: Float = x - pulse.center;
            assert_abs_diff_eq!(
                gaussian_pulse(&pulse, &coefficients, 30.0, x, 0.0),
                (-d * d).exp(),
                epsilon = 1e-14
            );
        }
    }

    #[test]
    fn pulse_drifts_spreads_and_decays() {
        let pulse = GaussianPulse::default();
        let coefficients = Coefficients::new(10.0, 0.5, -1.0);
        // center reaches -10 + 10 * 2 = 10, peak is 1/√(1 + 4Dt) e^{St}
        let peak = gaussian_pulse(&pulse, &coefficients, 30.0, 10.0, 2.0);
        assert_abs_diff_eq!(peak, (-2.0 as Float).exp() / 5.0_f64.sqrt(), epsilon = 1e-14);
        assert!(gaussian_pulse(&pulse, &coefficients, 30.0, 9.0, 2.0) < peak);
    }

    #[test]
    fn fourier_modes_decay_at_their_own_rate() {
        let modes = FourierModes::new(vec![1], Vec::new());
        let coefficients = Coefficients::new(0.0, 1.0, -0.2);
        let length = 2.0 * std::f64::consts::PI;
        let x = 0.5 * std::f64::consts::PI;
        let value = fourier_modes(&modes, &coefficients, length, x, 1.0);
        assert_abs_diff_eq!(value, (-1.2 as Float).exp(), epsilon = 1e-14);
    }
}
