//! Run parameters

use crate::{
    archive::ARCHIVE_EXTENSION,
    driver::SimError,
    mesh::{Grid, Mesh, MAX_GRID_EXPONENT},
    methods::{AdaptiveRk, ForwardEuler},
    problem::{Coefficients, Domain, GaussianPulse, Problem},
    sim::Simulation,
    Float,
};

/// Run parameters
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Parameters {
    /// Convection speed `C`
    pub convection: Float,

    /// Diffusion coefficient `D`
    pub diffusion: Float,

    /// Reaction rate `S` (negative to decay)
    pub reaction: Float,

    /// Length `L` of the periodic domain `[-L/2, L/2)`
    pub length: Float,

    /// End of the time span `[0, T]`
    pub final_time: Float,

    /// The grid has `2^exponent` nodes, at most `2^MAX_GRID_EXPONENT`
    pub exponent: u32,

    /// Center `μ` of the initial Gaussian pulse
    pub center: Float,

    /// Number of sample times, both ends of the span included
    pub samples: usize,

    /// Forward Euler step as a fraction of the fastest explicit rate
    pub stability_fraction: Float,

    /// Relative tolerance of the adaptive solver
    pub rtol: Float,

    /// Absolute tolerance of the adaptive solver
    pub atol: Float,
}
//
impl Default for Parameters {
    fn default() -> Self {
        Self {
            convection: 10.0,
            diffusion: 0.5,
            reaction: -1.0,
            length: 30.0,
            final_time: 2.0,
            exponent: 8,
            center: -10.0,
            samples: 21,
            stability_fraction: 0.1,
            rtol: crate::methods::DEFAULT_RTOL,
            atol: crate::methods::DEFAULT_ATOL,
        }
    }
}

impl Parameters {
    pub fn validate(&self) -> Result<(), SimError> {
        let invalid = |msg: String| Err(SimError::InvalidParameters(msg));

        let finite = [
            ("convection", self.convection),
            ("diffusion", self.diffusion),
            ("reaction", self.reaction),
            ("center", self.center),
        ];
        if let Some((name, value)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("{name} must be finite, got {value}"));
        }
        if self.diffusion < 0.0 {
            return invalid(format!(
                "diffusion must be non-negative, got {}",
                self.diffusion
            ));
        }
        if !(self.length > 0.0 && self.length.is_finite()) {
            return invalid(format!("length must be positive, got {}", self.length));
        }
        if !(self.final_time >= 0.0 && self.final_time.is_finite()) {
            return invalid(format!(
                "final time must be non-negative, got {}",
                self.final_time
            ));
        }
        // the stencil needs three distinct nodes
        if !(2..=MAX_GRID_EXPONENT).contains(&self.exponent) {
            return invalid(format!(
                "grid exponent must lie in 2..={MAX_GRID_EXPONENT}, got {}",
                self.exponent
            ));
        }
        if self.samples < 2 {
            return invalid(format!(
                "at least two sample times are needed, got {}",
                self.samples
            ));
        }
        if !(self.stability_fraction > 0.0) {
            return invalid(format!(
                "stability fraction must be positive, got {}",
                self.stability_fraction
            ));
        }
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return invalid(format!(
                "solver tolerances must be positive, got rtol={} atol={}",
                self.rtol, self.atol
            ));
        }
        Ok(())
    }

    pub fn coefficients(&self) -> Coefficients {
        Coefficients::new(self.convection, self.diffusion, self.reaction)
    }

    pub fn domain(&self) -> Domain {
        Domain::centered(self.length, self.final_time)
    }

    pub fn size(&self) -> usize {
        1usize.checked_shl(self.exponent).unwrap_or(0)
    }

    pub fn mesh(&self) -> Mesh {
        let domain = self.domain();
        Mesh::new(
            Grid::from_steps(domain.time.0, domain.time.1, self.samples.saturating_sub(1)),
            Grid::from_steps(domain.space.0, domain.space.1, self.size()),
        )
    }

    /// Gaussian pulse of width `√0.5` centered at `center`.
    pub fn problem(&self) -> Problem {
        Problem::new(
            "periodic convection-diffusion-reaction",
            self.coefficients(),
            self.domain(),
            GaussianPulse::new(self.center, Float::sqrt(0.5)),
        )
    }

    pub fn adaptive(&self) -> AdaptiveRk {
        AdaptiveRk::new(self.rtol, self.atol)
    }

    pub fn forward_euler(&self) -> ForwardEuler {
        ForwardEuler::default().with_stability_fraction(self.stability_fraction)
    }

    /// Validated simulation of [`Parameters::problem`] with the adaptive
    /// solver.
    pub fn simulation(&self) -> Result<Simulation<AdaptiveRk>, SimError> {
        self.validate()?;
        Ok(Simulation::new(self.problem())
            .with_grid_exponent(self.exponent)
            .with_samples(self.samples)
            .using(self.adaptive()))
    }

    /// `1DPeriodicFiniteDifferenceC{C}D{D}S{S}L{L}nx{n}.cdra`
    pub fn output_file_name(&self) -> String {
        format!(
            "1DPeriodicFiniteDifferenceC{}D{}S{}L{}nx{}.{ARCHIVE_EXTENSION}",
            self.convection, self.diffusion, self.reaction, self.length, self.exponent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = Parameters::default();
        params.validate().unwrap();
        assert_eq!(params.size(), 256);
        assert_eq!(params.mesh().sample_times().len(), 21);
        assert_eq!(params.mesh().space().lower(), -15.0);
    }

    #[test]
    fn file_name_embeds_parameters() {
        assert_eq!(
            Parameters::default().output_file_name(),
            "1DPeriodicFiniteDifferenceC10D0.5S-1L30nx8.cdra"
        );
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            Parameters {
                diffusion: -0.1,
                ..Default::default()
            },
            Parameters {
                length: 0.0,
                ..Default::default()
            },
            Parameters {
                exponent: 1,
                ..Default::default()
            },
            Parameters {
                exponent: MAX_GRID_EXPONENT + 1,
                ..Default::default()
            },
            Parameters {
                samples: 1,
                ..Default::default()
            },
            Parameters {
                convection: Float::NAN,
                ..Default::default()
            },
            Parameters {
                atol: 0.0,
                ..Default::default()
            },
        ];
        for params in bad {
            assert!(
                matches!(params.validate(), Err(SimError::InvalidParameters(_))),
                "{params:?}"
            );
        }
    }

    #[test]
    fn simulation_matches_parameters() {
        let params = Parameters {
            exponent: 6,
            samples: 5,
            ..Default::default()
        };
        let sim = params.simulation().unwrap();
        assert_eq!(sim.mesh(), &params.mesh());
        assert_eq!(sim.method().rtol(), params.rtol);
    }
}
