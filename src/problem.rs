use core::fmt;
use std::rc::Rc;

use faer::Mat;

use crate::{analytic, mesh::Mesh, Float};

/// Constant coefficients of `u_t + C u_x = D u_xx + S u`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    /// Convection speed `C`
    pub convection: Float,
    /// Diffusion coefficient `D`
    pub diffusion: Float,
    /// Reaction rate `S`, negative values make the field decay
    pub reaction: Float,
}

impl Coefficients {
    pub fn new(convection: Float, diffusion: Float, reaction: Float) -> Self {
        Self {
            convection,
            diffusion,
            reaction,
        }
    }
}

/// An initial field together with the closed-form solution it evolves into.
pub trait Profile {
    fn name(&self) -> &'static str;

    /// Value of the initial field at `x` on a periodic domain of the given length.
    fn initial(&self, x: Float, length: Float) -> Float;

    /// Value of the continuous solution at `(x, t)`.
    fn exact(&self, x: Float, t: Float, coefficients: &Coefficients, length: Float) -> Float;
}

/// Gaussian bump `exp(-(x - center)² / (2 sigma²))`, set to zero further
/// than `cutoff` from its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianPulse {
    pub center: Float,
    pub sigma: Float,
    pub cutoff: Float,
}

impl GaussianPulse {
    pub fn new(center: Float, sigma: Float) -> Self {
        Self {
            center,
            sigma,
            cutoff: 5.0 * sigma,
        }
    }

    pub fn with_cutoff(mut self, cutoff: Float) -> Self {
        self.cutoff = cutoff;
        self
    }
}

impl Default for GaussianPulse {
    fn default() -> Self {
        Self::new(-10.0, Float::sqrt(0.5))
    }
}

impl Profile for GaussianPulse {
    fn name(&self) -> &'static str {
        "Gaussian pulse"
    }

    fn initial(&self, x: Float, length: Float) -> Float {
        let d = analytic::minimum_image(x - self.center, length);
        if d.abs() > self.cutoff {
            0.0
        } else {
            (-d * d / (2.0 * self.sigma * self.sigma)).exp()
        }
    }

    fn exact(&self, x: Float, t: Float, coefficients: &Coefficients, length: Float) -> Float {
        analytic::gaussian_pulse(self, coefficients, length, x, t)
    }
}

/// Superposition `Σ sin(k x) + Σ cos(k x)` where every wave number
/// `k = 2π m / L` fits the periodic domain.
#[derive(Debug, Clone, PartialEq)]
pub struct FourierModes {
    /// Mode indices `m` of the sine terms
    pub sines: Vec<u32>,
    /// Mode indices `m` of the cosine terms
    pub cosines: Vec<u32>,
}

impl FourierModes {
    pub fn new(sines: impl Into<Vec<u32>>, cosines: impl Into<Vec<u32>>) -> Self {
        Self {
            sines: sines.into(),
            cosines: cosines.into(),
        }
    }

    pub fn wave_number(mode: u32, length: Float) -> Float {
        2.0 * std::f64::consts::PI * mode as Float / length
    }
}

impl Default for FourierModes {
    fn default() -> Self {
        Self::new(vec![1, 3], vec![2])
    }
}

impl Profile for FourierModes {
    fn name(&self) -> &'static str {
        "Fourier modes"
    }

    fn initial(&self, x: Float, length: Float) -> Float {
        let sines: Float = self
            .sines
            .iter()
            .map(|&m| (Self::wave_number(m, length) * x).sin())
            .sum();
        let cosines: Float = self
            .cosines
            .iter()
            .map(|&m| (Self::wave_number(m, length) * x).cos())
            .sum();
        sines + cosines
    }

    fn exact(&self, x: Float, t: Float, coefficients: &Coefficients, length: Float) -> Float {
        analytic::fourier_modes(self, coefficients, length, x, t)
    }
}

/// Time span and periodic space interval of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    pub time: (Float, Float),
    pub space: (Float, Float),
}

impl Domain {
    /// `[0, final_time]` in time, `[-length / 2, length / 2)` in space.
    pub fn centered(length: Float, final_time: Float) -> Self {
        Self {
            time: (0.0, final_time),
            space: (-0.5 * length, 0.5 * length),
        }
    }

    pub fn length(&self) -> Float {
        self.space.1 - self.space.0
    }
}

#[derive(Clone)]
pub struct Problem {
    pub(crate) name: String,
    pub(crate) coefficients: Coefficients,
    pub(crate) domain: Domain,
    pub(crate) profile: Rc<dyn Profile>,
}

impl Problem {
    pub fn new(
        name: impl AsRef<str>,
        coefficients: Coefficients,
        domain: Domain,
        profile: impl Profile + 'static,
    ) -> Self {
        Self {
            name: name.as_ref().to_string(),
            coefficients,
            domain,
            profile: Rc::new(profile),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn profile(&self) -> &dyn Profile {
        self.profile.as_ref()
    }

    /// Initial field sampled on the periodic nodes of `mesh`.
    pub fn initial_condition(&self, mesh: &Mesh) -> Mat<Float> {
        let length = self.domain.length();
        let positions = mesh.positions();
        Mat::from_fn(positions.len(), 1, |i, _| {
            self.profile.initial(positions[i], length)
        })
    }
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("name", &self.name)
            .field("coefficients", &self.coefficients)
            .field("domain", &self.domain)
            .field("profile", &self.profile.name())
            .finish()
    }
}
