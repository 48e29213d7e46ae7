use faer::{Mat, MatRef};

use crate::{driver::SimError, faer_add, Ctx, Float};

/// Time integrator of the semi-discrete system `du/dt = -A u`.
pub trait Method {
    /// Called once the operator is assembled, before any integration.
    fn init(&mut self, _ctx: Ctx<'_>) {}

    /// Integrates `u0` from the first to the last sample time of
    /// `ctx.mesh` and returns the state at every sample time.
    fn integrate(&mut self, ctx: Ctx<'_>, u0: MatRef<'_, Float>) -> Result<Snapshots, SimError>;

    fn name(&self) -> &'static str;
}

/// Solution states at a sequence of times, one column per time.
#[derive(Debug, Clone)]
pub struct Snapshots {
    times: Vec<Float>,
    states: Mat<Float>,
}

impl Snapshots {
    pub fn new(size: usize, times: Vec<Float>) -> Self {
        let states = Mat::zeros(size, times.len());
        Self { times, states }
    }

    pub fn from_parts(times: Vec<Float>, states: Mat<Float>) -> Result<Self, SimError> {
        if states.ncols() != times.len() {
            return Err(SimError::InvalidParameters(format!(
                "{} states for {} sample times",
                states.ncols(),
                times.len()
            )));
        }
        Ok(Self { times, states })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of unknowns of each state.
    pub fn size(&self) -> usize {
        self.states.nrows()
    }

    pub fn times(&self) -> &[Float] {
        &self.times
    }

    pub fn time(&self, n: usize) -> Float {
        self.times[n]
    }

    pub fn states(&self) -> MatRef<'_, Float> {
        self.states.as_ref()
    }

    pub fn state(&self, n: usize) -> MatRef<'_, Float> {
        self.states.as_ref().col(n)
    }

    pub fn last(&self) -> Option<MatRef<'_, Float>> {
        self.len().checked_sub(1).map(|n| self.state(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Float, MatRef<'_, Float>)> + '_ {
        (0..self.len()).map(move |n| (self.times[n], self.state(n)))
    }

    pub(crate) fn set(&mut self, n: usize, u: MatRef<'_, Float>) {
        faer_add::copy_into(u, self.states.as_mut().col(n));
    }
}

pub(crate) fn check_sample_times(times: &[Float]) -> Result<(), SimError> {
    if times.is_empty() {
        return Err(SimError::InvalidParameters(
            "at least one sample time is required".to_string(),
        ));
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(SimError::InvalidParameters(
            "sample times must be finite".to_string(),
        ));
    }
    if times.windows(2).any(|w| w[1] < w[0]) {
        return Err(SimError::InvalidParameters(
            "sample times must be sorted".to_string(),
        ));
    }
    Ok(())
}
