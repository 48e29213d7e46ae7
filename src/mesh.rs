use crate::{driver::SimError, Float};

/// Smallest periodic grid on which the three-point stencil touches three
/// distinct nodes.
pub const MIN_GRID_SIZE: usize = 4;
/// The operator keeps four dense `N x N` matrices, 512 MiB at `2^12` nodes.
pub const MAX_GRID_EXPONENT: u32 = 12;
pub const MAX_GRID_SIZE: usize = 1 << MAX_GRID_EXPONENT;

// grid[0] <-> lower
// grid[i] <-> lower + i * delta forall i
// grid[steps] <-> upper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub(crate) lower: Float,
    pub(crate) upper: Float,
    pub(crate) delta: Float,
    pub(crate) steps: usize,
}

impl Grid {
    pub fn from_steps(lower: Float, upper: Float, steps: usize) -> Self {
        let delta = (upper - lower) / steps as Float;
        Self {
            lower,
            upper,
            delta,
            steps,
        }
    }

    pub fn from_delta(lower: Float, upper: Float, delta: Float) -> Self {
        let steps = ((upper - lower) / delta).ceil() as usize;
        Self::from_steps(lower, upper, steps)
    }

    pub fn with_steps(self, steps: usize) -> Self {
        Self::from_steps(self.lower, self.upper, steps)
    }

    pub fn lower(&self) -> Float {
        self.lower
    }

    pub fn upper(&self) -> Float {
        self.upper
    }

    pub fn delta(&self) -> Float {
        self.delta
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn length(&self) -> Float {
        self.upper - self.lower
    }

    /// All `steps + 1` nodes, both bounds included. The last node is
    /// `upper` exactly rather than the accumulated `lower + steps * delta`.
    pub fn iter(self) -> impl Iterator<Item = Float> {
        (0..(self.steps + 1)).map(move |i| {
            if i == self.steps {
                self.upper
            } else {
                self.lower + self.delta * i as Float
            }
        })
    }

    /// The `steps` nodes of a periodic grid: `upper` is identified with
    /// `lower` and therefore left out.
    pub fn periodic_iter(self) -> impl Iterator<Item = Float> {
        (0..self.steps).map(move |i| self.lower + self.delta * i as Float)
    }
}

/// Spatial grid of a periodic domain together with the times at which
/// the solution is sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub(crate) time: Grid,
    pub(crate) space: Grid,
}

impl Mesh {
    pub fn new(time: Grid, space: Grid) -> Self {
        Self { time, space }
    }

    pub fn time(&self) -> Grid {
        self.time
    }

    pub fn space(&self) -> Grid {
        self.space
    }

    /// Number of unknowns of the semi-discrete system.
    pub fn size(&self) -> usize {
        self.space.steps
    }

    pub fn sample_times(&self) -> Vec<Float> {
        self.time.iter().collect()
    }

    pub fn positions(&self) -> Vec<Float> {
        self.space.periodic_iter().collect()
    }

    /// Rejects meshes no integrator can run on: a grid outside
    /// `MIN_GRID_SIZE..=MAX_GRID_SIZE` nodes, or fewer than two sample times.
    pub fn check(&self) -> Result<(), SimError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.space.steps) {
            return Err(SimError::InvalidParameters(format!(
                "periodic grid must have {MIN_GRID_SIZE} to {MAX_GRID_SIZE} nodes, got {}",
                self.space.steps
            )));
        }
        if !(self.space.delta > 0.0 && self.space.delta.is_finite()) {
            return Err(SimError::InvalidParameters(format!(
                "grid spacing must be positive, got {}",
                self.space.delta
            )));
        }
        if self.time.steps == 0 {
            return Err(SimError::InvalidParameters(
                "at least two sample times are needed".to_string(),
            ));
        }
        if !(self.time.delta >= 0.0 && self.time.delta.is_finite()) {
            return Err(SimError::InvalidParameters(format!(
                "time span [{}, {}] is not a forward interval",
                self.time.lower, self.time.upper
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_grid_excludes_upper_bound() {
        let grid = Grid::from_steps(-15.0, 15.0, 256);
        let nodes: Vec<_> = grid.periodic_iter().collect();
        assert_eq!(nodes.len(), 256);
        assert_eq!(nodes[0], -15.0);
        assert!((nodes[255] - (15.0 - grid.delta())).abs() < 1e-12);
        assert!((grid.delta() - 30.0 / 256.0).abs() < 1e-15);
    }

    #[test]
    fn time_samples_hit_both_bounds() {
        let grid = Grid::from_steps(0.0, 2.0, 20);
        let times: Vec<_> = grid.iter().collect();
        assert_eq!(times.len(), 21);
        assert_eq!(times[0], 0.0);
        assert_eq!(times[20], 2.0);
        assert!((times[10] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn from_delta_rounds_steps_up() {
        let grid = Grid::from_delta(0.0, 1.0, 0.3);
        assert_eq!(grid.steps(), 4);
        assert_eq!(grid.delta(), 0.25);
    }

    #[test]
    fn mesh_size_is_number_of_periodic_nodes() {
        let mesh = Mesh::new(
            Grid::from_steps(0.0, 1.0, 10),
            Grid::from_steps(-1.0, 1.0, 64),
        );
        assert_eq!(mesh.size(), 64);
        assert_eq!(mesh.positions().len(), 64);
        assert_eq!(mesh.sample_times().len(), 11);
    }

    #[test]
    fn check_rejects_degenerate_meshes() {
        let time = Grid::from_steps(0.0, 2.0, 20);
        let space = Grid::from_steps(-15.0, 15.0, 256);
        assert!(Mesh::new(time, space).check().is_ok());

        for bad in [
            Mesh::new(time, space.with_steps(1)),
            Mesh::new(time, space.with_steps(2)),
            Mesh::new(time, space.with_steps(MAX_GRID_SIZE + 1)),
            Mesh::new(time.with_steps(0), space),
            Mesh::new(Grid::from_steps(2.0, 0.0, 20), space),
        ] {
            assert!(
                matches!(bad.check(), Err(SimError::InvalidParameters(_))),
                "{bad:?}"
            );
        }
    }
}
