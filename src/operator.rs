use faer::{Mat, MatMut, MatRef};
use faer_core::{mul::matmul, Parallelism};
use reborrow::*;

use crate::{problem::Coefficients, Float};

// generic circulant matrix builder for a periodic stencil where
// ql == [q_{-1}, q_{-2}, ..., q_{-l}]
// qc == q_0
// qr == [q_1, q_2, ..., q_r]
// in
// (A U)_j = \sum_{m=-l}^{r} q_m U_{j+m}
// U_j = U_{j+N} for all j
//
// Only the O(N) stencil entries are written. Coefficients landing on the
// same column (N smaller than the stencil span) are accumulated.
pub(crate) fn circulant_matrix(size: usize, ql: &[Float], qc: Float, qr: &[Float]) -> Mat<Float> {
    assert!(
        ql.len() < size && qr.len() < size,
        "stencil is wider than the periodic grid"
    );

    let mut a = Mat::<Float>::zeros(size, size);
    for i in 0..size {
        a.write(i, i, a.read(i, i) + qc);
        for (m, &q) in qr.iter().enumerate() {
            let j = (i + m + 1) % size;
            a.write(i, j, a.read(i, j) + q);
        }
        for (m, &q) in ql.iter().enumerate() {
            let j = (i + size - m - 1) % size;
            a.write(i, j, a.read(i, j) + q);
        }
    }
    a
}

/// Centered first derivative `C u_x`: `C / (2 dx) · (u_{j+1} - u_{j-1})`.
pub fn convection_matrix(size: usize, delta: Float, speed: Float) -> Mat<Float> {
    let c = speed / (2.0 * delta);
    circulant_matrix(size, &[-c], 0.0, &[c])
}

/// Centered second derivative `-D u_xx`: `D / dx² · (-u_{j-1} + 2 u_j - u_{j+1})`.
pub fn diffusion_matrix(size: usize, delta: Float, diffusion: Float) -> Mat<Float> {
    let d = diffusion / (delta * delta);
    circulant_matrix(size, &[-d], 2.0 * d, &[-d])
}

/// Reaction term `-S u`.
pub fn reaction_matrix(size: usize, rate: Float) -> Mat<Float> {
    circulant_matrix(size, &[], -rate, &[])
}

/// Semi-discrete operator `A` of `du/dt = -A u`.
///
/// Assembled once from its convection, diffusion and reaction parts and
/// never modified afterwards.
#[derive(Debug, Clone)]
pub struct Operator {
    convection: Mat<Float>,
    diffusion: Mat<Float>,
    reaction: Mat<Float>,
    total: Mat<Float>,
}

impl Operator {
    pub fn assemble(size: usize, delta: Float, coefficients: &Coefficients) -> Self {
        let convection = convection_matrix(size, delta, coefficients.convection);
        let diffusion = diffusion_matrix(size, delta, coefficients.diffusion);
        let reaction = reaction_matrix(size, coefficients.reaction);
        let total = Mat::from_fn(size, size, |i, j| {
            convection.read(i, j) + diffusion.read(i, j) + reaction.read(i, j)
        });

        tracing::event!(
            tracing::Level::DEBUG,
            "assembled {size}x{size} operator (C={}, D={}, S={}, Δx={delta:e})",
            coefficients.convection,
            coefficients.diffusion,
            coefficients.reaction,
        );

        Self {
            convection,
            diffusion,
            reaction,
            total,
        }
    }

    pub fn size(&self) -> usize {
        self.total.nrows()
    }

    pub fn matrix(&self) -> MatRef<'_, Float> {
        self.total.as_ref()
    }

    pub fn convection(&self) -> MatRef<'_, Float> {
        self.convection.as_ref()
    }

    pub fn diffusion(&self) -> MatRef<'_, Float> {
        self.diffusion.as_ref()
    }

    pub fn reaction(&self) -> MatRef<'_, Float> {
        self.reaction.as_ref()
    }

    /// Symmetric and antisymmetric parts `((A + Aᵀ) / 2, (A - Aᵀ) / 2)`.
    ///
    /// For this operator the symmetric part holds diffusion and reaction
    /// while the antisymmetric part is exactly the convection term.
    pub fn split(&self) -> (Mat<Float>, Mat<Float>) {
        let a = self.total.as_ref();
        let n = self.size();
        let symmetric = Mat::from_fn(n, n, |i, j| 0.5 * (a.read(i, j) + a.read(j, i)));
        let antisymmetric = Mat::from_fn(n, n, |i, j| 0.5 * (a.read(i, j) - a.read(j, i)));
        (symmetric, antisymmetric)
    }

    /// Right-hand side of the semi-discrete system: `out = -A u`.
    pub fn rhs_to(&self, u: MatRef<'_, Float>, out: MatMut<'_, Float>) {
        matmul(out, self.matrix(), u, None, -1.0, Parallelism::None)
    }

    /// One explicit Euler update: `out = u - dt A u`.
    pub fn euler_step_to(&self, dt: Float, u: MatRef<'_, Float>, mut out: MatMut<'_, Float>) {
        crate::faer_add::copy_into(u, out.rb_mut());
        matmul(out, self.matrix(), u, Some(1.0), -dt, Parallelism::None)
    }
}
