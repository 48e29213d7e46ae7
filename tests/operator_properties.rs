use convdiff::{
    operator::{convection_matrix, diffusion_matrix, reaction_matrix},
    Coefficients, Float, Operator,
};
use faer::MatRef;
use proptest::prelude::*;

fn row_sum(m: MatRef<'_, Float>, i: usize) -> Float {
    (0..m.ncols()).map(|j| m.read(i, j)).sum()
}

proptest! {
    #[test]
    fn convection_is_antisymmetric(
        exponent in 2u32..=8,
        delta in 0.01f64..2.0,
        speed in -20.0f64..20.0,
    ) {
        let n = 1usize << exponent;
        let a = convection_matrix(n, delta, speed);
        for i in 0..n {
            for j in 0..n {
                prop_assert_eq!(a.read(i, j), -a.read(j, i));
            }
        }
    }

    #[test]
    fn diffusion_is_symmetric_with_zero_row_sums(
        exponent in 2u32..=8,
        delta in 0.01f64..2.0,
        diffusion in 0.0f64..5.0,
    ) {
        let n = 1usize << exponent;
        let a = diffusion_matrix(n, delta, diffusion);
        let scale = diffusion / (delta * delta);
        for i in 0..n {
            for j in 0..n {
                prop_assert_eq!(a.read(i, j), a.read(j, i));
            }
            prop_assert!(row_sum(a.as_ref(), i).abs() <= 1e-12 * scale.max(1.0));
        }
    }

    #[test]
    fn reaction_rows_sum_to_minus_rate(exponent in 2u32..=8, rate in -5.0f64..5.0) {
        let n = 1usize << exponent;
        let a = reaction_matrix(n, rate);
        for i in 0..n {
            prop_assert_eq!(row_sum(a.as_ref(), i), -rate);
        }
    }

    #[test]
    fn total_rows_sum_to_minus_rate(
        exponent in 2u32..=8,
        delta in 0.05f64..2.0,
        convection in -20.0f64..20.0,
        diffusion in 0.0f64..5.0,
        reaction in -5.0f64..5.0,
    ) {
        let n = 1usize << exponent;
        let op = Operator::assemble(n, delta, &Coefficients::new(convection, diffusion, reaction));
        let scale = convection.abs() / delta + diffusion / (delta * delta) + reaction.abs();
        for i in 0..n {
            prop_assert!((row_sum(op.matrix(), i) + reaction).abs() <= 1e-12 * scale.max(1.0));
        }
    }

    #[test]
    fn stencil_wraps_around(exponent in 2u32..=8, delta in 0.01f64..2.0) {
        let n = 1usize << exponent;
        let op = Operator::assemble(n, delta, &Coefficients::new(1.0, 1.0, 0.0));
        let c = 1.0 / (2.0 * delta);
        let d = 1.0 / (delta * delta);
        // first row reaches the last node, last row reaches the first
        prop_assert_eq!(op.convection().read(0, n - 1), -c);
        prop_assert_eq!(op.convection().read(n - 1, 0), c);
        prop_assert_eq!(op.diffusion().read(0, n - 1), -d);
        prop_assert_eq!(op.diffusion().read(n - 1, 0), -d);
        // nothing outside the three diagonals
        for j in 2..n - 1 {
            prop_assert_eq!(op.matrix().read(0, j), 0.0);
        }
    }
}

#[test]
fn symmetric_part_is_diffusion_and_reaction() {
    let op = Operator::assemble(16, 0.25, &Coefficients::new(3.0, 0.7, -1.5));
    let (symmetric, antisymmetric) = op.split();
    for i in 0..16 {
        for j in 0..16 {
            let expected = op.diffusion().read(i, j) + op.reaction().read(i, j);
            assert!((symmetric.read(i, j) - expected).abs() < 1e-12);
            assert!((antisymmetric.read(i, j) - op.convection().read(i, j)).abs() < 1e-12);
        }
    }
}
