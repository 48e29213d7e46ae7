use crate::Float;
use faer::{Mat, MatMut, MatRef};
use faer_core::zipped;

pub fn linspace(a: Float, size: usize, h: Float) -> Mat<Float> {
    Mat::<Float>::from_fn(size, 1, |i, _| a + h * i as Float)
}

pub fn column_from_slice(values: &[Float]) -> Mat<Float> {
    Mat::<Float>::from_fn(values.len(), 1, |i, _| values[i])
}

pub fn column_to_vec(m: MatRef<'_, Float>) -> Vec<Float> {
    (0..m.nrows()).map(|i| m.read(i, 0)).collect()
}

pub fn apply_func(m: MatRef<'_, Float>, f: impl Fn(Float) -> Float) -> Mat<Float> {
    Mat::from_fn(m.nrows(), m.ncols(), |i, j| f(m.read(i, j)))
}

pub fn copy_into(src: MatRef<'_, Float>, dst: MatMut<'_, Float>) {
    zipped!(dst, src).for_each(|mut dst, src| dst.write(src.read()));
}

pub fn sum(m: MatRef<'_, Float>) -> Float {
    (0..m.ncols())
        .flat_map(|j| (0..m.nrows()).map(move |i| m.read(i, j)))
        .sum()
}

pub fn max_abs(m: MatRef<'_, Float>) -> Float {
    (0..m.ncols())
        .flat_map(|j| (0..m.nrows()).map(move |i| m.read(i, j).abs()))
        .fold(0.0, Float::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_starts_at_origin_with_fixed_spacing() {
        let m = linspace(-1.0, 5, 0.5);
        assert_eq!(column_to_vec(m.as_ref()), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn reductions() {
        let m = column_from_slice(&[1.0, -4.0, 2.5]);
        assert_eq!(sum(m.as_ref()), -0.5);
        assert_eq!(max_abs(m.as_ref()), 4.0);
        let doubled = apply_func(m.as_ref(), |x| 2.0 * x);
        assert_eq!(column_to_vec(doubled.as_ref()), vec![2.0, -8.0, 5.0]);

        let mut copy = Mat::<Float>::zeros(3, 1);
        copy_into(doubled.as_ref(), copy.as_mut());
        assert_eq!(column_to_vec(copy.as_ref()), vec![2.0, -8.0, 5.0]);
    }
}
