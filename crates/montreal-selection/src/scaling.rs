//! Column scalers fitted on a training matrix and applied to others.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Per-column centre and scale: `(x - centre) / scale`.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaler {
    centre: Array1<f64>,
    scale: Array1<f64>,
}

impl Scaler {
    /// Mean / population standard deviation. Constant columns get scale 1.
    pub fn standard(x: &Array2<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let centre = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(x.ncols()));
        let scale = x
            .axis_iter(Axis(1))
            .zip(centre.iter())
            .map(|(column, mean)| {
                let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                non_zero(var.sqrt())
            })
            .collect();
        Self { centre, scale }
    }

    /// Median / interquartile range, robust to outliers. Zero IQR gets scale 1.
    pub fn robust(x: &Array2<f64>) -> Self {
        let mut centre = Array1::zeros(x.ncols());
        let mut scale = Array1::ones(x.ncols());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let sorted = sorted_values(column);
            centre[j] = quantile(&sorted, 0.5);
            scale[j] = non_zero(quantile(&sorted, 0.75) - quantile(&sorted, 0.25));
        }
        Self { centre, scale }
    }

    /// Apply to a matrix with the same columns as the fitted one.
    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        (x - &self.centre.view().insert_axis(Axis(0))) / &self.scale.view().insert_axis(Axis(0))
    }

    /// Fitted centres.
    pub const fn centre(&self) -> &Array1<f64> {
        &self.centre
    }

    /// Fitted scales.
    pub const fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}

fn non_zero(scale: f64) -> f64 {
    if scale > f64::EPSILON { scale } else { 1.0 }
}

fn sorted_values(column: ArrayView1<'_, f64>) -> Vec<f64> {
    let mut values = column.to_vec();
    values.sort_by(f64::total_cmp);
    values
}

/// Linear-interpolated quantile of sorted values.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_standard_scaler() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = Scaler::standard(&x);
        let z = scaler.transform(&x);
        assert_relative_eq!(z[[0, 0]], -1.0);
        assert_relative_eq!(z[[1, 0]], 1.0);
        // constant column: centred, unscaled
        assert_relative_eq!(z[[0, 1]], 0.0);
    }

    #[test]
    fn test_robust_scaler() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [100.0]];
        let scaler = Scaler::robust(&x);
        assert_relative_eq!(scaler.centre()[0], 3.0);
        assert_relative_eq!(scaler.scale()[0], 2.0);
        let z = scaler.transform(&array![[5.0]]);
        assert_relative_eq!(z[[0, 0]], 1.0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile(&sorted, 0.5), 2.5);
        assert_relative_eq!(quantile(&sorted, 0.0), 1.0);
        assert_relative_eq!(quantile(&sorted, 1.0), 4.0);
    }
}
