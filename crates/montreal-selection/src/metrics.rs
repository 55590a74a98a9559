//! Scores used to rank features and to compare fitted models.

use ndarray::ArrayView1;

/// Mean squared error. Empty inputs score `+inf`.
pub fn mse(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() {
        return f64::INFINITY;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Coefficient of determination.
///
/// A constant `actual` gives 1 for a perfect fit and 0 otherwise.
pub fn r2(actual: ArrayView1<'_, f64>, predicted: ArrayView1<'_, f64>) -> f64 {
    if actual.is_empty() {
        return f64::NEG_INFINITY;
    }
    let mean = actual.sum() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Pearson correlation; 0 when either side has zero variance.
pub fn pearson(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let n = a.len();
    if n < 2 {
        return 0.0;
    }
    let mean_a = a.sum() / n as f64;
    let mean_b = b.sum() / n as f64;
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a <= 0.0 || var_b <= 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Equal-frequency bin index of every value; tied values share a bin.
pub fn quantile_bins(values: ArrayView1<'_, f64>, bins: usize) -> Vec<usize> {
    let n = values.len();
    let bins = bins.max(1);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]).then(i.cmp(&j)));

    let mut assigned = vec![0; n];
    let mut previous: Option<(f64, usize)> = None;
    for (rank, &i) in order.iter().enumerate() {
        let bin = match previous {
            Some((value, bin)) if value == values[i] => bin,
            _ => (rank * bins / n).min(bins - 1),
        };
        assigned[i] = bin;
        previous = Some((values[i], bin));
    }
    assigned
}

/// Plug-in mutual information (nats) between two discretized variables.
pub fn mutual_information(a: &[usize], b: &[usize]) -> f64 {
    let n = a.len();
    if n == 0 {
        return 0.0;
    }
    let rows = a.iter().max().map_or(0, |m| m + 1);
    let cols = b.iter().max().map_or(0, |m| m + 1);

    let mut joint = vec![0usize; rows * cols];
    let mut margin_a = vec![0usize; rows];
    let mut margin_b = vec![0usize; cols];
    for (&i, &j) in a.iter().zip(b.iter()) {
        joint[i * cols + j] += 1;
        margin_a[i] += 1;
        margin_b[j] += 1;
    }

    let n = n as f64;
    let mut mi = 0.0;
    for i in 0..rows {
        for j in 0..cols {
            let count = joint[i * cols + j];
            if count == 0 {
                continue;
            }
            let p_ij = count as f64 / n;
            let p_i = margin_a[i] as f64 / n;
            let p_j = margin_b[j] as f64 / n;
            mi += p_ij * (p_ij / (p_i * p_j)).ln();
        }
    }
    mi.max(0.0)
}
