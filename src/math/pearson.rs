//! Pearson correlation over sparse columns.
//!
//! Columns come straight out of the return grid, so cells may be undefined.
//! Each pair is computed over the rows where *both* sides are defined
//! (pairwise-complete observations).

/// Pearson correlation of two equally long columns.
///
/// Returns `None` when the coefficient is undefined: fewer than two paired
/// observations, zero variance on either side, or non-finite arithmetic.
/// Defined values are clamped to `[-1, 1]` to absorb rounding noise.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if is_flat(sxx, n, mean_x) || is_flat(syy, n, mean_y) {
        return None;
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Zero variance up to rounding: a constant column can leave a residual sum of
/// squares on the order of `n * (eps * mean)^2`.
fn is_flat(sum_sq: f64, n: f64, mean: f64) -> bool {
    sum_sq <= f64::EPSILON * n * mean * mean
}
