//! Statistics helpers: median, variance, standard deviation, skewness, and
//! Pearson correlation. Plain textbook formulas over `kernel::reduce`/sort,
//! not independently vectorised — these are comfort functions, not part of
//! the hot aggregation path.

use crate::element::Numeric;
use crate::kernel::reduce;
use crate::kernel::sort;
use crate::simd::SimdLevel;

/// The middle value of sorted `data` (average of the two middle values for
/// even-length input). `None` for empty input.
pub fn median<T: Numeric>(data: &[T]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let level = crate::simd::level();
    let order = sort::argsort(data, true, level);
    let n = order.len();
    let at = |i: usize| data[order[i] as usize].to_f64();
    Some(if n % 2 == 1 {
        at(n / 2)
    } else {
        (at(n / 2 - 1) + at(n / 2)) / 2.0
    })
}

/// Population variance: `mean((x - mean(x))^2)`. `None` for empty input.
pub fn variance<T: Numeric>(data: &[T]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let level = crate::simd::level();
    let mean = reduce::mean(data, level)?;
    let sum_sq_dev: f64 = data.iter().map(|v| {
        let d = v.to_f64() - mean;
        d * d
    }).sum();
    Some(sum_sq_dev / data.len() as f64)
}

/// Population standard deviation, `sqrt(variance(data))`.
pub fn stddev<T: Numeric>(data: &[T]) -> Option<f64> {
    variance(data).map(f64::sqrt)
}

/// Fisher-Pearson skewness (population, not bias-corrected):
/// `mean((x - mean)^3) / stddev(x)^3`. `None` for empty input or a
/// zero-variance column, where skewness is undefined.
pub fn skewness<T: Numeric>(data: &[T]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let level = crate::simd::level();
    let mean = reduce::mean(data, level)?;
    let n = data.len() as f64;
    let variance = data.iter().map(|v| {
        let d = v.to_f64() - mean;
        d * d
    }).sum::<f64>() / n;
    if variance == 0.0 {
        return None;
    }
    let third_moment = data.iter().map(|v| {
        let d = v.to_f64() - mean;
        d * d * d
    }).sum::<f64>() / n;
    Some(third_moment / variance.powf(1.5))
}

/// Pearson correlation coefficient between two equal-length columns.
/// `None` if the lengths differ, either input is empty, or either column
/// has zero variance (correlation is undefined against a constant series).
pub fn correlation<T: Numeric>(a: &[T], b: &[T]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let level = crate::simd::level();
    let mean_a = reduce::mean(a, level)?;
    let mean_b = reduce::mean(b, level)?;

    let mut cov = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for i in 0..a.len() {
        let da = a[i].to_f64() - mean_a;
        let db = b[i].to_f64() - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }
    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}
