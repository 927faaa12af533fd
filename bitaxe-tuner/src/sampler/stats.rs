//! Order statistics over sample windows.

/// Sort ascending and drop `drop_low` values from the bottom and
/// `drop_high` from the top.
///
/// Returns an empty vector when nothing would remain.
pub fn trim(values: &[f64], drop_low: usize, drop_high: usize) -> Vec<f64> {
    if values.len() <= drop_low + drop_high {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted[drop_low..sorted.len() - drop_high].to_vec()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean of the values left after [`trim`], or `None` if none are left.
pub fn trimmed_mean(values: &[f64], drop_low: usize, drop_high: usize) -> Option<f64> {
    mean(&trim(values, drop_low, drop_high))
}

/// Whether `average` reaches `factor` of `expected`.
pub fn within_tolerance(average: f64, expected: f64, factor: f64) -> bool {
    average >= expected * factor
}
