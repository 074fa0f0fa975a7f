//! Descriptive statistics over plain slices.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of `value(x)` over the items where `keep(x)` holds.
pub fn mean_where<T>(items: &[T], keep: impl Fn(&T) -> bool, value: impl Fn(&T) -> f64) -> Option<f64> {
    let selected: Vec<f64> = items.iter().filter(|x| keep(x)).map(value).collect();
    mean(&selected)
}
