use std::cmp::Ordering;

/// Assign dense ordinal ranks 1..N by probability descending.
///
/// The sort is stable, so equal probabilities keep their input order and
/// still receive distinct consecutive ranks. A missing probability (NaN)
/// sorts as negative infinity and lands at the bottom of the table.
pub(crate) fn dense_ranks(probabilities: &[f64]) -> Vec<u32> {
    fn key(p: f64) -> f64 {
        if p.is_nan() { f64::NEG_INFINITY } else { p }
    }

    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| {
        key(probabilities[b])
            .partial_cmp(&key(probabilities[a]))
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0u32; probabilities.len()];
    for (position, &index) in order.iter().enumerate() {
        ranks[index] = position as u32 + 1;
    }
    ranks
}
