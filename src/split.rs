//! Positional train/validation partitioning of an encoded sequence.

/// Index at which the validation suffix starts: `floor(len * ratio)`, clamped to `len`.
#[must_use]
pub fn split_point(len: usize, ratio: f64) -> usize {
    let boundary = (len as f64 * ratio).floor();
    if boundary <= 0.0 {
        0
    } else {
        (boundary as usize).min(len)
    }
}

/// Splits `sequence` into a training prefix and validation suffix.
///
/// Order is preserved; the two halves concatenate back into `sequence` for every
/// length, including 0 and 1.
#[must_use]
pub fn split<T>(sequence: &[T], ratio: f64) -> (&[T], &[T]) {
    sequence.split_at(split_point(sequence.len(), ratio))
}
