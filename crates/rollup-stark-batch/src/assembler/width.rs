//! Width selection and data-tree alignment

/// Smallest supported width that holds `requested` proofs
pub fn resolve_width(requested: usize, supported: &[usize]) -> Option<usize> {
    supported.iter().copied().filter(|&w| w >= requested).min()
}

/// First data-tree index for a batch of `width` slots
///
/// Each slot writes two notes, so batches start on multiples of `2 * width`.
/// Leaves between the current size and the start stay empty.
pub fn aligned_start_index(data_size: u64, width: usize) -> u64 {
    let block = 2 * width as u64;
    data_size.div_ceil(block) * block
}
