//! Compatibility of subsystem spaces.

use crate::error::{Result, SpaceMismatch};

/// Check that two ordered lists of subsystem dimensions describe the same space.
///
/// # Errors
/// Returns [`SpaceMismatch::Length`] if the lists differ in length, or
/// [`SpaceMismatch::Subsystem`] carrying the first position whose dimensions
/// differ, both wrapped in `QuantumError::DimensionMismatch`.
pub fn check_spaces(left: &[usize], right: &[usize]) -> Result<()> {
    if left.len() != right.len() {
        return Err(SpaceMismatch::Length {
            left: left.len(),
            right: right.len(),
        }
        .into());
    }
    if let Some((index, (&l, &r))) = left
        .iter()
        .zip(right)
        .enumerate()
        .find(|(_, (l, r))| l != r)
    {
        return Err(SpaceMismatch::Subsystem {
            index,
            left: l,
            right: r,
        }
        .into());
    }
    Ok(())
}
