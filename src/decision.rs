//! Rain decision: a pure mapping from PoP samples to LED state.

use crate::error::DecisionError;

/// Highest PoP in the batch, or `None` when empty.
pub fn peak(samples: &[u8]) -> Option<u8> {
    samples.iter().copied().max()
}

/// Decide whether the LED should be lit.
///
/// Reduces by maximum so that any hour of a 12-hour window crossing the threshold
/// lights the LED. The comparison is strict: a peak equal to `threshold` stays off.
///
/// # Example
/// ```
/// use rain_led_lib::decision::decide;
///
/// assert_eq!(decide(&[10, 20, 35, 15], 30), Ok(true));
/// assert_eq!(decide(&[30, 30, 30], 30), Ok(false));
/// ```
pub fn decide(samples: &[u8], threshold: u8) -> Result<bool, DecisionError> {
    peak(samples)
        .map(|max| max > threshold)
        .ok_or(DecisionError::InvalidInput)
}
