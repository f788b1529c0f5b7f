//! Range and size checks shared by claim and header parsing

use crate::claims::Claim;
use crate::error::{Error, Result};
use crate::limits::{MAX_TIMESTAMP, MIN_TIMESTAMP};

pub(crate) fn validate_timestamp_bounds(claim: Claim, value: i64) -> Result<()> {
    if !(MIN_TIMESTAMP..=MAX_TIMESTAMP).contains(&value) {
        return Err(Error::TimestampOutOfBounds {
            claim,
            value,
            min: MIN_TIMESTAMP,
            max: MAX_TIMESTAMP,
        });
    }
    Ok(())
}

/// `timestamp + skew`, or [`Error::TimestampOverflow`] if that leaves `i64`
pub(crate) fn apply_clock_skew(claim: Claim, timestamp: i64, skew_seconds: u64) -> Result<i64> {
    i64::try_from(skew_seconds)
        .ok()
        .and_then(|skew| timestamp.checked_add(skew))
        .ok_or(Error::TimestampOverflow(claim))
}

pub(crate) fn validate_field_size(claim: Claim, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(Error::ClaimMalformed {
            claim,
            reason: format!("{} bytes (maximum: {max} bytes)", value.len()),
        });
    }
    Ok(())
}
