use jiff::{SignedDuration, Timestamp};

#[macro_export]
macro_rules! timer_debug {
    ($msg:literal,$block:expr) => {{
        let now = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(now);

        tracing::debug!("{}: Took {:?}", $msg, elapsed);

        result
    }};
}

/// Adds `duration` to `timestamp`, clamping to the representable range
/// instead of panicking.
#[inline]
pub fn saturating_add(timestamp: Timestamp, duration: SignedDuration) -> Timestamp {
    match timestamp.checked_add(duration) {
        Ok(result) => result,
        Err(_) if duration.is_negative() => Timestamp::MIN,
        Err(_) => Timestamp::MAX,
    }
}

#[inline]
pub fn saturating_sub(timestamp: Timestamp, duration: SignedDuration) -> Timestamp {
    match timestamp.checked_sub(duration) {
        Ok(result) => result,
        Err(_) if duration.is_negative() => Timestamp::MAX,
        Err(_) => Timestamp::MIN,
    }
}

/// Positive part of `later - earlier`.
#[inline]
pub fn positive_duration_between(earlier: Timestamp, later: Timestamp) -> SignedDuration {
    if later > earlier {
        later.duration_since(earlier)
    } else {
        SignedDuration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturating_add_clamps_at_max() {
        let result = saturating_add(Timestamp::MAX, SignedDuration::from_secs(10));
        assert_eq!(result, Timestamp::MAX);
    }

    #[test]
    fn test_saturating_sub_clamps_at_min() {
        let result = saturating_sub(Timestamp::MIN, SignedDuration::from_secs(10));
        assert_eq!(result, Timestamp::MIN);
    }

    #[test]
    fn test_positive_duration_between() {
        let earlier = Timestamp::from_second(100).unwrap();
        let later = Timestamp::from_second(160).unwrap();

        assert_eq!(
            positive_duration_between(earlier, later),
            SignedDuration::from_secs(60)
        );
        assert_eq!(
            positive_duration_between(later, earlier),
            SignedDuration::ZERO
        );
    }
}
