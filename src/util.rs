use std::{
    sync::atomic::{AtomicU64, Ordering},
    time,
};

/// Get the current system time in epoch format.
///
/// # Returns
///
/// Current system time in milliseconds from epoch, or zero if the system
/// time is before epoch.
pub fn millis_from_epoch() -> u64 {
    time::SystemTime::now()
        .duration_since(time::UNIX_EPOCH)
        .map(|since| u64::try_from(since.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

/// Last cache-busting token handed out in this process.
static LAST_NOCACHE: AtomicU64 = AtomicU64::new(0);

/// Returns a cache-busting token for the speaker's `_nocache` parameter.
///
/// This is the current time in milliseconds, bumped when needed so that
/// no two requests from this process ever carry the same token even when
/// issued within the same millisecond or after a clock step backwards.
pub fn nocache_token() -> u64 {
    let now = millis_from_epoch();
    let previous = LAST_NOCACHE
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last.saturating_add(1)))
        })
        .unwrap_or(now);

    now.max(previous.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nocache_tokens_strictly_increase() {
        let mut last = nocache_token();
        for _ in 0..1_000 {
            let next = nocache_token();
            assert!(next > last, "{next} should be greater than {last}");
            last = next;
        }
    }

    #[test]
    fn nocache_tokens_track_wall_clock() {
        let before = millis_from_epoch();
        assert!(nocache_token() >= before);
    }
}
