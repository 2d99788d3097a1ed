//! A time-boxed cache value.

use chrono::{DateTime, Duration, Utc};

/// A value with an explicit expiry, checked on every access.
///
/// Replaces what would otherwise be ambient module state: the holder owns
/// the cache, and an expired value resets to its default on the next read.
#[derive(Debug)]
pub struct TimeBoxed<T> {
    value: T,
    expires_at: DateTime<Utc>,
    ttl: Duration,
}

impl<T: Default> TimeBoxed<T> {
    /// Create an empty cache whose entries live for `ttl` after each write.
    pub fn new(ttl: Duration) -> Self {
        Self {
            value: T::default(),
            expires_at: DateTime::<Utc>::MIN_UTC,
            ttl,
        }
    }

    /// Read the value, resetting it first if it has expired.
    pub fn get(&mut self, now: DateTime<Utc>) -> &T {
        self.expire_if_stale(now);
        &self.value
    }

    /// Write access; refreshes the expiry.
    pub fn get_mut(&mut self, now: DateTime<Utc>) -> &mut T {
        self.expire_if_stale(now);
        self.expires_at = now + self.ttl;
        &mut self.value
    }

    fn expire_if_stale(&mut self, now: DateTime<Utc>) {
        if now > self.expires_at {
            self.value = T::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn value_survives_within_ttl() {
        let mut cache: TimeBoxed<Vec<u32>> = TimeBoxed::new(Duration::seconds(30));
        cache.get_mut(ts(100)).push(7);

        assert_eq!(cache.get(ts(120)), &vec![7]);
    }

    #[test]
    fn value_resets_after_expiry() {
        let mut cache: TimeBoxed<Vec<u32>> = TimeBoxed::new(Duration::seconds(30));
        cache.get_mut(ts(100)).push(7);

        assert!(cache.get(ts(131)).is_empty());
    }

    #[test]
    fn write_refreshes_expiry() {
        let mut cache: TimeBoxed<Vec<u32>> = TimeBoxed::new(Duration::seconds(30));
        cache.get_mut(ts(100)).push(1);
        cache.get_mut(ts(125)).push(2);

        assert_eq!(cache.get(ts(150)).len(), 2);
    }
}
