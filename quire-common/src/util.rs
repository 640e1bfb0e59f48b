use std::num::NonZeroU32;
use time::Duration;

/// A strictly positive span of time, used for cache lifetimes.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash)]
pub struct PositiveDuration(Duration);

impl PositiveDuration {
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        duration.is_positive().then_some(Self(duration))
    }

    #[must_use]
    pub fn from_secs(seconds: u64) -> Option<Self> {
        i64::try_from(seconds)
            .ok()
            .and_then(|seconds| Self::new(Duration::seconds(seconds)))
    }

    #[must_use]
    pub fn get(&self) -> Duration {
        self.0
    }

    /// The same span as a [`std::time::Duration`], for timers and deadlines.
    #[must_use]
    pub fn to_std(&self) -> std::time::Duration {
        self.0.unsigned_abs()
    }
}

impl From<NonZeroU32> for PositiveDuration {
    /// Whole seconds.
    fn from(seconds: NonZeroU32) -> Self {
        Self(Duration::seconds(i64::from(seconds.get())))
    }
}
