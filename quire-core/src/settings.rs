use quire_common::util::PositiveDuration;
use serde::Deserialize;
use std::num::NonZeroU32;

pub const DEFAULT_PAGE_SIZE: NonZeroU32 = NonZeroU32::new(10).expect("10 is not zero");
pub const DEFAULT_HOME_CACHE_TTL_SECONDS: NonZeroU32 =
    NonZeroU32::new(20).expect("20 is not zero");

/// Tunables of the feed builder. Deserializes from the environment with
/// `envy`, missing values take the defaults.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct FeedSettings {
    #[serde(default = "default_page_size")]
    pub page_size: NonZeroU32,
    #[serde(default = "default_home_cache_ttl_seconds")]
    pub home_cache_ttl_seconds: NonZeroU32,
}

fn default_page_size() -> NonZeroU32 {
    DEFAULT_PAGE_SIZE
}

fn default_home_cache_ttl_seconds() -> NonZeroU32 {
    DEFAULT_HOME_CACHE_TTL_SECONDS
}

impl FeedSettings {
    #[must_use]
    pub fn home_cache_ttl(&self) -> PositiveDuration {
        self.home_cache_ttl_seconds.into()
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            home_cache_ttl_seconds: DEFAULT_HOME_CACHE_TTL_SECONDS,
        }
    }
}
