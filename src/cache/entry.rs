//! Cache Entry Module
//!
//! Defines a cached value together with its freshness metadata.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Cache Item ==
/// A cached value with the moment it was stored and how long it stays fresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheItem<V> {
    /// When the value was written into a tier
    pub created: DateTime<Utc>,
    /// Lifetime of the value; zero means it never expires
    pub max_age: Duration,
    /// The cached value
    pub value: V,
}

impl<V> CacheItem<V> {
    // == Constructor ==
    /// Creates an item stored at `created` that expires after `max_age`.
    pub fn new(value: V, created: DateTime<Utc>, max_age: Duration) -> Self {
        Self {
            created,
            max_age,
            value,
        }
    }

    /// Creates an item that never expires.
    pub fn immutable(value: V, created: DateTime<Utc>) -> Self {
        Self::new(value, created, Duration::ZERO)
    }

    // == Age ==
    /// Time elapsed since the item was stored, as seen at `now`.
    ///
    /// A `created` in the future (clock moved backwards) counts as age zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.created).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the item never expires.
    pub fn is_immutable(&self) -> bool {
        self.max_age.is_zero()
    }

    // == Is Expired ==
    /// Checks whether the item has outlived its `max_age` at `now`.
    ///
    /// The boundary is inclusive of freshness: an item whose age equals its
    /// `max_age` is still served; only strictly older items are expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        !self.is_immutable() && self.age(now) > self.max_age
    }
}
