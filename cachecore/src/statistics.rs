use serde::{Deserialize, Serialize};
use crate::trace::Operation;

/// The counters collected over a simulation. Every counter only ever increases.
///
/// Every access increments exactly one of the four hit/miss counters, write backs and write
/// throughs are counted on top of that
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccessStatistics {
    pub read_hits: u64,
    pub write_hits: u64,
    pub read_misses: u64,
    pub write_misses: u64,
    pub write_backs: u64,
    pub write_throughs: u64,
}

impl AccessStatistics {
    /// Accounts one access as a hit or a miss
    #[inline]
    pub fn record(&mut self, operation: Operation, hit: bool) {
        match (operation, hit) {
            (Operation::Read, true) => self.read_hits += 1,
            (Operation::Read, false) => self.read_misses += 1,
            (Operation::Write, true) => self.write_hits += 1,
            (Operation::Write, false) => self.write_misses += 1,
        }
    }

    #[inline]
    pub fn record_write_back(&mut self) {
        self.write_backs += 1;
    }

    #[inline]
    pub fn record_write_through(&mut self) {
        self.write_throughs += 1;
    }

    pub fn hits(&self) -> u64 {
        self.read_hits + self.write_hits
    }

    pub fn misses(&self) -> u64 {
        self.read_misses + self.write_misses
    }

    pub fn reads(&self) -> u64 {
        self.read_hits + self.read_misses
    }

    pub fn writes(&self) -> u64 {
        self.write_hits + self.write_misses
    }

    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// The fraction of accesses which hit, or None if there were no accesses at all
    ///
    /// # Examples
    ///
    /// ```
    /// use cachecore::statistics::AccessStatistics;
    /// assert_eq!(AccessStatistics::default().hit_rate(), None);
    /// let stats = AccessStatistics { read_hits: 1, read_misses: 3, ..Default::default() };
    /// assert_eq!(stats.hit_rate(), Some(0.25));
    /// ```
    pub fn hit_rate(&self) -> Option<f64> {
        self.ratio(self.hits())
    }

    /// The fraction of accesses which missed, or None if there were no accesses at all
    pub fn miss_rate(&self) -> Option<f64> {
        self.ratio(self.misses())
    }

    fn ratio(&self, count: u64) -> Option<f64> {
        match self.total_accesses() {
            0 => None,
            total => Some(count as f64 / total as f64),
        }
    }

    /// Snapshots the counters along with the derived rates, ready to be serialised
    pub fn report(&self) -> StatisticsReport {
        StatisticsReport {
            counters: *self,
            total_accesses: self.total_accesses(),
            hit_rate: self.hit_rate(),
        }
    }
}

/// The result of a run. Can be serialised to the output format
///
/// A run with no accesses has no hit rate, which serialises as `null`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    #[serde(flatten)]
    pub counters: AccessStatistics,
    pub total_accesses: u64,
    pub hit_rate: Option<f64>,
}
