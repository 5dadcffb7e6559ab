use std::time::{Duration, Instant};
use tracing::{debug, info, trace};
use crate::address::AddressDecoder;
use crate::cache::CacheStore;
use crate::config::{AllocPolicy, CacheConfiguration, WritePolicy};
use crate::error::SimError;
use crate::replacement_policies::{Installation, ReplacementEngine, ReplacementPolicy, RoundRobin};
use crate::statistics::AccessStatistics;
use crate::trace::{AccessRecord, Operation};

/// The simulator replays accesses against one cache, and collects the statistics.
///
/// It owns all of its state, so any number of simulators can run side by side. It supports
/// calling run multiple times, and will carry the cache state, the time taken to simulate, and
/// the statistics over between calls
pub struct CacheSimulator<R: ReplacementPolicy = RoundRobin> {
    config: CacheConfiguration,
    decoder: AddressDecoder,
    store: CacheStore,
    engine: ReplacementEngine<R>,
    statistics: AccessStatistics,
    simulation_time: Duration,
}

/// Everything that happened to a single access
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AccessOutcome {
    pub set: usize,
    pub tag: u64,
    pub hit: bool,
    /// Present iff the access missed and was allocated a line
    pub installation: Option<Installation>,
    pub write_through: bool,
}

impl AccessOutcome {
    pub fn allocated(&self) -> bool {
        self.installation.is_some()
    }

    pub fn wrote_back(&self) -> bool {
        self.installation.map_or(false, |installation| installation.write_back)
    }
}

impl CacheSimulator<RoundRobin> {

    /// Creates a new simulator for a given configuration, with an empty cache
    ///
    /// # Arguments
    ///
    /// * `config`: A validated cache configuration
    ///
    /// returns: CacheSimulator
    pub fn new(config: &CacheConfiguration) -> Self {
        Self::with_policy(config, RoundRobin)
    }
}

impl<R: ReplacementPolicy> CacheSimulator<R> {
    /// Creates a simulator with a specific replacement policy
    ///
    /// # Panics
    ///
    /// If the policy can't fill every way of the configured sets
    pub fn with_policy(config: &CacheConfiguration, policy: R) -> Self {
        assert!(
            policy.supports_ways(config.ways()),
            "replacement policy can't manage {} way sets",
            config.ways()
        );
        debug!(%config, "Building cache simulator");
        Self {
            config: config.clone(),
            decoder: AddressDecoder::new(config),
            store: CacheStore::new(config),
            engine: ReplacementEngine::new(policy),
            statistics: AccessStatistics::default(),
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Processes a single access: decode, lookup, account, and allocate if needed
    ///
    /// A write miss under write no allocate is counted but never touches the store
    pub fn access(&mut self, record: AccessRecord) -> AccessOutcome {
        debug_assert!(self.config.check_address(record.address).is_ok());
        let operation = record.operation;
        let write_policy = self.config.write_policy();
        let alloc_policy = self.config.alloc_policy();

        let (set_index, tag) = self.decoder.decode(record.address);
        let set = self.store.set_for_mut(set_index);
        let hit_way = set.find(tag);
        let hit = hit_way.is_some();
        self.statistics.record(operation, hit);

        if let (Some(way), Operation::Write, WritePolicy::WriteBack) = (hit_way, operation, write_policy) {
            set.line_mut(way).dirty = true;
        }

        let allocate = !hit && (operation == Operation::Read || alloc_policy == AllocPolicy::WriteAllocate);
        let installation = if allocate {
            Some(self.engine.install(set, operation, tag, write_policy))
        } else {
            None
        };
        if installation.map_or(false, |installation| installation.write_back) {
            self.statistics.record_write_back();
        }

        // Write through sends every write on, a no allocate miss has nowhere else to go
        let write_through = operation == Operation::Write
            && (write_policy == WritePolicy::WriteThrough || (!hit && alloc_policy == AllocPolicy::WriteNoAllocate));
        if write_through {
            self.statistics.record_write_through();
        }

        trace!(%record, set = set_index, tag, hit, allocated = allocate, "Access");
        AccessOutcome { set: set_index, tag, hit, installation, write_through }
    }

    /// Simulates the cache over a sequence of accesses, strictly in order
    ///
    /// The sequence is consumed lazily, so it can be arbitrarily long
    ///
    /// returns: &AccessStatistics, the statistics accumulated so far
    pub fn run<I: IntoIterator<Item = AccessRecord>>(&mut self, accesses: I) -> &AccessStatistics {
        let start = Instant::now();
        for record in accesses {
            self.access(record);
        }
        self.finish_run(start);
        &self.statistics
    }

    /// Like [`CacheSimulator::run`], but for accesses which may have failed to parse
    ///
    /// Stops at the first error. Everything before it has already been simulated, to skip bad
    /// records instead filter them out before calling run.
    pub fn try_run<I: IntoIterator<Item = Result<AccessRecord, SimError>>>(&mut self, accesses: I) -> Result<&AccessStatistics, SimError> {
        let start = Instant::now();
        let mut result = Ok(());
        for record in accesses {
            match record {
                Ok(record) => {
                    self.access(record);
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.finish_run(start);
        result.map(|_| &self.statistics)
    }

    fn finish_run(&mut self, start: Instant) {
        self.simulation_time += start.elapsed();
        info!(
            accesses = self.statistics.total_accesses(),
            hits = self.statistics.hits(),
            write_backs = self.statistics.write_backs,
            write_throughs = self.statistics.write_throughs,
            "Simulation finished"
        );
    }

    pub fn config(&self) -> &CacheConfiguration {
        &self.config
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn statistics(&self) -> &AccessStatistics {
        &self.statistics
    }

    pub fn into_statistics(self) -> AccessStatistics {
        self.statistics
    }

    /// Gets the wall-clock execution time for processing
    pub fn execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of valid lines in the cache
    pub fn valid_line_count(&self) -> usize {
        self.store.valid_line_count()
    }

    /// Gets the number of dirty lines still waiting to be written back
    pub fn dirty_line_count(&self) -> usize {
        self.store.dirty_line_count()
    }
}

/// Replays a whole trace against a fresh cache and returns the final statistics
///
/// # Examples
///
/// ```
/// use cachecore::config::{AllocPolicy, CacheConfiguration, Mapping, WritePolicy};
/// use cachecore::simulator::simulate;
/// use cachecore::trace::AccessRecord;
/// let config = CacheConfiguration::new(Mapping::DirectMapped, 4, 2, AllocPolicy::WriteAllocate, WritePolicy::WriteThrough, 32).unwrap();
/// let stats = simulate(&config, [AccessRecord::read(0x10), AccessRecord::write(0x14)]);
/// assert_eq!((stats.read_misses, stats.write_hits, stats.write_throughs), (1, 1, 1));
/// ```
pub fn simulate<I: IntoIterator<Item = AccessRecord>>(config: &CacheConfiguration, accesses: I) -> AccessStatistics {
    let mut simulator = CacheSimulator::new(config);
    simulator.run(accesses);
    simulator.into_statistics()
}

/// Replays a trace which may contain malformed records, stopping at the first one
pub fn try_simulate<I: IntoIterator<Item = Result<AccessRecord, SimError>>>(config: &CacheConfiguration, accesses: I) -> Result<AccessStatistics, SimError> {
    let mut simulator = CacheSimulator::new(config);
    simulator.try_run(accesses)?;
    Ok(simulator.into_statistics())
}
