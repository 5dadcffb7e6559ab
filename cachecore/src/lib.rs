//! # CacheCore
//!
//! Cachecore is a library for simulating a single cache under different write policies
//!
//! It replays a sequence of reads and writes against a direct mapped or two way set associative
//! cache, using round robin replacement, and counts hits, misses, write backs, and write throughs
//! under every combination of write allocate / write no allocate and write through / write back
//!
//! The simulator itself never fails; configurations and traces are validated on the way in

/// Contains the address decoder, which splits addresses into set index and tag
pub mod address;

/// Contains the line store, sets, and lines
pub mod cache;

/// Contains the configuration types, both the raw JSON shape and the validated configuration
pub mod config;

/// Contains the error type shared by the whole library
pub mod error;

/// Contains helpers for reading trace files
pub mod io;

/// Contains the replacement policies and the engine which installs lines
pub mod replacement_policies;

/// Contains the simulator used to replay a trace with a given cache configuration
pub mod simulator;

/// Contains the statistics collected by a simulation
pub mod statistics;

/// Contains the access record type and the text trace reader
pub mod trace;

#[cfg(test)]
mod test;

/// Contains utilities for generating traces for tests and benchmarks.
pub mod util;

pub use config::CacheConfiguration;
pub use error::SimError;
pub use simulator::{simulate, try_simulate, CacheSimulator};
pub use statistics::AccessStatistics;
pub use trace::{AccessRecord, Operation};
