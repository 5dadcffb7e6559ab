use std::error::Error;
use std::thread;
use crate::config::{AllocPolicy, Mapping, WritePolicy};
use crate::error::SimError;
use crate::replacement_policies::NoPolicy;
use crate::simulator::{simulate, try_simulate, CacheSimulator};
use crate::statistics::AccessStatistics;
use crate::trace::AccessRecord;
use crate::util::random_trace;
use super::{all_configs, config};

#[test]
fn dirty_line_is_written_back_on_eviction() {
    // 8 byte lines, so 0x00 and 0x04 share a line, and 0x40 lands in the same set with another tag
    let config = config(Mapping::DirectMapped, 3, 1, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    let mut simulator = CacheSimulator::new(&config);

    let first = simulator.access(AccessRecord::read(0x00));
    assert!(!first.hit);
    assert_eq!((first.set, first.tag), (0, 0));
    assert!(first.allocated());

    let second = simulator.access(AccessRecord::write(0x04));
    assert!(second.hit);
    assert!(simulator.store().line_at(0, 0).dirty);

    let third = simulator.access(AccessRecord::read(0x40));
    assert!(!third.hit);
    assert_eq!(third.set, 0);
    assert!(third.wrote_back());
    assert!(!simulator.store().line_at(0, 0).dirty);

    let expected = AccessStatistics {
        read_hits: 0,
        write_hits: 1,
        read_misses: 2,
        write_misses: 0,
        write_backs: 1,
        write_throughs: 0,
    };
    assert_eq!(*simulator.statistics(), expected);
}

#[test]
fn no_allocate_write_miss_leaves_store_untouched() {
    let config = config(Mapping::DirectMapped, 2, 2, AllocPolicy::WriteNoAllocate, WritePolicy::WriteBack);
    let mut simulator = CacheSimulator::new(&config);
    let before = simulator.store().clone();

    let outcome = simulator.access(AccessRecord::write(0x10));
    assert!(!outcome.hit);
    assert!(!outcome.allocated());
    assert!(outcome.write_through);
    assert_eq!(*simulator.store(), before);
    assert_eq!(simulator.valid_line_count(), 0);

    let stats = simulator.statistics();
    assert_eq!(stats.write_misses, 1);
    assert_eq!(stats.write_throughs, 1);
    assert_eq!(stats.total_accesses(), 1);
}

#[test]
fn round_robin_evicts_first_filled_way() {
    // One set of two ways, so every address is tag = address >> 2
    let config = config(Mapping::SetAssociative, 2, 0, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    let mut simulator = CacheSimulator::new(&config);

    assert_eq!(simulator.access(AccessRecord::read(0x0)).installation.map(|i| i.way), Some(0));
    assert_eq!(simulator.store().set_for(0).next_victim(), 1);
    assert_eq!(simulator.access(AccessRecord::read(0x4)).installation.map(|i| i.way), Some(1));
    assert_eq!(simulator.store().set_for(0).next_victim(), 0);

    let third = simulator.access(AccessRecord::read(0x8)).installation.unwrap();
    assert_eq!((third.way, third.evicted_tag), (0, Some(0)));
    let fourth = simulator.access(AccessRecord::read(0xC)).installation.unwrap();
    assert_eq!((fourth.way, fourth.evicted_tag), (1, Some(1)));

    assert!(simulator.access(AccessRecord::read(0x8)).hit);
    let sixth = simulator.access(AccessRecord::read(0x0)).installation.unwrap();
    assert_eq!((sixth.way, sixth.evicted_tag), (0, Some(2)));
}

#[test]
fn hits_do_not_move_the_cursor() {
    let config = config(Mapping::SetAssociative, 2, 0, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    let mut simulator = CacheSimulator::new(&config);
    simulator.access(AccessRecord::read(0x0));
    simulator.access(AccessRecord::read(0x4));
    // True LRU would evict tag 1 after this, round robin still picks way 0
    assert!(simulator.access(AccessRecord::read(0x0)).hit);
    let evicted = simulator.access(AccessRecord::read(0x8)).installation.unwrap();
    assert_eq!((evicted.way, evicted.evicted_tag), (0, Some(0)));
    assert!(simulator.store().lookup(0, 1));
    assert!(!simulator.store().lookup(0, 0));
}

#[test]
fn write_hit_under_no_allocate_is_written_back_later() {
    // A single line
    let config = config(Mapping::DirectMapped, 2, 0, AllocPolicy::WriteNoAllocate, WritePolicy::WriteBack);
    let stats = simulate(&config, [
        AccessRecord::read(0x0),
        AccessRecord::write(0x0),
        AccessRecord::write(0x4),
        AccessRecord::read(0x4),
    ]);
    let expected = AccessStatistics {
        read_hits: 0,
        write_hits: 1,
        read_misses: 2,
        write_misses: 1,
        write_backs: 1,
        write_throughs: 1,
    };
    assert_eq!(stats, expected);
}

#[test]
fn write_allocate_fill_from_a_write_is_dirty() {
    let config = config(Mapping::DirectMapped, 2, 0, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    let mut simulator = CacheSimulator::new(&config);
    simulator.access(AccessRecord::write(0x0));
    assert_eq!(simulator.dirty_line_count(), 1);
    let outcome = simulator.access(AccessRecord::read(0x4));
    assert!(outcome.wrote_back());
    let stats = simulator.statistics();
    assert_eq!((stats.write_misses, stats.read_misses, stats.write_backs, stats.write_throughs), (1, 1, 1, 0));
}

#[test]
fn write_through_never_dirties_lines() {
    let config = config(Mapping::DirectMapped, 2, 0, AllocPolicy::WriteAllocate, WritePolicy::WriteThrough);
    let mut simulator = CacheSimulator::new(&config);
    let outcome = simulator.access(AccessRecord::write(0x0));
    assert!(outcome.allocated());
    assert!(outcome.write_through);
    assert_eq!(simulator.valid_line_count(), 1);
    assert_eq!(simulator.dirty_line_count(), 0);
    assert!(!simulator.access(AccessRecord::read(0x4)).wrote_back());
    assert_eq!(simulator.statistics().write_throughs, 1);
}

#[test]
fn every_access_is_a_hit_or_a_miss() {
    let trace = random_trace(7, 20_000, 16, 30);
    for config in all_configs(3, 4) {
        let stats = simulate(&config, trace.iter().copied());
        assert_eq!(stats.total_accesses(), trace.len() as u64, "{config}");
        assert_eq!(stats.read_hits + stats.read_misses + stats.write_hits + stats.write_misses, trace.len() as u64);
    }
}

#[test]
fn write_through_counts_every_write() {
    let trace = random_trace(11, 20_000, 14, 40);
    for config in all_configs(2, 5).into_iter().filter(|c| c.write_policy() == WritePolicy::WriteThrough) {
        let mut simulator = CacheSimulator::new(&config);
        let stats = *simulator.run(trace.iter().copied());
        assert_eq!(stats.write_throughs, stats.write_hits + stats.write_misses, "{config}");
        assert_eq!(stats.write_backs, 0);
        assert_eq!(simulator.dirty_line_count(), 0);
    }
}

#[test]
fn write_backs_only_happen_under_write_back() {
    let trace = random_trace(5, 10_000, 12, 50);
    for config in all_configs(2, 3) {
        let stats = simulate(&config, trace.iter().copied());
        match (config.alloc_policy(), config.write_policy()) {
            (_, WritePolicy::WriteThrough) => assert_eq!(stats.write_backs, 0),
            (AllocPolicy::WriteNoAllocate, WritePolicy::WriteBack) => assert_eq!(stats.write_throughs, stats.write_misses),
            (AllocPolicy::WriteAllocate, WritePolicy::WriteBack) => {
                assert_eq!(stats.write_throughs, 0);
                assert!(stats.write_backs > 0);
            }
        }
    }
}

#[test]
fn direct_mapped_policies_agree() {
    let trace = random_trace(3, 10_000, 12, 35);
    let config = config(Mapping::DirectMapped, 2, 4, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    let mut round_robin = CacheSimulator::new(&config);
    let mut fixed = CacheSimulator::with_policy(&config, NoPolicy);
    for record in &trace {
        assert_eq!(round_robin.access(*record), fixed.access(*record));
    }
    assert_eq!(round_robin.statistics(), fixed.statistics());
    assert_eq!(round_robin.store(), fixed.store());
}

#[test]
fn runs_can_be_split() {
    let trace = random_trace(13, 5_000, 16, 25);
    let config = config(Mapping::SetAssociative, 4, 3, AllocPolicy::WriteNoAllocate, WritePolicy::WriteBack);
    let whole = simulate(&config, trace.iter().copied());
    let mut simulator = CacheSimulator::new(&config);
    let (left, right) = trace.split_at(trace.len() / 3);
    simulator.run(left.iter().copied());
    simulator.run(right.iter().copied());
    assert_eq!(*simulator.statistics(), whole);
}

#[test]
fn simulators_share_no_state() {
    let trace = random_trace(17, 10_000, 16, 30);
    let configs = all_configs(3, 3);
    let sequential: Vec<AccessStatistics> = configs.iter().map(|c| simulate(c, trace.iter().copied())).collect();
    let parallel: Vec<AccessStatistics> = thread::scope(|scope| {
        let handles: Vec<_> = configs
            .iter()
            .map(|c| {
                let trace = &trace;
                scope.spawn(move || simulate(c, trace.iter().copied()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(sequential, parallel);
}

#[test]
fn empty_trace_has_no_hit_rate() -> Result<(), Box<dyn Error>> {
    let config = config(Mapping::DirectMapped, 2, 2, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    let stats = simulate(&config, Vec::new());
    assert_eq!(stats, AccessStatistics::default());
    assert_eq!(stats.hit_rate(), None);
    assert_eq!(stats.miss_rate(), None);
    let json = serde_json::to_value(stats.report())?;
    assert!(json["hit_rate"].is_null());
    assert_eq!(json["total_accesses"], 0);
    assert_eq!(json["write_backs"], 0);
    Ok(())
}

#[test]
fn report_carries_hit_rate() -> Result<(), Box<dyn Error>> {
    let config = config(Mapping::DirectMapped, 4, 0, AllocPolicy::WriteAllocate, WritePolicy::WriteThrough);
    let stats = simulate(&config, [AccessRecord::read(0x0), AccessRecord::read(0x4), AccessRecord::write(0x8), AccessRecord::read(0x10)]);
    assert_eq!(stats.hits(), 2);
    assert_eq!(stats.hit_rate(), Some(0.5));
    assert_eq!(stats.miss_rate(), Some(0.5));
    let json = serde_json::to_string(&stats.report())?;
    assert!(json.contains("\"hit_rate\":0.5"));
    Ok(())
}

#[test]
fn try_simulate_stops_at_the_first_error() {
    let config = config(Mapping::DirectMapped, 2, 2, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    let accesses = || vec![
        Ok(AccessRecord::read(0x0)),
        AccessRecord::parse("X 0x4"),
        Ok(AccessRecord::read(0x8)),
    ];
    assert!(matches!(try_simulate(&config, accesses()), Err(SimError::MalformedAccess { .. })));

    let mut simulator = CacheSimulator::new(&config);
    assert!(simulator.try_run(accesses()).is_err());
    assert_eq!(simulator.statistics().total_accesses(), 1);

    let skipped = try_simulate(&config, vec![Ok(AccessRecord::read(0x0)), Ok(AccessRecord::read(0x0))]);
    assert_eq!(skipped.map(|s| s.read_hits).ok(), Some(1));
}

#[test]
#[should_panic(expected = "can't manage 2 way sets")]
fn fixed_way_policy_rejects_two_way_sets() {
    let config = config(Mapping::SetAssociative, 2, 2, AllocPolicy::WriteAllocate, WritePolicy::WriteBack);
    CacheSimulator::with_policy(&config, NoPolicy);
}
