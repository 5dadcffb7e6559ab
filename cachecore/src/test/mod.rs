use crate::config::{AllocPolicy, CacheConfiguration, Mapping, WritePolicy};

mod tests;

pub(crate) const ALL_POLICIES: [(AllocPolicy, WritePolicy); 4] = [
    (AllocPolicy::WriteAllocate, WritePolicy::WriteBack),
    (AllocPolicy::WriteAllocate, WritePolicy::WriteThrough),
    (AllocPolicy::WriteNoAllocate, WritePolicy::WriteBack),
    (AllocPolicy::WriteNoAllocate, WritePolicy::WriteThrough),
];

/// A 32 bit configuration, panicking if it is invalid
pub(crate) fn config(mapping: Mapping, offset_bits: u32, index_bits: u32, alloc: AllocPolicy, write: WritePolicy) -> CacheConfiguration {
    CacheConfiguration::new(mapping, offset_bits, index_bits, alloc, write, 32).unwrap()
}

/// Every combination of mapping and policies over the same geometry
pub(crate) fn all_configs(offset_bits: u32, index_bits: u32) -> Vec<CacheConfiguration> {
    [Mapping::DirectMapped, Mapping::SetAssociative]
        .iter()
        .flat_map(|&mapping| ALL_POLICIES.iter().map(move |&(alloc, write)| config(mapping, offset_bits, index_bits, alloc, write)))
        .collect()
}
