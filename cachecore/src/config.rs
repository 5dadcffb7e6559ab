use std::fmt;
use std::io::Read;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::SimError;

/// The widest address the simulator can decode
pub const MAX_ADDRESS_WIDTH: u32 = u64::BITS;

/// Caps the number of sets at 2^24 so the line array can always be allocated up front
pub const MAX_INDEX_BITS: u32 = 24;

fn default_address_width() -> u32 {
    32
}

/// A cache configuration as it is written down, usually resulting from parsing JSON.
///
/// Nothing here is checked; convert it into a [`CacheConfiguration`] before simulating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub mapping: Mapping,
    pub offset_bits: u32,
    pub index_bits: u32,
    pub alloc_policy: AllocPolicy,
    pub write_policy: WritePolicy,
    #[serde(default = "default_address_width")]
    pub address_width: u32,
}

/// How the index field selects candidate lines - direct mapped (1 way) or 2 way set associative
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Mapping {
    #[serde(alias = "direct", alias = "direct-mapped")]
    DirectMapped,
    #[serde(alias = "2way", alias = "set-associative")]
    SetAssociative,
}

impl Mapping {
    /// Associativity is fixed by the mapping scheme, it is never configured separately
    pub fn ways(self) -> usize {
        match self {
            Mapping::DirectMapped => 1,
            Mapping::SetAssociative => 2,
        }
    }
}

/// Whether a write miss installs a line
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum AllocPolicy {
    #[serde(alias = "write-allocate", alias = "wa")]
    WriteAllocate,
    #[serde(alias = "write-no-allocate", alias = "wna")]
    WriteNoAllocate,
}

/// Whether writes reach backing storage immediately or only when a dirty line is evicted
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum WritePolicy {
    #[serde(alias = "write-through", alias = "wt")]
    WriteThrough,
    #[serde(alias = "write-back", alias = "wb")]
    WriteBack,
}

impl FromStr for Mapping {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" | "direct-mapped" | "directmapped" => Ok(Mapping::DirectMapped),
            "2way" | "set-associative" | "setassociative" => Ok(Mapping::SetAssociative),
            other => Err(SimError::config(format!("unknown mapping scheme '{other}'"))),
        }
    }
}

impl FromStr for AllocPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wa" | "write-allocate" | "writeallocate" => Ok(AllocPolicy::WriteAllocate),
            "wna" | "write-no-allocate" | "writenoallocate" => Ok(AllocPolicy::WriteNoAllocate),
            other => Err(SimError::config(format!("unknown allocation policy '{other}'"))),
        }
    }
}

impl FromStr for WritePolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wt" | "write-through" | "writethrough" => Ok(WritePolicy::WriteThrough),
            "wb" | "write-back" | "writeback" => Ok(WritePolicy::WriteBack),
            other => Err(SimError::config(format!("unknown write policy '{other}'"))),
        }
    }
}

/// A validated cache geometry. Immutable once constructed.
///
/// The tag width is always derived from the address width and the two configured field widths.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CacheConfiguration {
    mapping: Mapping,
    offset_bits: u32,
    index_bits: u32,
    alloc_policy: AllocPolicy,
    write_policy: WritePolicy,
    address_width: u32,
}

impl CacheConfiguration {
    /// Builds a configuration, failing fast if the field widths can't fit in the address
    ///
    /// # Examples
    ///
    /// ```
    /// use cachecore::config::{AllocPolicy, CacheConfiguration, Mapping, WritePolicy};
    /// let config = CacheConfiguration::new(Mapping::SetAssociative, 4, 6, AllocPolicy::WriteAllocate, WritePolicy::WriteBack, 32).unwrap();
    /// assert_eq!(config.sets(), 64);
    /// assert_eq!(config.tag_bits(), 22);
    /// assert!(CacheConfiguration::new(Mapping::DirectMapped, 20, 20, AllocPolicy::WriteAllocate, WritePolicy::WriteBack, 32).is_err());
    /// ```
    pub fn new(
        mapping: Mapping,
        offset_bits: u32,
        index_bits: u32,
        alloc_policy: AllocPolicy,
        write_policy: WritePolicy,
        address_width: u32,
    ) -> Result<Self, SimError> {
        if address_width == 0 || address_width > MAX_ADDRESS_WIDTH {
            return Err(SimError::config(format!(
                "address width must be between 1 and {MAX_ADDRESS_WIDTH} bits, got {address_width}"
            )));
        }
        if index_bits > MAX_INDEX_BITS {
            return Err(SimError::config(format!(
                "{index_bits} index bits is more than the supported maximum of {MAX_INDEX_BITS}"
            )));
        }
        if offset_bits.saturating_add(index_bits) > address_width {
            return Err(SimError::config(format!(
                "{offset_bits} offset bits and {index_bits} index bits don't fit in a {address_width} bit address"
            )));
        }
        Ok(Self {
            mapping,
            offset_bits,
            index_bits,
            alloc_policy,
            write_policy,
            address_width,
        })
    }

    pub fn mapping(&self) -> Mapping {
        self.mapping
    }

    pub fn ways(&self) -> usize {
        self.mapping.ways()
    }

    pub fn sets(&self) -> usize {
        1 << self.index_bits
    }

    pub fn offset_bits(&self) -> u32 {
        self.offset_bits
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub fn tag_bits(&self) -> u32 {
        self.address_width - self.offset_bits - self.index_bits
    }

    pub fn address_width(&self) -> u32 {
        self.address_width
    }

    pub fn alloc_policy(&self) -> AllocPolicy {
        self.alloc_policy
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Rejects addresses with bits set at or above the configured address width
    pub fn check_address(&self, address: u64) -> Result<u64, SimError> {
        check_address_width(address, self.address_width)
    }
}

pub(crate) fn check_address_width(address: u64, width: u32) -> Result<u64, SimError> {
    match address.checked_shr(width) {
        Some(high) if high != 0 => Err(SimError::AddressOutOfRange { address, width, line: None }),
        _ => Ok(address),
    }
}

impl TryFrom<CacheConfig> for CacheConfiguration {
    type Error = SimError;

    fn try_from(value: CacheConfig) -> Result<Self, Self::Error> {
        CacheConfiguration::new(
            value.mapping,
            value.offset_bits,
            value.index_bits,
            value.alloc_policy,
            value.write_policy,
            value.address_width,
        )
    }
}

impl fmt::Display for CacheConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}, {} sets x {} ways, {} offset / {} index / {} tag bits, {:?}, {:?}",
            self.mapping,
            self.sets(),
            self.ways(),
            self.offset_bits,
            self.index_bits,
            self.tag_bits(),
            self.alloc_policy,
            self.write_policy
        )
    }
}

/// Reads and validates a JSON configuration
///
/// Unknown mapping or policy tags are reported as invalid configurations, as are field widths
/// which overflow the address
pub fn load_config<R: Read>(reader: R) -> Result<CacheConfiguration, SimError> {
    let raw: CacheConfig = serde_json::from_reader(reader)
        .map_err(|e| SimError::config(format!("couldn't parse the config: {e}")))?;
    raw.try_into()
}
