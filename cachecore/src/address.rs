use crate::config::CacheConfiguration;

/// Splits addresses into set index and tag using the configured field widths.
///
/// Bit 0 is the least significant bit. The offset occupies bits `[0, offset_bits)`, the index
/// the next `index_bits` bits, and the tag everything above that. The masks and shifts are
/// computed once so decoding is a couple of shifts and an and.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AddressDecoder {
    offset_bits: u32,
    index_mask: u64,
    tag_shift: u32,
}

impl AddressDecoder {
    pub fn new(config: &CacheConfiguration) -> Self {
        Self {
            offset_bits: config.offset_bits(),
            index_mask: (1u64 << config.index_bits()) - 1,
            tag_shift: config.offset_bits() + config.index_bits(),
        }
    }

    /// Converts an address into a set index and a tag
    ///
    /// The index is aligned so it can be used directly to pick a set. The tag is shifted down,
    /// so two addresses in the same set compare equal iff they are in the same line.
    ///
    /// The address must fit in the configured address width, see
    /// [`CacheConfiguration::check_address`]
    ///
    /// returns: (usize, u64)
    #[inline]
    pub fn decode(&self, address: u64) -> (usize, u64) {
        // Shifting by the full width is valid configuration (e.g. a 64 bit offset), which plain
        // shifts would reject
        let index = address.checked_shr(self.offset_bits).unwrap_or(0) & self.index_mask;
        let tag = address.checked_shr(self.tag_shift).unwrap_or(0);
        (index as usize, tag)
    }
}

/// Decodes a single address without keeping a decoder around
///
/// # Examples
///
/// ```
/// use cachecore::address::decode;
/// use cachecore::config::{AllocPolicy, CacheConfiguration, Mapping, WritePolicy};
/// let config = CacheConfiguration::new(Mapping::DirectMapped, 2, 1, AllocPolicy::WriteAllocate, WritePolicy::WriteBack, 32).unwrap();
/// assert_eq!(decode(0x04, &config), (1, 0));
/// assert_eq!(decode(0x40, &config), (0, 8));
/// ```
pub fn decode(address: u64, config: &CacheConfiguration) -> (usize, u64) {
    AddressDecoder::new(config).decode(address)
}
