use crate::config::CacheConfiguration;

/// A single cache line. Only the metadata is simulated, there is no data payload.
///
/// The tag of an invalid line is meaningless and is never compared
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CacheLine {
    pub valid: bool,
    pub dirty: bool,
    pub tag: u64,
}

/// The lines sharing one index value, plus the round robin cursor used to pick the next victim
///
/// The cursor alternates between 0 and 1 for two way sets, and is always 0 for direct mapped ones
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CacheSet {
    lines: Vec<CacheLine>,
    next_victim: usize,
}

impl CacheSet {
    pub fn new(ways: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); ways],
            next_victim: 0,
        }
    }

    pub fn ways(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn line(&self, way: usize) -> &CacheLine {
        &self.lines[way]
    }

    pub fn line_mut(&mut self, way: usize) -> &mut CacheLine {
        &mut self.lines[way]
    }

    pub fn next_victim(&self) -> usize {
        self.next_victim
    }

    pub fn set_next_victim(&mut self, way: usize) {
        debug_assert!(way < self.lines.len());
        self.next_victim = way;
    }

    /// Finds the way holding a valid line with this tag
    ///
    /// Tags are unique among the valid lines of a set, so the first match is the only match
    #[inline]
    pub fn find(&self, tag: u64) -> Option<usize> {
        self.lines.iter().position(|line| line.valid && line.tag == tag)
    }

    /// The lowest indexed way which doesn't hold a valid line yet
    #[inline]
    pub fn first_invalid(&self) -> Option<usize> {
        self.lines.iter().position(|line| !line.valid)
    }
}

/// The whole line array, `sets` sets of `ways` lines each
///
/// Created once from the configuration, and mutated in place for the lifetime of a simulation
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CacheStore {
    sets: Vec<CacheSet>,
}

impl CacheStore {
    pub fn new(config: &CacheConfiguration) -> Self {
        Self {
            sets: (0..config.sets()).map(|_| CacheSet::new(config.ways())).collect(),
        }
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    pub fn set_for(&self, set_index: usize) -> &CacheSet {
        &self.sets[set_index]
    }

    pub fn set_for_mut(&mut self, set_index: usize) -> &mut CacheSet {
        &mut self.sets[set_index]
    }

    pub fn line_at(&self, set_index: usize, way: usize) -> &CacheLine {
        self.sets[set_index].line(way)
    }

    pub fn line_at_mut(&mut self, set_index: usize, way: usize) -> &mut CacheLine {
        self.sets[set_index].line_mut(way)
    }

    /// Returns true on a cache hit, i.e. some valid line in the set holds the tag
    ///
    /// Doesn't update anything, replacement is round robin so hits don't affect it
    pub fn lookup(&self, set_index: usize, tag: u64) -> bool {
        self.sets[set_index].find(tag).is_some()
    }

    /// Gets the number of valid lines. Useful for analysing cache performance or debugging
    pub fn valid_line_count(&self) -> usize {
        self.lines().filter(|line| line.valid).count()
    }

    /// Gets the number of lines holding data which hasn't reached backing storage yet
    pub fn dirty_line_count(&self) -> usize {
        self.lines().filter(|line| line.valid && line.dirty).count()
    }

    fn lines(&self) -> impl Iterator<Item = &CacheLine> {
        self.sets.iter().flat_map(|set| set.lines.iter())
    }
}
