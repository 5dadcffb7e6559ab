use tracing::debug;
use crate::cache::CacheSet;
use crate::config::WritePolicy;
use crate::trace::Operation;

/// A trait for the victim selection of a set. Used to parameterise the ReplacementEngine.
///
/// Policies keep no state of their own, the cursor lives in each [`CacheSet`], so a policy can be
/// shared by every set in the store
pub trait ReplacementPolicy {
    /// Picks the way to fill when a line needs added to the set
    ///
    /// Implementations must prefer an invalid way over evicting a valid one
    fn select_way(&self, set: &CacheSet) -> usize;

    /// Updates the set's cursor after a line has been installed in `way`
    ///
    /// Not applicable for some policies, a default which does nothing is provided
    fn update_on_install(&self, _set: &mut CacheSet, _way: usize) {}

    /// Whether the policy can fill every way of a set with this many ways
    fn supports_ways(&self, _ways: usize) -> bool {
        true
    }
}

/// NoPolicy is used for direct mapped caches. It always fills way 0, and never touches the cursor
///
/// Running a direct mapped trace with it must give exactly the same results as [`RoundRobin`],
/// whose cursor never leaves 0 when there is one way
#[derive(Debug, Default, Copy, Clone)]
pub struct NoPolicy;

impl ReplacementPolicy for NoPolicy {
    fn select_way(&self, _set: &CacheSet) -> usize {
        0
    }

    // Way 1 of a two way set would never be filled
    fn supports_ways(&self, ways: usize) -> bool {
        ways == 1
    }
}

/// Round robin replacement: fill the lowest invalid way, otherwise evict whichever way the set's
/// cursor points at. The cursor moves to the way after the one just installed.
///
/// This is not LRU, hits never move the cursor
#[derive(Debug, Default, Copy, Clone)]
pub struct RoundRobin;

impl ReplacementPolicy for RoundRobin {
    fn select_way(&self, set: &CacheSet) -> usize {
        set.first_invalid().unwrap_or_else(|| set.next_victim())
    }

    fn update_on_install(&self, set: &mut CacheSet, way: usize) {
        set.set_next_victim((way + 1) % set.ways());
    }
}

/// What happened when a line was installed
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Installation {
    /// The way the new line went into
    pub way: usize,
    /// Tag of the valid line which was replaced, if any
    pub evicted_tag: Option<u64>,
    /// True iff a dirty line was evicted under write back, and so had to reach backing storage
    pub write_back: bool,
}

/// Installs lines into sets, parameterised by a replacement policy
///
/// As the engine is monomorphised, the compiler can inline the policy completely
#[derive(Debug, Default, Copy, Clone)]
pub struct ReplacementEngine<R: ReplacementPolicy> {
    policy: R,
}

impl<R: ReplacementPolicy> ReplacementEngine<R> {
    pub fn new(policy: R) -> Self {
        Self { policy }
    }

    /// Installs `tag` into the set on behalf of `operation`
    ///
    /// The new line is dirty iff the access is a write under write back. If the replaced line
    /// was dirty under write back, the installation reports a write back.
    ///
    /// # Arguments
    ///
    /// * `set`: The set the address decoded to
    /// * `operation`: The access which missed
    /// * `tag`: The tag of the missed address
    /// * `write_policy`: Decides whether dirty state is tracked at all
    ///
    /// returns: Installation
    pub fn install(&self, set: &mut CacheSet, operation: Operation, tag: u64, write_policy: WritePolicy) -> Installation {
        let way = self.policy.select_way(set);
        let line = set.line_mut(way);
        let evicted_tag = line.valid.then_some(line.tag);
        let write_back = line.valid && line.dirty && write_policy == WritePolicy::WriteBack;
        if write_back {
            debug!(way, evicted_tag = line.tag, "Evicting dirty line");
        }
        line.valid = true;
        line.tag = tag;
        line.dirty = operation == Operation::Write && write_policy == WritePolicy::WriteBack;
        self.policy.update_on_install(set, way);
        Installation { way, evicted_tag, write_back }
    }
}
