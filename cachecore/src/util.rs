use crate::trace::{AccessRecord, Operation};

/// A small xorshift generator, so synthetic traces are identical on every run and platform
#[derive(Debug, Clone)]
pub struct XorShift {
    state: u64,
}

impl XorShift {
    pub fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift
        Self { state: seed.max(1) }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// Generates `length` pseudo-random accesses with addresses below `2^address_width`
///
/// Roughly `write_percent`% of the accesses are writes
///
/// # Panics
///
/// If `address_width` is more than 64
pub fn random_trace(seed: u64, length: usize, address_width: u32, write_percent: u64) -> Vec<AccessRecord> {
    assert!(address_width <= u64::BITS, "addresses can be at most 64 bits wide, got {address_width}");
    let mut rng = XorShift::new(seed);
    let mask = u64::MAX.checked_shr(u64::BITS - address_width).unwrap_or(0);
    (0..length)
        .map(|_| {
            let operation = if rng.next_u64() % 100 < write_percent { Operation::Write } else { Operation::Read };
            AccessRecord::new(operation, rng.next_u64() & mask)
        })
        .collect()
}

/// Walks `span` bytes with the given stride, `passes` times, alternating reads and writes
///
/// # Panics
///
/// If `stride` is zero
pub fn strided_trace(span: u64, stride: u64, passes: usize) -> Vec<AccessRecord> {
    assert!(stride > 0, "a strided trace needs a non-zero stride");
    (0..passes)
        .flat_map(move |_| (0..span).step_by(stride as usize))
        .enumerate()
        .map(|(i, address)| {
            let operation = if i % 2 == 0 { Operation::Read } else { Operation::Write };
            AccessRecord::new(operation, address)
        })
        .collect()
}

/// Renders accesses in the text trace format
pub fn to_trace_text(accesses: &[AccessRecord]) -> String {
    accesses.iter().map(|a| format!("{a}\n")).collect()
}
