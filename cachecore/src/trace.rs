use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use lazy_static::lazy_static;
use regex::Regex;
use crate::config::check_address_width;
use crate::error::SimError;

lazy_static! {
    // An operation token, then a hex address with an optional 0x prefix
    static ref ACCESS_PATTERN: Regex =
        Regex::new(r"^\s*(?P<op>\S+)\s+(?:0[xX])?(?P<address>[0-9a-fA-F]+)\s*$").unwrap();
}

/// The kind of memory access
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operation {
    Read,
    Write,
}

impl FromStr for Operation {
    type Err = SimError;

    /// Accepts `R`, `W`, `read` and `write` in any case. Never guesses for anything else.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "r" | "read" => Ok(Operation::Read),
            "w" | "write" => Ok(Operation::Write),
            _ => Err(SimError::malformed(format!("unknown operation '{s}'"))),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "R"),
            Operation::Write => write!(f, "W"),
        }
    }
}

/// One access from a trace
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AccessRecord {
    pub operation: Operation,
    pub address: u64,
}

impl AccessRecord {
    pub fn new(operation: Operation, address: u64) -> Self {
        Self { operation, address }
    }

    pub fn read(address: u64) -> Self {
        Self::new(Operation::Read, address)
    }

    pub fn write(address: u64) -> Self {
        Self::new(Operation::Write, address)
    }

    /// Parses a single trace line of the form `<operation> <hex address>`
    ///
    /// # Examples
    ///
    /// ```
    /// use cachecore::trace::{AccessRecord, Operation};
    /// let record = AccessRecord::parse("W 0x40").unwrap();
    /// assert_eq!(record, AccessRecord::new(Operation::Write, 0x40));
    /// assert_eq!(AccessRecord::parse("r ff").unwrap().address, 0xff);
    /// assert!(AccessRecord::parse("X 0x40").is_err());
    /// ```
    pub fn parse(line: &str) -> Result<Self, SimError> {
        let tokens = ACCESS_PATTERN
            .captures(line)
            .ok_or_else(|| SimError::malformed(format!("expected '<operation> <address>', got '{}'", line.trim())))?;
        let operation = tokens["op"].parse()?;
        let address = u64::from_str_radix(&tokens["address"], 16)
            .map_err(|e| SimError::malformed(format!("couldn't parse address '{}': {e}", &tokens["address"])))?;
        Ok(Self { operation, address })
    }
}

impl FromStr for AccessRecord {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:#x}", self.operation, self.address)
    }
}

/// Lazily reads access records from a text trace, one per line
///
/// Blank lines and lines starting with `#` are skipped. Errors carry the line they came from, and
/// it is up to the caller whether to skip them or stop. Reading is strictly sequential and the
/// reader never rewinds, so a trace can be arbitrarily long.
pub struct TraceReader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
    address_width: Option<u32>,
    finished: bool,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(64),
            line_number: 0,
            address_width: None,
            finished: false,
        }
    }

    /// Also rejects addresses which don't fit in `width` bits
    pub fn with_address_width(mut self, width: u32) -> Self {
        self.address_width = Some(width);
        self
    }

    /// The number of lines consumed so far
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn parse_current(&self, line: &str) -> Result<AccessRecord, SimError> {
        let record = AccessRecord::parse(line)?;
        if let Some(width) = self.address_width {
            check_address_width(record.address, width)?;
        }
        Ok(record)
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<AccessRecord, SimError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.buffer.clear();
            // Lines are read as bytes, so a line which isn't UTF-8 is one bad record rather than the
            // end of the trace
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => self.finished = true,
                Ok(_) => {
                    self.line_number += 1;
                    let record = match std::str::from_utf8(&self.buffer) {
                        Ok(text) => {
                            let line = text.trim();
                            if line.is_empty() || line.starts_with('#') {
                                continue;
                            }
                            self.parse_current(line)
                        }
                        Err(e) => Err(SimError::malformed(format!("line is not valid UTF-8: {e}"))),
                    };
                    return Some(record.map_err(|e| e.at_line(self.line_number)));
                }
                Err(e) => {
                    // An I/O error leaves the stream position unknown, there is nothing more to read
                    self.finished = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}
