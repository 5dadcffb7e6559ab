use thiserror::Error;

/// Everything that can go wrong before or around a simulation run.
///
/// All of these are raised at the configuration and trace decoding boundaries; replaying an
/// already validated access stream cannot fail.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid cache configuration: {0}")]
    InvalidConfiguration(String),

    /// `line` is the 1-based trace line, when the record came from a trace
    #[error("malformed access{}: {reason}", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    MalformedAccess { line: Option<usize>, reason: String },

    /// `line` is the 1-based trace line, when the address came from a trace
    #[error("address {address:#x}{} does not fit in a {width} bit address", .line.map(|l| format!(" on line {l}")).unwrap_or_default())]
    AddressOutOfRange { address: u64, width: u32, line: Option<usize> },

    #[error("couldn't read the trace: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(reason.into())
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        SimError::MalformedAccess { line: None, reason: reason.into() }
    }

    /// Attaches a trace line number to record errors, other errors are left as they are
    pub(crate) fn at_line(self, line_number: usize) -> Self {
        match self {
            SimError::MalformedAccess { reason, .. } => SimError::MalformedAccess { line: Some(line_number), reason },
            SimError::AddressOutOfRange { address, width, .. } => SimError::AddressOutOfRange { address, width, line: Some(line_number) },
            other => other,
        }
    }
}
