/// Result alias that carries the custom [`PosePlayerError`] type.
pub type Result<T> = std::result::Result<T, PosePlayerError>;

/// Common error type for the core crate.
///
/// Per-line problems found while parsing a table are reported as
/// [`LineDiagnostic`](crate::LineDiagnostic) values instead; this enum only
/// covers conditions that stop an operation as a whole.
#[derive(Debug, thiserror::Error)]
pub enum PosePlayerError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration file could not be decoded.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// No usable records were left after parsing.
    #[error("pose table contains no usable records")]
    EmptyTable,
    /// A joint value failed to parse while the strict numeric policy is active.
    #[error("unparsable numeric value at line {line}, column {column}")]
    UnparsableNumeric { line: usize, column: usize },
    /// Playback speed must be finite and non-negative.
    #[error("invalid playback speed {speed}")]
    InvalidSpeed { speed: f64 },
    /// Seek target lies outside the loaded records.
    #[error("frame index {index} is out of range for {len} records")]
    FrameOutOfRange { index: usize, len: usize },
    /// A joint name did not match any canonical joint.
    #[error("unknown joint `{name}`")]
    UnknownJoint { name: String },
}

impl PosePlayerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}
