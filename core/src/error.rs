use crate::version::Version;
use thiserror::Error;

/// Reasons a filesystem label can be rejected before any tool is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("Label is too long")]
    TooLong,

    #[error("Label contains characters that cannot be encoded in Latin-1")]
    NotEncodable,
}

/// Reasons a filesystem UUID can be rejected before any tool is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UuidError {
    #[error("UUID must be 16 characters long")]
    WrongLength,

    #[error("UUID must be a lowercase hexadecimal number")]
    InvalidCharset,
}

#[derive(Debug, Error)]
pub enum FsError {
    #[error("The '{0}' utility is not available")]
    ToolMissing(String),

    #[error("Too low version of {tool}. At least {required} required.")]
    VersionTooLow {
        tool: String,
        required: Version,
        found: Option<Version>,
    },

    #[error("Failed to determine {tool} version from: {output}")]
    VersionUnparsable { tool: String, output: String },

    #[error("Filesystem '{fs}' doesn't support {operation}")]
    CapabilityUnsupported { fs: String, operation: String },

    #[error("'{tool}' failed with exit code {status}: {stderr}")]
    OperationFailed {
        tool: String,
        status: i32,
        stderr: String,
    },

    #[error("Invalid label: {0}")]
    InvalidLabel(#[from] LabelError),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] UuidError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(
        "Refusing to shrink the filesystem on '{device}' from {current} to {requested} sectors \
         without the safe option"
    )]
    UnsafeShrink {
        device: String,
        requested: u64,
        current: u64,
    },

    #[error("No filesystem detected on the device '{0}'")]
    NoFilesystem(String),

    #[error("The signature on the device '{device}' is '{found}', not '{expected}'")]
    UnexpectedFilesystem {
        device: String,
        expected: String,
        found: String,
    },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
