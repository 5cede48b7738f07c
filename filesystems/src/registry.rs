//! Static capability registry.
//!
//! One row set per filesystem type, declaring which external tool (and
//! minimum version, where the interface changed over time) each operation
//! category needs. Combinations absent from the table are structurally
//! unsupported and report `CapabilityUnsupported` -- distinct from a tool
//! that is merely not installed.

use crate::capability::{CapabilityMode, FilesystemType};
use fskit_core::{FsError, Version};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolRequirement {
    pub tool: &'static str,
    pub min_version: Option<Version>,
}

impl ToolRequirement {
    const fn new(tool: &'static str) -> Self {
        Self {
            tool,
            min_version: None,
        }
    }

    const fn at_least(tool: &'static str, version: Version) -> Self {
        Self {
            tool,
            min_version: Some(version),
        }
    }
}

// fsck.f2fs grew --dry-run in 1.11.0; resize.f2fs grew safe resizing in 1.12.0
const F2FS_MKFS: &[ToolRequirement] = &[ToolRequirement::new("mkfs.f2fs")];
const F2FS_WIPE: &[ToolRequirement] =
    &[ToolRequirement::new("wipefs"), ToolRequirement::new("blkid")];
const F2FS_QUERY: &[ToolRequirement] = &[ToolRequirement::new("dump.f2fs")];
const F2FS_CHECK: &[ToolRequirement] =
    &[ToolRequirement::at_least("fsck.f2fs", Version::new(1, 11, 0))];
const F2FS_REPAIR: &[ToolRequirement] =
    &[ToolRequirement::at_least("fsck.f2fs", Version::new(1, 11, 0))];
const F2FS_RESIZE: &[ToolRequirement] =
    &[ToolRequirement::at_least("resize.f2fs", Version::new(1, 12, 0))];

const UDF_MKFS: &[ToolRequirement] = &[ToolRequirement::new("mkudffs")];
const UDF_WIPE: &[ToolRequirement] =
    &[ToolRequirement::new("wipefs"), ToolRequirement::new("blkid")];
const UDF_QUERY: &[ToolRequirement] = &[ToolRequirement::new("udfinfo")];
const UDF_SET_LABEL: &[ToolRequirement] = &[ToolRequirement::new("udflabel")];
const UDF_SET_UUID: &[ToolRequirement] = &[ToolRequirement::new("udflabel")];

const F2FS_TABLE: &[(CapabilityMode, &[ToolRequirement])] = &[
    (CapabilityMode::MKFS, F2FS_MKFS),
    (CapabilityMode::WIPE, F2FS_WIPE),
    (CapabilityMode::QUERY, F2FS_QUERY),
    (CapabilityMode::CHECK, F2FS_CHECK),
    (CapabilityMode::REPAIR, F2FS_REPAIR),
    (CapabilityMode::RESIZE, F2FS_RESIZE),
];

const UDF_TABLE: &[(CapabilityMode, &[ToolRequirement])] = &[
    (CapabilityMode::MKFS, UDF_MKFS),
    (CapabilityMode::WIPE, UDF_WIPE),
    (CapabilityMode::QUERY, UDF_QUERY),
    (CapabilityMode::SET_LABEL, UDF_SET_LABEL),
    (CapabilityMode::SET_UUID, UDF_SET_UUID),
];

/// Look up the tool requirements for a single capability flag.
///
/// Passing a combined mask is a programmer error; availability checks
/// iterate over flags and query one at a time.
pub fn requirements_for(
    fs: FilesystemType,
    mode: CapabilityMode,
) -> Result<&'static [ToolRequirement], FsError> {
    assert_eq!(
        mode.bits().count_ones(),
        1,
        "requirements_for takes a single capability flag"
    );

    let table = match fs {
        FilesystemType::F2fs => F2FS_TABLE,
        FilesystemType::Udf => UDF_TABLE,
    };

    table
        .iter()
        .find(|(m, _)| *m == mode)
        .map(|(_, reqs)| *reqs)
        .ok_or_else(|| FsError::CapabilityUnsupported {
            fs: fs.to_string(),
            operation: mode.describe().to_string(),
        })
}

/// The full set of capability flags a filesystem type can ever offer,
/// regardless of what is installed.
pub fn supported_capabilities(fs: FilesystemType) -> CapabilityMode {
    CapabilityMode::all()
        .iter()
        .filter(|mode| requirements_for(fs, *mode).is_ok())
        .fold(CapabilityMode::empty(), |acc, mode| acc | mode)
}
