//! Filesystem types and the operation vocabulary they may support.

use bitflags::bitflags;
use fskit_core::FsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesystemType {
    F2fs,
    Udf,
}

impl FilesystemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilesystemType::F2fs => "f2fs",
            FilesystemType::Udf => "udf",
        }
    }
}

impl fmt::Display for FilesystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilesystemType {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f2fs" => Ok(FilesystemType::F2fs),
            "udf" => Ok(FilesystemType::Udf),
            other => Err(FsError::InvalidInput(format!(
                "Unknown filesystem type: '{}'",
                other
            ))),
        }
    }
}

bitflags! {
    /// Operation categories a filesystem type may or may not support.
    ///
    /// A request may combine several flags (CHECK | REPAIR share a tool);
    /// availability checks are conjunctive over the set bits, iterated in
    /// declaration order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilityMode: u32 {
        const MKFS      = 1 << 0;
        const WIPE      = 1 << 1;
        const QUERY     = 1 << 2;
        const CHECK     = 1 << 3;
        const REPAIR    = 1 << 4;
        const RESIZE    = 1 << 5;
        const SET_LABEL = 1 << 6;
        const SET_UUID  = 1 << 7;
    }
}

impl CapabilityMode {
    const NAMES: &'static [(CapabilityMode, &'static str, &'static str)] = &[
        (CapabilityMode::MKFS, "mkfs", "creating a new filesystem"),
        (CapabilityMode::WIPE, "wipe", "wiping signatures"),
        (CapabilityMode::QUERY, "query", "querying information"),
        (CapabilityMode::CHECK, "check", "checking"),
        (CapabilityMode::REPAIR, "repair", "repairing"),
        (CapabilityMode::RESIZE, "resize", "resizing"),
        (CapabilityMode::SET_LABEL, "set-label", "setting label"),
        (CapabilityMode::SET_UUID, "set-uuid", "setting UUID"),
    ];

    /// Human phrase used in "doesn't support ..." diagnostics.
    pub fn describe(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(flag, _, _)| *flag == self)
            .map_or("the requested operation", |(_, _, phrase)| *phrase)
    }
}

impl FromStr for CapabilityMode {
    type Err = FsError;

    /// Parse a comma-separated mode list, e.g. `"check,repair"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(CapabilityMode::empty(), |acc, name| {
                let flag = Self::NAMES
                    .iter()
                    .find(|(_, n, _)| *n == name)
                    .map(|(flag, _, _)| *flag)
                    .ok_or_else(|| {
                        FsError::InvalidInput(format!("Unknown capability mode: '{}'", name))
                    })?;
                Ok(acc | flag)
            })
    }
}
