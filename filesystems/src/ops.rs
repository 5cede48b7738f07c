//! Uniform operation dispatch over `FilesystemType`.
//!
//! The per-family modules hold the tool-specific logic; this front door
//! routes a (filesystem, operation) pair to it, or reports the combination
//! as structurally unsupported. Dispatch is data-driven off the capability
//! registry, not trait objects.

use crate::capability::{CapabilityMode, FilesystemType};
use crate::families::{f2fs, udf};
use crate::wipe;
use fskit_core::{ExtraArg, FsError, ToolLocator};
use serde::Serialize;
use std::path::Path;

/// Metadata snapshot of whichever filesystem was queried.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FsInfo {
    F2fs(f2fs::F2fsInfo),
    Udf(udf::UdfInfo),
}

/// Create a new filesystem with the format's defaults.
///
/// Format-specific creation options (UDF media type, revision, block size)
/// are available on the family modules directly.
pub async fn mkfs(
    fs: FilesystemType,
    device: &Path,
    extra: &[ExtraArg],
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match fs {
        FilesystemType::F2fs => f2fs::mkfs(device, extra, locator).await,
        FilesystemType::Udf => {
            udf::mkfs(device, &udf::UdfMkfsOptions::default(), extra, locator).await
        }
    }
}

/// Wipe the device, verifying it actually carries this filesystem first.
pub async fn wipe(
    fs: FilesystemType,
    device: &Path,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match fs {
        FilesystemType::F2fs => f2fs::wipe(device, locator).await,
        FilesystemType::Udf => udf::wipe(device, locator).await,
    }
}

/// Wipe signatures without insisting on a particular filesystem.
pub async fn wipe_any(device: &Path, all: bool, locator: &ToolLocator) -> Result<(), FsError> {
    wipe::wipe(device, all, locator).await
}

pub async fn check(
    fs: FilesystemType,
    device: &Path,
    extra: &[ExtraArg],
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match fs {
        FilesystemType::F2fs => f2fs::check(device, extra, locator).await,
        other => Err(unsupported(other, CapabilityMode::CHECK)),
    }
}

pub async fn repair(
    fs: FilesystemType,
    device: &Path,
    extra: &[ExtraArg],
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match fs {
        FilesystemType::F2fs => f2fs::repair(device, extra, locator).await,
        other => Err(unsupported(other, CapabilityMode::REPAIR)),
    }
}

pub async fn resize(
    fs: FilesystemType,
    device: &Path,
    new_size: u64,
    safe: bool,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match fs {
        FilesystemType::F2fs => f2fs::resize(device, new_size, safe, &[], locator).await,
        other => Err(unsupported(other, CapabilityMode::RESIZE)),
    }
}

pub async fn get_info(
    fs: FilesystemType,
    device: &Path,
    locator: &ToolLocator,
) -> Result<FsInfo, FsError> {
    match fs {
        FilesystemType::F2fs => Ok(FsInfo::F2fs(f2fs::get_info(device, locator).await?)),
        FilesystemType::Udf => Ok(FsInfo::Udf(udf::get_info(device, locator).await?)),
    }
}

pub async fn set_label(
    fs: FilesystemType,
    device: &Path,
    label: &str,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match fs {
        FilesystemType::Udf => udf::set_label(device, label, locator).await,
        other => Err(unsupported(other, CapabilityMode::SET_LABEL)),
    }
}

pub async fn set_uuid(
    fs: FilesystemType,
    device: &Path,
    uuid: Option<&str>,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match fs {
        FilesystemType::Udf => udf::set_uuid(device, uuid, locator).await,
        other => Err(unsupported(other, CapabilityMode::SET_UUID)),
    }
}

fn unsupported(fs: FilesystemType, mode: CapabilityMode) -> FsError {
    FsError::CapabilityUnsupported {
        fs: fs.to_string(),
        operation: mode.describe().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_f2fs_has_no_label_or_uuid_ops() {
        let locator = ToolLocator::system();
        let device = Path::new("/dev/loop9");

        let err = set_label(FilesystemType::F2fs, device, "data", &locator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("doesn't support setting label"));

        let err = set_uuid(FilesystemType::F2fs, device, None, &locator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("doesn't support setting UUID"));
    }

    #[tokio::test]
    async fn test_udf_has_no_checker_ops() {
        let locator = ToolLocator::system();
        let device = Path::new("/dev/loop9");

        for (name, result) in [
            ("checking", check(FilesystemType::Udf, device, &[], &locator).await),
            ("repairing", repair(FilesystemType::Udf, device, &[], &locator).await),
            ("resizing", resize(FilesystemType::Udf, device, 0, false, &locator).await),
        ] {
            let err = result.unwrap_err();
            assert!(
                err.to_string().contains(name),
                "expected '{}' in: {}",
                name,
                err
            );
        }
    }
}
