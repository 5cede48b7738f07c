//! F2FS operations via the f2fs-tools suite.
//!
//! mkfs.f2fs creates, dump.f2fs answers queries, fsck.f2fs checks and
//! repairs (`--dry-run` needs 1.11.0), resize.f2fs resizes (safe resizing
//! needs 1.12.0). F2FS offers no post-mkfs label or UUID tooling here;
//! labels are set at creation time through `-l`.

use crate::availability::require_tool;
use crate::capability::{CapabilityMode, FilesystemType};
use crate::wipe;
use bitflags::bitflags;
use fskit_core::{exec, ExtraArg, FsError, ToolLocator};
use serde::Serialize;
use std::ffi::OsString;
use std::path::Path;

bitflags! {
    /// Superblock feature bits as reported by dump.f2fs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    #[serde(transparent)]
    pub struct F2fsFeature: u32 {
        const ENCRYPT               = 0x0001;
        const BLKZONED              = 0x0002;
        const ATOMIC_WRITE          = 0x0004;
        const EXTRA_ATTR            = 0x0008;
        const PRJQUOTA              = 0x0010;
        const INODE_CHKSUM          = 0x0020;
        const FLEXIBLE_INLINE_XATTR = 0x0040;
        const QUOTA_INO             = 0x0080;
        const INODE_CRTIME          = 0x0100;
        const LOST_FOUND            = 0x0200;
        const VERITY                = 0x0400;
        const SB_CHKSUM             = 0x0800;
    }
}

impl Default for F2fsFeature {
    fn default() -> Self {
        Self::empty()
    }
}

/// Snapshot of an existing F2FS filesystem's metadata.
///
/// Re-read from dump.f2fs output on every query; never cached.
#[derive(Debug, Clone, Default, Serialize)]
pub struct F2fsInfo {
    pub label: String,
    pub uuid: String,
    pub sector_size: u64,
    pub sector_count: u64,
    pub features: F2fsFeature,
}

/// Create a new F2FS filesystem on the device.
///
/// Labels (`-l LABEL`) and feature toggles (`-O encrypt`) ride through
/// `extra`.
pub async fn mkfs(device: &Path, extra: &[ExtraArg], locator: &ToolLocator) -> Result<(), FsError> {
    let (tool, path) = require_tool(FilesystemType::F2fs, CapabilityMode::MKFS, locator).await?;

    let mut args: Vec<OsString> = Vec::new();
    for arg in extra {
        arg.append_to(&mut args);
    }
    args.push(device.as_os_str().to_os_string());

    log::info!("creating f2fs filesystem on {}", device.display());
    exec::run_tool(tool, &path, &args).await?;
    Ok(())
}

/// Wipe an F2FS signature from the device.
pub async fn wipe(device: &Path, locator: &ToolLocator) -> Result<(), FsError> {
    wipe::wipe_as(device, FilesystemType::F2fs, locator).await
}

/// Check filesystem consistency without modifying the device.
pub async fn check(
    device: &Path,
    extra: &[ExtraArg],
    locator: &ToolLocator,
) -> Result<(), FsError> {
    let (tool, path) = require_tool(FilesystemType::F2fs, CapabilityMode::CHECK, locator).await?;

    let mut args: Vec<OsString> = vec!["--dry-run".into()];
    for arg in extra {
        arg.append_to(&mut args);
    }
    args.push(device.as_os_str().to_os_string());

    exec::run_tool(tool, &path, &args).await?;
    Ok(())
}

/// Check and automatically fix what fsck.f2fs can fix.
pub async fn repair(
    device: &Path,
    extra: &[ExtraArg],
    locator: &ToolLocator,
) -> Result<(), FsError> {
    let (tool, path) = require_tool(FilesystemType::F2fs, CapabilityMode::REPAIR, locator).await?;

    let mut args: Vec<OsString> = vec!["-a".into()];
    for arg in extra {
        arg.append_to(&mut args);
    }
    args.push(device.as_os_str().to_os_string());

    log::info!("repairing f2fs filesystem on {}", device.display());
    exec::run_tool(tool, &path, &args).await?;
    Ok(())
}

/// Resize the filesystem to `new_size` 512-byte sectors.
///
/// `new_size == 0` grows (or shrinks, with `safe`) to whatever the
/// underlying block device allows. Shrinking demands the explicit `safe`
/// opt-in and is rejected with `UnsafeShrink` before resize.f2fs runs.
pub async fn resize(
    device: &Path,
    new_size: u64,
    safe: bool,
    extra: &[ExtraArg],
    locator: &ToolLocator,
) -> Result<(), FsError> {
    let info = get_info(device, locator).await?;
    ensure_resize_allowed(device, new_size, info.sector_count, safe)?;

    let (tool, path) = require_tool(FilesystemType::F2fs, CapabilityMode::RESIZE, locator).await?;

    let mut args = resize_args(new_size, safe);
    for arg in extra {
        arg.append_to(&mut args);
    }
    args.push(device.as_os_str().to_os_string());

    log::info!(
        "resizing f2fs filesystem on {} to {} sectors",
        device.display(),
        new_size
    );
    exec::run_tool(tool, &path, &args).await?;
    Ok(())
}

/// Query the filesystem's metadata snapshot.
pub async fn get_info(device: &Path, locator: &ToolLocator) -> Result<F2fsInfo, FsError> {
    let (tool, path) = require_tool(FilesystemType::F2fs, CapabilityMode::QUERY, locator).await?;

    let args = [device.as_os_str().to_os_string()];
    let output = exec::run_tool(tool, &path, &args).await?;
    Ok(parse_dump_output(&output.stdout))
}

fn ensure_resize_allowed(
    device: &Path,
    requested: u64,
    current: u64,
    safe: bool,
) -> Result<(), FsError> {
    if requested != 0 && requested < current && !safe {
        return Err(FsError::UnsafeShrink {
            device: device.display().to_string(),
            requested,
            current,
        });
    }
    Ok(())
}

fn resize_args(new_size: u64, safe: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    if safe {
        args.push("-s".into());
    }
    if new_size != 0 {
        args.push("-t".into());
        args.push(new_size.to_string().into());
    }
    args
}

fn parse_dump_output(output: &str) -> F2fsInfo {
    let mut info = F2fsInfo::default();

    for line in output.lines() {
        let Some(rest) = line.strip_prefix("Info: ") else {
            continue;
        };

        if let Some(value) = rest.strip_prefix("volume label = ") {
            info.label = value.trim().to_string();
        } else if let Some(value) = rest.strip_prefix("volume uuid = ") {
            info.uuid = value.trim().to_string();
        } else if let Some(value) = rest.strip_prefix("sector size = ") {
            info.sector_size = value.trim().parse().unwrap_or(0);
        } else if let Some(value) = rest.strip_prefix("total FS sectors = ") {
            // "204800 (100 MB)" -- the leading token is the count
            info.sector_count = value
                .split_whitespace()
                .next()
                .and_then(|n| n.parse().ok())
                .unwrap_or(0);
        } else if let Some(value) = rest.strip_prefix("superblock features = ") {
            // "1 :  encrypt" -- the numeric field carries the bits
            let bits = value
                .split(':')
                .next()
                .and_then(|n| n.trim().parse().ok())
                .unwrap_or(0);
            info.features = F2fsFeature::from_bits_truncate(bits);
        }
    }

    info
}
