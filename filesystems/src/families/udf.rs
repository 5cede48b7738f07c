//! UDF operations via the udftools suite.
//!
//! mkudffs creates, udfinfo answers queries, udflabel rewrites the label
//! fields and the UUID in place. UDF stores two differently sized label
//! fields: the volume identifier (vid) and the logical volume identifier
//! (lvid). Both are d-strings whose character budget halves when any
//! character needs a two-byte encoding, so truncation is computed on whole
//! decoded characters, never on raw bytes.

use crate::availability::require_tool;
use crate::capability::{CapabilityMode, FilesystemType};
use crate::wipe;
use fskit_core::{exec, ExtraArg, FsError, LabelError, ToolLocator, UuidError};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;
use uuid::Uuid;

/// Character budget of the volume identifier field.
pub const VID_BUDGET: usize = 30;
/// Character budget of the logical volume identifier field.
pub const LVID_BUDGET: usize = 126;

const UUID_LEN: usize = 16;

/// Snapshot of an existing UDF filesystem's metadata.
///
/// Re-read from udfinfo output on every query; never cached.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UdfInfo {
    pub label: String,
    pub vid: String,
    pub lvid: String,
    pub uuid: String,
    pub revision: String,
    pub block_size: u32,
    pub block_count: u64,
    pub free_blocks: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UdfMkfsOptions {
    /// Media type hint, e.g. "hd", "dvd", "bdr". Tool default: "hd".
    pub media_type: Option<String>,
    /// UDF revision, e.g. "2.01". Tool default: 2.01.
    pub revision: Option<String>,
    /// Block size in bytes. Tool default: autodetected from the device.
    pub block_size: Option<u32>,
}

/// Create a new UDF filesystem on the device.
pub async fn mkfs(
    device: &Path,
    options: &UdfMkfsOptions,
    extra: &[ExtraArg],
    locator: &ToolLocator,
) -> Result<(), FsError> {
    let (tool, path) = require_tool(FilesystemType::Udf, CapabilityMode::MKFS, locator).await?;

    let mut args = mkfs_args(options);
    for arg in extra {
        arg.append_to(&mut args);
    }
    args.push(device.as_os_str().to_os_string());

    log::info!("creating udf filesystem on {}", device.display());
    exec::run_tool(tool, &path, &args).await?;
    Ok(())
}

/// Wipe a UDF signature from the device.
pub async fn wipe(device: &Path, locator: &ToolLocator) -> Result<(), FsError> {
    wipe::wipe_as(device, FilesystemType::Udf, locator).await
}

/// Query the filesystem's metadata snapshot.
pub async fn get_info(device: &Path, locator: &ToolLocator) -> Result<UdfInfo, FsError> {
    let (tool, path) = require_tool(FilesystemType::Udf, CapabilityMode::QUERY, locator).await?;

    let args: Vec<OsString> = vec!["--utf8".into(), device.as_os_str().to_os_string()];
    let output = exec::run_tool(tool, &path, &args).await?;
    Ok(parse_udfinfo_output(&output.stdout))
}

/// Set the label of an existing UDF filesystem.
///
/// The logical volume identifier receives the label as given; the volume
/// identifier receives the truncated form. Labels exceeding the lvid
/// budget are rejected before udflabel runs.
pub async fn set_label(device: &Path, label: &str, locator: &ToolLocator) -> Result<(), FsError> {
    ensure_label_fits(label)?;
    let vid = volume_identifier(label);
    let lvid = logical_volume_identifier(label);

    let (tool, path) =
        require_tool(FilesystemType::Udf, CapabilityMode::SET_LABEL, locator).await?;

    let args: Vec<OsString> = vec![
        "--utf8".into(),
        format!("--vid={}", vid).into(),
        format!("--lvid={}", lvid).into(),
        device.as_os_str().to_os_string(),
    ];

    log::info!("setting udf label on {}", device.display());
    exec::run_tool(tool, &path, &args).await?;
    Ok(())
}

/// Set the UUID of an existing UDF filesystem.
///
/// `None` sets a freshly generated random UUID, distinct on every call.
pub async fn set_uuid(
    device: &Path,
    uuid: Option<&str>,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    let uuid = match uuid {
        Some(value) => {
            check_uuid(value)?;
            value.to_string()
        }
        None => generate_uuid(),
    };

    let (tool, path) = require_tool(FilesystemType::Udf, CapabilityMode::SET_UUID, locator).await?;

    let args: Vec<OsString> = vec![
        "--utf8".into(),
        format!("--uuid={}", uuid).into(),
        device.as_os_str().to_os_string(),
    ];

    log::info!("setting udf uuid on {}", device.display());
    exec::run_tool(tool, &path, &args).await?;
    Ok(())
}

/// Truncated volume identifier form of a label.
pub fn volume_identifier(label: &str) -> String {
    truncate_identifier(label, VID_BUDGET)
}

/// Logical volume identifier form of a label (untruncated within budget).
pub fn logical_volume_identifier(label: &str) -> String {
    truncate_identifier(label, LVID_BUDGET)
}

/// Validate a label against the legacy Latin-1 contract.
///
/// The label must be representable in Latin-1 and its encoded byte length
/// (one byte per character) must not exceed the lvid budget.
pub fn check_label(label: &str) -> Result<(), LabelError> {
    if label.chars().any(|c| c as u32 > 0xFF) {
        return Err(LabelError::NotEncodable);
    }
    if label.chars().count() > LVID_BUDGET {
        return Err(LabelError::TooLong);
    }
    Ok(())
}

/// Validate a UDF UUID: exactly 16 lowercase hexadecimal digits.
pub fn check_uuid(uuid: &str) -> Result<(), UuidError> {
    if uuid.chars().count() != UUID_LEN {
        return Err(UuidError::WrongLength);
    }
    if !uuid
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    {
        return Err(UuidError::InvalidCharset);
    }
    Ok(())
}

/// A fresh random UUID in the on-disk format.
pub fn generate_uuid() -> String {
    let mut uuid = Uuid::new_v4().simple().to_string();
    uuid.truncate(UUID_LEN);
    uuid
}

/// Cut a label to a d-string character budget without splitting characters.
///
/// A character outside ASCII anywhere in the field window forces the
/// two-byte encoding for the whole field, halving the budget.
fn truncate_identifier(label: &str, budget: usize) -> String {
    let window: Vec<char> = label.chars().take(budget).collect();
    if window.iter().all(|c| c.is_ascii()) {
        window.into_iter().collect()
    } else {
        label.chars().take(budget / 2).collect()
    }
}

fn ensure_label_fits(label: &str) -> Result<(), FsError> {
    let budget = if label.chars().all(|c| c.is_ascii()) {
        LVID_BUDGET
    } else {
        LVID_BUDGET / 2
    };
    if label.chars().count() > budget {
        return Err(FsError::InvalidLabel(LabelError::TooLong));
    }
    Ok(())
}

fn mkfs_args(options: &UdfMkfsOptions) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--utf8".into()];
    if let Some(media_type) = &options.media_type {
        args.push(format!("--media-type={}", media_type).into());
    }
    if let Some(revision) = &options.revision {
        args.push(format!("--udfrev={}", revision).into());
    }
    if let Some(block_size) = options.block_size {
        args.push(format!("--blocksize={}", block_size).into());
    }
    args
}

fn parse_udfinfo_output(output: &str) -> UdfInfo {
    let mut info = UdfInfo::default();

    for line in output.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "label" => info.label = value.to_string(),
            "vid" => info.vid = value.to_string(),
            "lvid" => info.lvid = value.to_string(),
            "uuid" => info.uuid = value.to_string(),
            "udfrev" => info.revision = value.to_string(),
            "blocksize" => info.block_size = value.trim().parse().unwrap_or(0),
            "blocks" => info.block_count = value.trim().parse().unwrap_or(0),
            "freeblocks" => info.free_blocks = value.trim().parse().unwrap_or(0),
            _ => {}
        }
    }

    info
}
