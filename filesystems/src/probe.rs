//! Signature probing via `blkid`.

use crate::capability::FilesystemType;
use fskit_core::{exec, FsError, ToolLocator};
use std::ffi::OsString;
use std::path::Path;

// blkid -p exits 2 when no signature could be identified
const BLKID_NOTHING_FOUND: i32 = 2;

/// Low-level probe for the first signature type on a device.
///
/// Returns `None` when the device carries no recognizable signature.
pub async fn get_fstype(device: &Path, locator: &ToolLocator) -> Result<Option<String>, FsError> {
    let path = locator.locate("blkid")?;
    let args: Vec<OsString> = vec![
        "-p".into(),
        "-s".into(),
        "TYPE".into(),
        "-o".into(),
        "value".into(),
        device.as_os_str().to_os_string(),
    ];

    let output = exec::capture("blkid", &path, &args).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let fstype = stdout.trim();

    match output.status.code() {
        Some(0) if !fstype.is_empty() => Ok(Some(fstype.to_string())),
        Some(0) | Some(BLKID_NOTHING_FOUND) => Ok(None),
        code => Err(FsError::OperationFailed {
            tool: "blkid".to_string(),
            status: code.unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
    }
}

/// Probe and insist the device carries the given filesystem's signature.
pub(crate) async fn expect_fstype(
    device: &Path,
    fs: FilesystemType,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    match get_fstype(device, locator).await? {
        None => Err(FsError::NoFilesystem(device.display().to_string())),
        Some(found) if found != fs.as_str() => Err(FsError::UnexpectedFilesystem {
            device: device.display().to_string(),
            expected: fs.as_str().to_string(),
            found,
        }),
        Some(_) => Ok(()),
    }
}
