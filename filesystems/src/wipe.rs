//! Signature wiping via `wipefs`.

use crate::capability::FilesystemType;
use crate::probe;
use fskit_core::{exec, FsError, ToolLocator};
use std::ffi::OsString;
use std::path::Path;

/// Wipe signatures from a device.
///
/// With `all` set every signature goes; otherwise only the signatures of
/// the first detected type are removed. A device with no detectable
/// signature fails with `NoFilesystem`.
pub async fn wipe(device: &Path, all: bool, locator: &ToolLocator) -> Result<(), FsError> {
    let fstype = probe::get_fstype(device, locator)
        .await?
        .ok_or_else(|| FsError::NoFilesystem(device.display().to_string()))?;

    let path = locator.locate("wipefs")?;
    let mut args: Vec<OsString> = vec!["-a".into()];
    if !all {
        args.push("-t".into());
        args.push(fstype.into());
    }
    args.push(device.as_os_str().to_os_string());

    log::info!("wiping signatures from {}", device.display());
    exec::run_tool("wipefs", &path, &args).await?;
    Ok(())
}

/// Wipe a device known to carry the given filesystem.
///
/// The signature type is verified first; wiping an empty device or one
/// holding a different signature is an error rather than a no-op.
pub(crate) async fn wipe_as(
    device: &Path,
    fs: FilesystemType,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    probe::expect_fstype(device, fs, locator).await?;

    let path = locator.locate("wipefs")?;
    let args: Vec<OsString> = vec![
        "-a".into(),
        "-t".into(),
        fs.as_str().into(),
        device.as_os_str().to_os_string(),
    ];

    log::info!("wiping {} signatures from {}", fs, device.display());
    exec::run_tool("wipefs", &path, &args).await?;
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_tool(dir: &Path, name: &str, script: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_wipe_empty_device_fails() {
        let dir = tempfile::tempdir().unwrap();
        fake_tool(dir.path(), "blkid", "exit 2");
        fake_tool(dir.path(), "wipefs", "exit 0");
        let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

        let err = wipe(Path::new("/dev/loop9"), true, &locator).await.unwrap_err();
        assert!(matches!(err, FsError::NoFilesystem(_)));
    }

    #[tokio::test]
    async fn test_wipe_as_rejects_other_signature() {
        let dir = tempfile::tempdir().unwrap();
        fake_tool(dir.path(), "blkid", "echo LVM2_member");
        fake_tool(dir.path(), "wipefs", "exit 0");
        let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

        let err = wipe_as(Path::new("/dev/loop9"), FilesystemType::F2fs, &locator)
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::UnexpectedFilesystem { .. }));
    }

    #[tokio::test]
    async fn test_wipe_as_matching_signature() {
        let dir = tempfile::tempdir().unwrap();
        fake_tool(dir.path(), "blkid", "echo udf");
        fake_tool(dir.path(), "wipefs", "exit 0");
        let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

        wipe_as(Path::new("/dev/loop9"), FilesystemType::Udf, &locator)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wipe_tool_failure_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        fake_tool(dir.path(), "blkid", "echo f2fs");
        fake_tool(dir.path(), "wipefs", "echo 'probing initialization failed' >&2; exit 1");
        let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

        let err = wipe(Path::new("/dev/loop9"), true, &locator).await.unwrap_err();
        match err {
            FsError::OperationFailed { tool, stderr, .. } => {
                assert_eq!(tool, "wipefs");
                assert!(stderr.contains("probing initialization failed"));
            }
            other => panic!("expected OperationFailed, got {:?}", other),
        }
    }
}
