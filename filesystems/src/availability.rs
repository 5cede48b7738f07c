//! Pre-flight availability resolution.
//!
//! Answers "can these operations be performed on this filesystem type with
//! the tools currently installed?" without performing any of them. Nothing
//! is cached: repeated calls re-probe so the answer tracks live tool
//! installation state.

use crate::capability::{CapabilityMode, FilesystemType};
use crate::registry;
use fskit_core::{probe_tool_version, FsError, ToolLocator, Version};
use std::path::PathBuf;

const VERSION_ARG: &str = "-V";

/// Check every requested capability flag, in declaration order.
///
/// Fails with `CapabilityUnsupported` when a flag is structurally
/// unsupported for the format (checked first -- it does not depend on what
/// is installed), `ToolMissing` when a required utility is absent, and
/// `VersionTooLow` when the utility is present but predates the required
/// interface (or its version cannot be determined at all).
pub async fn ensure_available(
    fs: FilesystemType,
    modes: CapabilityMode,
    locator: &ToolLocator,
) -> Result<(), FsError> {
    for mode in modes.iter() {
        let reqs = registry::requirements_for(fs, mode)?;
        for req in reqs {
            locator.locate(req.tool)?;
            if let Some(min) = req.min_version {
                ensure_tool_version(locator, req.tool, min).await?;
            }
        }
    }
    Ok(())
}

/// Boolean convenience wrapper over `ensure_available`.
///
/// Structural unsupport still surfaces as an error so callers can tell
/// "not installed" (fixable) from "never supported" (not fixable).
pub async fn is_available(
    fs: FilesystemType,
    modes: CapabilityMode,
    locator: &ToolLocator,
) -> Result<bool, FsError> {
    match ensure_available(fs, modes, locator).await {
        Ok(()) => Ok(true),
        Err(err @ FsError::CapabilityUnsupported { .. }) => Err(err),
        Err(_) => Ok(false),
    }
}

/// Probe a tool's version and compare against a minimum.
///
/// A probe that cannot run or cannot be parsed counts as too low: the
/// installed tool demonstrably does not speak the gated interface.
pub async fn ensure_tool_version(
    locator: &ToolLocator,
    tool: &str,
    min: Version,
) -> Result<(), FsError> {
    match probe_tool_version(locator, tool, VERSION_ARG).await {
        Ok(found) if found >= min => Ok(()),
        Ok(found) => Err(FsError::VersionTooLow {
            tool: tool.to_string(),
            required: min,
            found: Some(found),
        }),
        Err(err @ FsError::ToolMissing(_)) => Err(err),
        Err(_) => Err(FsError::VersionTooLow {
            tool: tool.to_string(),
            required: min,
            found: None,
        }),
    }
}

/// Locate (and version-gate) the single tool an operation dispatches to.
pub(crate) async fn require_tool(
    fs: FilesystemType,
    mode: CapabilityMode,
    locator: &ToolLocator,
) -> Result<(&'static str, PathBuf), FsError> {
    let req = &registry::requirements_for(fs, mode)?[0];
    let path = locator.locate(req.tool)?;
    if let Some(min) = req.min_version {
        ensure_tool_version(locator, req.tool, min).await?;
    }
    Ok((req.tool, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unsupported_wins_over_missing_tools() {
        // no tools installed at all, but the failure must still be the
        // format-intrinsic one
        let locator = ToolLocator::restricted(Vec::<String>::new());
        let err = ensure_available(FilesystemType::F2fs, CapabilityMode::SET_UUID, &locator)
            .await
            .unwrap_err();
        assert!(
            err.to_string().contains("doesn't support setting UUID"),
            "unexpected error: {}",
            err
        );

        let err = ensure_available(FilesystemType::F2fs, CapabilityMode::SET_LABEL, &locator)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("doesn't support setting label"));
    }

    #[tokio::test]
    async fn test_missing_checker_reported_by_name() {
        // everything but fsck.f2fs present
        let locator = ToolLocator::restricted(["mkfs.f2fs", "dump.f2fs", "resize.f2fs"]);
        let err = ensure_available(
            FilesystemType::F2fs,
            CapabilityMode::CHECK | CapabilityMode::REPAIR,
            &locator,
        )
        .await
        .unwrap_err();
        match err {
            FsError::ToolMissing(tool) => assert_eq!(tool, "fsck.f2fs"),
            other => panic!("expected ToolMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_is_available_false_on_missing() {
        let locator = ToolLocator::restricted(Vec::<String>::new());
        let avail = is_available(FilesystemType::Udf, CapabilityMode::MKFS, &locator)
            .await
            .unwrap();
        assert!(!avail);
    }

    #[cfg(unix)]
    mod with_fake_tools {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn fake_tool(dir: &Path, name: &str, script: &str) {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        #[tokio::test]
        async fn test_low_version_checker_rejected() {
            let dir = tempfile::tempdir().unwrap();
            fake_tool(dir.path(), "fsck.f2fs", "echo 'fsck.f2fs 1.10.0 (2017-11-15)'");
            let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

            let err = ensure_available(FilesystemType::F2fs, CapabilityMode::CHECK, &locator)
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "Too low version of fsck.f2fs. At least 1.11.0 required."
            );
            match err {
                FsError::VersionTooLow { found, .. } => {
                    assert_eq!(found, Some(Version::new(1, 10, 0)))
                }
                other => panic!("expected VersionTooLow, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_new_enough_checker_accepted() {
            let dir = tempfile::tempdir().unwrap();
            fake_tool(dir.path(), "fsck.f2fs", "echo 'fsck.f2fs 1.14.0 (2020-08-24)'");
            let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

            ensure_available(
                FilesystemType::F2fs,
                CapabilityMode::CHECK | CapabilityMode::REPAIR,
                &locator,
            )
            .await
            .unwrap();
        }

        #[tokio::test]
        async fn test_unparsable_version_counts_as_too_low() {
            let dir = tempfile::tempdir().unwrap();
            fake_tool(dir.path(), "resize.f2fs", "echo 'no version for you'");
            let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

            let err = ensure_available(FilesystemType::F2fs, CapabilityMode::RESIZE, &locator)
                .await
                .unwrap_err();
            match err {
                FsError::VersionTooLow { tool, found, .. } => {
                    assert_eq!(tool, "resize.f2fs");
                    assert_eq!(found, None);
                }
                other => panic!("expected VersionTooLow, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_ungated_modes_need_presence_only() {
            let dir = tempfile::tempdir().unwrap();
            fake_tool(dir.path(), "mkfs.f2fs", "exit 0");
            fake_tool(dir.path(), "dump.f2fs", "exit 0");
            let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

            ensure_available(
                FilesystemType::F2fs,
                CapabilityMode::MKFS | CapabilityMode::QUERY,
                &locator,
            )
            .await
            .unwrap();
        }
    }
}
