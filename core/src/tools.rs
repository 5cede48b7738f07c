//! External tool location.
//!
//! Every operation resolves its utilities through a caller-provided
//! `ToolLocator` instead of global process state. Tests restrict the search
//! to an allow-list or to an explicit directory of stand-in tools; production
//! callers use `ToolLocator::system()`.

use crate::error::FsError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    allowed: Option<HashSet<String>>,
    search_path: Option<Vec<PathBuf>>,
}

impl ToolLocator {
    /// Search the real `PATH` with no restrictions.
    pub fn system() -> Self {
        Self::default()
    }

    /// Only the named tools are considered present; everything else reports
    /// `ToolMissing` without touching the filesystem.
    pub fn restricted<I, S>(tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Some(tools.into_iter().map(Into::into).collect()),
            search_path: None,
        }
    }

    /// Search only the given directories instead of `PATH`.
    pub fn with_search_path(dirs: Vec<PathBuf>) -> Self {
        Self {
            allowed: None,
            search_path: Some(dirs),
        }
    }

    /// Restrict an existing locator to an allow-list.
    pub fn allowing<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn locate(&self, tool: &str) -> Result<PathBuf, FsError> {
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(tool) {
                return Err(FsError::ToolMissing(tool.to_string()));
            }
        }

        let found = match &self.search_path {
            Some(dirs) => {
                let joined = std::env::join_paths(dirs)
                    .map_err(|e| FsError::InvalidInput(format!("Invalid search path: {}", e)))?;
                which::which_in(tool, Some(joined), cwd())
            }
            None => which::which(tool),
        };

        found.map_err(|_| FsError::ToolMissing(tool.to_string()))
    }
}

fn cwd() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| Path::new("/").to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restricted_locator_hides_tools() {
        let locator = ToolLocator::restricted(["mkfs.f2fs", "dump.f2fs"]);

        let err = locator.locate("fsck.f2fs").unwrap_err();
        match err {
            FsError::ToolMissing(tool) => assert_eq!(tool, "fsck.f2fs"),
            other => panic!("expected ToolMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_system_locator_finds_sh() {
        // sh is guaranteed on any platform these tools run on
        let locator = ToolLocator::system();
        assert!(locator.locate("sh").is_ok());
    }

    #[test]
    fn test_empty_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);
        assert!(matches!(
            locator.locate("sh"),
            Err(FsError::ToolMissing(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_search_path_override() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mkudffs");
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);
        assert_eq!(locator.locate("mkudffs").unwrap(), path);
    }
}
