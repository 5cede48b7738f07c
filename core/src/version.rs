//! Semantic versions for external utilities.
//!
//! Maintenance tools report their version on a `-V`-style invocation as
//! `<tool-name> <major>.<minor>.<micro>`, possibly followed by a build date
//! or other noise. Minimum-version gates compare with the usual
//! major.minor.micro ordering.

use crate::error::FsError;
use crate::exec;
use crate::tools::ToolLocator;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, micro: u32) -> Self {
        Self {
            major,
            minor,
            micro,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.micro)
    }
}

impl FromStr for Version {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(FsError::InvalidInput(format!("Invalid version '{}'", s)));
        }
        let field = |idx: usize| -> Result<u32, FsError> {
            parts
                .get(idx)
                .copied()
                .unwrap_or("0")
                .parse()
                .map_err(|_| FsError::InvalidInput(format!("Invalid version '{}'", s)))
        };
        Ok(Self::new(field(0)?, field(1)?, field(2)?))
    }
}

/// Extract `<tool> <major>.<minor>.<micro>` from version-query output.
pub fn version_from_output(tool: &str, output: &str) -> Option<Version> {
    let pattern = format!(r"{}\s+(\d+)\.(\d+)\.(\d+)", regex::escape(tool));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(output)?;
    // the pattern guarantees digit groups
    let field = |n| caps.get(n).map_or(0, |m| m.as_str().parse().unwrap_or(0));
    Some(Version::new(field(1), field(2), field(3)))
}

/// Run `tool <version_arg>` and parse the reported version.
///
/// A tool that cannot be located fails with `ToolMissing`; one that exits
/// non-zero or prints something the documented pattern does not match fails
/// with `VersionUnparsable`.
pub async fn probe_tool_version(
    locator: &ToolLocator,
    tool: &str,
    version_arg: &str,
) -> Result<Version, FsError> {
    let path = locator.locate(tool)?;
    let output = exec::capture(tool, &path, &[version_arg.into()]).await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if output.status.success() {
        if let Some(version) =
            version_from_output(tool, &stdout).or_else(|| version_from_output(tool, &stderr))
        {
            return Ok(version);
        }
    }

    Err(FsError::VersionUnparsable {
        tool: tool.to_string(),
        output: if stdout.trim().is_empty() {
            stderr.trim().to_string()
        } else {
            stdout.trim().to_string()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v: Version = "1.12.0".parse().unwrap();
        assert_eq!(v, Version::new(1, 12, 0));

        // two-component versions get micro = 0
        let v: Version = "1.12".parse().unwrap();
        assert_eq!(v, Version::new(1, 12, 0));

        assert!("1.12.0.4".parse::<Version>().is_err());
        assert!("one.two".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_ordering() {
        let gate = Version::new(1, 12, 0);
        assert!(Version::new(1, 11, 9) < gate);
        assert!(Version::new(1, 12, 0) >= gate);
        assert!(Version::new(1, 13, 0) >= gate);
        assert!(Version::new(2, 0, 0) >= gate);
        assert!(Version::new(0, 99, 99) < gate);
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(1, 11, 0).to_string(), "1.11.0");
    }

    #[test]
    fn test_version_from_output() {
        let out = "resize.f2fs 1.14.0 (2020-08-24)";
        assert_eq!(
            version_from_output("resize.f2fs", out),
            Some(Version::new(1, 14, 0))
        );

        // the tool name anchors the match; a bare number is not enough
        assert_eq!(version_from_output("resize.f2fs", "1.14.0"), None);

        // dots in the tool name must not act as wildcards
        assert_eq!(
            version_from_output("resize.f2fs", "resizeXf2fs 1.14.0"),
            None
        );

        let out = "fsck.f2fs 1.10.0";
        assert_eq!(
            version_from_output("fsck.f2fs", out),
            Some(Version::new(1, 10, 0))
        );
    }

    #[cfg(unix)]
    mod probing {
        use super::*;
        use crate::tools::ToolLocator;
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        fn fake_tool(dir: &std::path::Path, name: &str, script: &str) {
            let path = dir.join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "#!/bin/sh\n{}", script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        #[tokio::test]
        async fn test_probe_tool_version() {
            let dir = tempfile::tempdir().unwrap();
            fake_tool(dir.path(), "fsck.f2fs", "echo 'fsck.f2fs 1.14.0 (2020-08-24)'");
            let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

            let version = probe_tool_version(&locator, "fsck.f2fs", "-V").await.unwrap();
            assert_eq!(version, Version::new(1, 14, 0));
        }

        #[tokio::test]
        async fn test_probe_unparsable() {
            let dir = tempfile::tempdir().unwrap();
            fake_tool(dir.path(), "fsck.f2fs", "echo 'no version here'");
            let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

            let err = probe_tool_version(&locator, "fsck.f2fs", "-V").await.unwrap_err();
            assert!(matches!(err, FsError::VersionUnparsable { .. }));
        }

        #[tokio::test]
        async fn test_probe_nonzero_exit() {
            let dir = tempfile::tempdir().unwrap();
            fake_tool(dir.path(), "resize.f2fs", "exit 1");
            let locator = ToolLocator::with_search_path(vec![dir.path().to_path_buf()]);

            let err = probe_tool_version(&locator, "resize.f2fs", "-V").await.unwrap_err();
            assert!(matches!(err, FsError::VersionUnparsable { .. }));
        }
    }
}
