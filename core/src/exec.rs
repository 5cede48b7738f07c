//! Subprocess execution for external maintenance utilities.
//!
//! One invocation per operation, executed to completion under a bounded
//! timeout. Exit status 0 is success; anything else surfaces the tool's
//! stderr as the diagnostic payload.

use crate::error::FsError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

pub const EXEC_TIMEOUT: Duration = Duration::from_secs(600);

const STDERR_EXCERPT_LEN: usize = 1024;

/// An extra `opt`/`val` argument pair appended verbatim to an invocation,
/// after the operation's fixed flags (e.g. `-l LABEL`, `-O encrypt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraArg {
    pub opt: String,
    pub val: String,
}

impl ExtraArg {
    pub fn new(opt: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            opt: opt.into(),
            val: val.into(),
        }
    }

    pub fn append_to(&self, argv: &mut Vec<OsString>) {
        argv.push(self.opt.clone().into());
        if !self.val.is_empty() {
            argv.push(self.val.clone().into());
        }
    }
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run the tool and hand back its raw `Output` whatever the exit status.
///
/// Callers that treat certain non-zero statuses as data (version probing,
/// signature lookup) use this; everything else goes through `run_tool`.
pub async fn capture(
    tool: &str,
    path: &Path,
    args: &[OsString],
) -> Result<std::process::Output, FsError> {
    log::debug!("running {} as {:?} {:?}", tool, path, args);

    let result = timeout(EXEC_TIMEOUT, Command::new(path).args(args).output())
        .await
        .map_err(|_| {
            FsError::Timeout(format!(
                "'{}' did not finish within {} seconds",
                tool,
                EXEC_TIMEOUT.as_secs()
            ))
        })?;

    result.map_err(FsError::Io)
}

/// Run the tool and map a non-zero exit to `OperationFailed`.
pub async fn run_tool(tool: &str, path: &Path, args: &[OsString]) -> Result<ToolOutput, FsError> {
    let output = capture(tool, path, args).await?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        let status = output.status.code().unwrap_or(-1);
        log::warn!("{} exited with status {}", tool, status);
        return Err(FsError::OperationFailed {
            tool: tool.to_string(),
            status,
            stderr: excerpt(if stderr.trim().is_empty() {
                &stdout
            } else {
                &stderr
            }),
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(STDERR_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> std::path::PathBuf {
        which::which("sh").unwrap()
    }

    fn args(script: &str) -> Vec<OsString> {
        vec!["-c".into(), script.into()]
    }

    #[tokio::test]
    async fn test_run_tool_success() {
        let out = run_tool("sh", &sh(), &args("echo hello")).await.unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_run_tool_failure_carries_status_and_stderr() {
        let err = run_tool("sh", &sh(), &args("echo broken >&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            FsError::OperationFailed {
                tool,
                status,
                stderr,
            } => {
                assert_eq!(tool, "sh");
                assert_eq!(status, 3);
                assert_eq!(stderr, "broken");
            }
            other => panic!("expected OperationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_capture_keeps_nonzero_exit() {
        let out = capture("sh", &sh(), &args("exit 2")).await.unwrap();
        assert_eq!(out.status.code(), Some(2));
    }

    #[test]
    fn test_extra_arg_append() {
        let mut argv: Vec<OsString> = vec!["--utf8".into()];
        ExtraArg::new("-l", "TEST_LABEL").append_to(&mut argv);
        ExtraArg::new("-f", "").append_to(&mut argv);
        assert_eq!(argv, vec!["--utf8", "-l", "TEST_LABEL", "-f"]);
    }

    #[test]
    fn test_excerpt_caps_length() {
        let long = "x".repeat(4096);
        let cut = excerpt(&long);
        assert!(cut.len() < long.len());
        assert!(cut.ends_with("..."));
    }
}
