//! Runs external command-line tools with a timeout.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Failure of an external tool invocation.
#[derive(Debug, Error)]
pub(crate) enum ToolError {
    /// Binary not found.
    #[error("executable not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Did not finish within the timeout; the process was killed.
    #[error("timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
    /// Exited unsuccessfully.
    #[error("{}", describe_exit(.code, .stderr))]
    Failed { code: Option<i32>, stderr: String },
    /// I/O error talking to the process.
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

fn describe_exit(code: &Option<i32>, stderr: &str) -> String {
    match code {
        Some(code) => format!("exited with status {}: {}", code, stderr.trim()),
        None => format!("terminated by signal: {}", stderr.trim()),
    }
}

/// Runs `program` with `args`, optionally feeding `stdin`, and returns stdout.
///
/// The child is killed if the timeout elapses or the returned future is
/// dropped.
pub(crate) async fn run_tool<I, S>(
    program: &Path,
    args: I,
    stdin: Option<&[u8]>,
    limit: Duration,
) -> Result<Vec<u8>, ToolError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ToolError::NotFound(program.to_path_buf())
            } else {
                ToolError::Io(e)
            }
        })?;

    debug!(program = %program.display(), "Spawned external tool");

    let input = stdin.map(<[u8]>::to_vec);
    let mut child_stdin = child.stdin.take();
    let run = async move {
        if let (Some(pipe), Some(input)) = (child_stdin.as_mut(), input) {
            pipe.write_all(&input).await?;
        }
        // close stdin so the tool sees EOF
        drop(child_stdin);
        child.wait_with_output().await
    };

    let output = match timeout(limit, run).await {
        Ok(result) => result.map_err(ToolError::Io)?,
        Err(_) => return Err(ToolError::Timeout(limit)),
    };

    if !output.status.success() {
        return Err(ToolError::Failed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary() {
        let err = run_tool(
            Path::new("/nonexistent/tool"),
            ["--version"],
            None,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stdin_is_piped_through() {
        let out = run_tool(Path::new("cat"), Vec::<&str>::new(), Some(b"hello"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let err = run_tool(Path::new("sh"), ["-c", "echo boom >&2; exit 3"], None, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            ToolError::Failed { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tool_error_is_std_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Box<dyn std::error::Error> = Box::new(ToolError::Io(io));
        assert_eq!(err.to_string(), "I/O error: pipe closed");
        assert!(err.source().is_some());

        let failed = ToolError::Failed {
            code: Some(2),
            stderr: "bad flag\n".to_string(),
        };
        assert_eq!(failed.to_string(), "exited with status 2: bad flag");
    }

    #[tokio::test]
    async fn test_timeout_kills_tool() {
        let err = run_tool(Path::new("sleep"), ["5"], None, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(_)));
    }
}
