use std::{
    ffi::OsStr,
    io::Read,
    path::Path,
    process::{Command, Stdio},
    time::Duration,
};

use wait_timeout::ChildExt;

use crate::MediaProbeError;

/// Run a command to completion with a deadline, returning its stdout.
///
/// Stdout is drained on a separate thread while the parent waits with
/// `wait_timeout`, so large outputs cannot deadlock on a full pipe. If the
/// deadline passes the child is killed and reaped (leaving no zombie).
pub fn run_with_timeout(
    command: &str,
    args: &[&OsStr],
    src_path: &Path,
    timeout_secs: u64,
    capture_stderr: bool,
) -> Result<Vec<u8>, MediaProbeError> {
    let mut child = Command::new(command)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(if capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .spawn()
        .map_err(|src| MediaProbeError::Spawn {
            command: command.to_string(),
            src,
        })?;

    let mut stdout = child.stdout.take().ok_or_else(|| MediaProbeError::Io {
        command: command.to_string(),
        src: std::io::Error::other("stdout handle missing"),
    })?;

    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let read_result = stdout.read_to_end(&mut buf);
        (buf, read_result)
    });

    let status = match child.wait_timeout(Duration::from_secs(timeout_secs)) {
        Ok(Some(status)) => status,
        Ok(None) => {
            // Deadline passed. Kill the child; the reader thread then hits
            // EOF on the broken pipe and unblocks.
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            let _ = reader.join();
            return Err(MediaProbeError::Timeout {
                command: command.to_string(),
                timeout_secs,
                path: src_path.to_path_buf(),
            });
        }
        Err(src) => {
            let _kill_error = child.kill();
            let _wait_error = child.wait();
            let _ = reader.join();
            return Err(MediaProbeError::Io {
                command: command.to_string(),
                src,
            });
        }
    };

    let (buf, read_result) = reader.join().map_err(|_| MediaProbeError::Io {
        command: command.to_string(),
        src: std::io::Error::other("stdout reader thread panicked"),
    })?;
    read_result.map_err(|src| MediaProbeError::Io {
        command: command.to_string(),
        src,
    })?;

    if status.success() {
        Ok(buf)
    } else {
        let stderr = match child.stderr.take() {
            Some(mut pipe) => {
                let mut msg = String::new();
                let _read_error = pipe.read_to_string(&mut msg);
                // Keep error messages to a sane length.
                msg.chars().take(500).collect()
            }
            None => String::from("(stderr not captured)"),
        };
        Err(MediaProbeError::CommandFailed {
            command: command.to_string(),
            path: src_path.to_path_buf(),
            stderr,
        })
    }
}
