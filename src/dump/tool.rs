// src/dump/tool.rs

//! Conversion of raw index/archive blobs into dump text
//!
//! The binary index format is opaque to us; `apk adbdump` turns it into
//! the line-oriented text that [`super::DumpDecoder`] understands.

use crate::error::{Error, Result};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Time `apk adbdump` gets before it is killed
pub const DEFAULT_DUMP_TIMEOUT: Duration = Duration::from_secs(300);

/// Turns a raw blob into dump text
pub trait IndexDumper: Send + Sync {
    fn dump(&self, raw: &[u8]) -> Result<Vec<u8>>;
}

/// `apk adbdump` wrapper
#[derive(Debug, Clone)]
pub struct ApkTool {
    binary: PathBuf,
    timeout: Duration,
}

impl ApkTool {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_DUMP_TIMEOUT,
        }
    }

    /// Kill the child if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl IndexDumper for ApkTool {
    fn dump(&self, raw: &[u8]) -> Result<Vec<u8>> {
        debug!("Running {} adbdump on {} bytes", self.binary.display(), raw.len());

        let mut cmd = Command::new(&self.binary);
        cmd.args(["adbdump", "/dev/stdin"]);
        run_with_timeout(cmd, raw, self.timeout)
    }
}

/// Feed `input` to `cmd` and collect its stdout, killing it after `timeout`
///
/// Stdin, stdout and stderr are each serviced on their own thread so no
/// full pipe can stall the child while we wait on it.
fn run_with_timeout(mut cmd: Command, input: &[u8], timeout: Duration) -> Result<Vec<u8>> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            Error::DecodeError(format!("Failed to run {program}: {e}. Is apk installed?"))
        })?;

    let (Some(mut stdin), Some(stdout), Some(stderr)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(Error::DecodeError(format!("{program} stdio was not captured")));
    };

    let data = input.to_vec();
    let writer = std::thread::spawn(move || stdin.write_all(&data));
    let stdout_reader = drain(stdout);
    let stderr_reader = drain(stderr);

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::DecodeError(format!(
                "{program} timed out after {} seconds",
                timeout.as_secs_f64()
            )));
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::DecodeError(format!("Failed to wait for {program}: {e}")));
        }
    };

    match writer.join() {
        Ok(Ok(())) => {}
        // the child may exit early on garbage input and close the pipe; the
        // exit status below reports the real failure
        Ok(Err(e)) => debug!("{program} closed stdin early: {e}"),
        Err(_) => {
            return Err(Error::DecodeError(format!("{program} stdin writer panicked")));
        }
    }

    let stdout = collect(stdout_reader, &program)?;
    let stderr = collect(stderr_reader, &program)?;

    if !status.success() {
        return Err(Error::DecodeError(format!(
            "{program} failed ({status}): {}",
            String::from_utf8_lossy(&stderr).trim()
        )));
    }

    Ok(stdout)
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: JoinHandle<std::io::Result<Vec<u8>>>, program: &str) -> Result<Vec<u8>> {
    match handle.join() {
        Ok(Ok(buf)) => Ok(buf),
        Ok(Err(e)) => Err(Error::DecodeError(format!("Failed to read {program} output: {e}"))),
        Err(_) => Err(Error::DecodeError(format!("{program} output reader panicked"))),
    }
}

/// Dumper for input that is already dump text
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl IndexDumper for PlainText {
    fn dump(&self, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }
}
