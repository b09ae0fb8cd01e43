//! External encoder subprocess.
//!
//! The packed stream is handed to a lossless encoder (ffmpeg by default)
//! through its standard input. Standard output and standard error are
//! piped so that, when the encoder dies, its diagnostics can be attached
//! to the error returned to the caller.
//!
//! Closing the sink only closes the encoder's stdin; the process is never
//! killed and is expected to finish the file and exit on its own.

use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EncoderExit, HummingbirdError};
use crate::sink::EncoderSink;

/// Placeholder replaced by the output path in [`EncoderCommand::args`].
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

// ── EncoderCommand ───────────────────────────────────────────────

/// Program and argument template used to launch the encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments; every occurrence of `{output}` is replaced by the
    /// output path.
    ///
    /// The encoder's stdout and stderr are only read after it exits, so
    /// it must stay quiet while running: more output than one pipe buffer
    /// (typically 64 KiB) blocks the encoder and with it every `push`.
    /// The default ffmpeg arguments pass `-loglevel error -nostats` and
    /// write the video to a file for that reason.
    pub args: Vec<String>,
}

impl Default for EncoderCommand {
    fn default() -> Self {
        Self {
            program: "ffmpeg".into(),
            args: [
                "-y",
                "-loglevel",
                "error",
                "-nostats",
                "-i",
                "pipe:",
                "-c:v",
                "libx264",
                "-preset",
                "veryslow",
                "-pix_fmt",
                "yuv420p",
                "-crf",
                "0",
                OUTPUT_PLACEHOLDER,
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl EncoderCommand {
    /// Arguments with the output placeholder expanded.
    pub fn expand_args(&self, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

// ── EncoderProcess ───────────────────────────────────────────────

/// A running encoder, used as the generator's sink.
pub struct EncoderProcess {
    program: String,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    /// Cached once observed; stdout/stderr can only be drained once.
    exit: Option<EncoderExit>,
}

impl EncoderProcess {
    /// Launch `command` writing to `output`.
    pub fn spawn(command: &EncoderCommand, output: &Path) -> Result<Self, HummingbirdError> {
        let args = command.expand_args(output);
        let mut child = Command::new(&command.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HummingbirdError::EncoderUnavailable {
                program: command.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().map(BufWriter::new);
        info!(program = %command.program, pid = child.id(), ?args, "encoder started");

        Ok(Self {
            program: command.program.clone(),
            child,
            stdin,
            exit: None,
        })
    }

    /// OS process id of the encoder.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Close stdin (if still open) and block until the encoder exits.
    pub fn wait(&mut self) -> io::Result<ExitStatus> {
        EncoderSink::close(self)?;
        self.child.wait()
    }

    /// Drain a pipe that is no longer being written to.
    fn drain(pipe: Option<impl Read>) -> String {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                warn!("failed to read encoder output: {e}");
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn input(&mut self) -> io::Result<&mut BufWriter<ChildStdin>> {
        self.stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "encoder input is closed"))
    }
}

impl Write for EncoderProcess {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.input()?.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.input()?.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.input()?.flush()
    }
}

impl EncoderSink for EncoderProcess {
    fn try_exit(&mut self) -> io::Result<Option<EncoderExit>> {
        if self.exit.is_none() {
            if let Some(status) = self.child.try_wait()? {
                let exit = EncoderExit {
                    code: status.code(),
                    stdout: Self::drain(self.child.stdout.take()),
                    stderr: Self::drain(self.child.stderr.take()),
                };
                warn!(program = %self.program, code = ?exit.code, "encoder exited");
                self.exit = Some(exit);
            }
        }
        Ok(self.exit.clone())
    }

    fn close(&mut self) -> io::Result<()> {
        match self.stdin.take() {
            // Dropping the writer closes the pipe even if the flush fails.
            Some(mut stdin) => stdin.flush(),
            None => Ok(()),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
