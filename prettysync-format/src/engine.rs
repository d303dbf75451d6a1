//! Formatter strategies: [`Formatter`], [`TransportFormatter`],
//! [`LinterFormatter`] and [`select`].
//!
//! | Strategy            | Chosen when             | Formats with                 |
//! |---------------------|-------------------------|------------------------------|
//! | `TransportFormatter`| no linter config given  | the remote pretty printer    |
//! | `LinterFormatter`   | linter config path given| an external command on stdin |

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use prettysync_core::{Include, Transport};

use crate::config::LinterConfig;
use crate::error::FormatError;

/// Produces the formatted replacement for an include's source.
pub trait Formatter {
    fn format(&self, include: &Include, source: &str) -> Result<String, FormatError>;
}

/// Resolve the formatter strategy once for a run.
///
/// With a linter config path, formats through the configured command;
/// otherwise through the transport's pretty printer.
pub fn select<'a>(
    transport: &'a dyn Transport,
    linter_config: Option<&Path>,
) -> Result<Box<dyn Formatter + 'a>, FormatError> {
    match linter_config {
        Some(path) => {
            let config = LinterConfig::load(path)?;
            tracing::debug!("formatting with linter '{}'", config.command);
            Ok(Box::new(LinterFormatter::new(config)))
        }
        None => {
            tracing::debug!("formatting with remote pretty printer");
            Ok(Box::new(TransportFormatter::new(transport)))
        }
    }
}

// ---------------------------------------------------------------------------
// Remote pretty printer
// ---------------------------------------------------------------------------

pub struct TransportFormatter<'a> {
    transport: &'a dyn Transport,
}

impl<'a> TransportFormatter<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }
}

impl Formatter for TransportFormatter<'_> {
    fn format(&self, _include: &Include, source: &str) -> Result<String, FormatError> {
        Ok(self.transport.pretty_print(source)?)
    }
}

// ---------------------------------------------------------------------------
// External linter
// ---------------------------------------------------------------------------

/// Pipes the source through an external command and reads the formatted text
/// from its stdout.
pub struct LinterFormatter {
    config: LinterConfig,
}

impl LinterFormatter {
    pub fn new(config: LinterConfig) -> Self {
        Self { config }
    }
}

impl Formatter for LinterFormatter {
    fn format(&self, include: &Include, source: &str) -> Result<String, FormatError> {
        let command = &self.config.command;
        let spawn_err = |source| FormatError::Spawn {
            command: command.clone(),
            source,
        };

        let mut child = Command::new(command)
            .args(self.config.args_for(include))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // Feed stdin from a separate thread so a chatty linter cannot block
        // on a full stdout pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.as_bytes().to_vec();
            std::thread::spawn(move || stdin.write_all(&input))
        });

        let output = child.wait_with_output().map_err(spawn_err)?;
        if !output.status.success() {
            return Err(FormatError::Linter {
                command: command.clone(),
                include: include.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(spawn_err(e));
                }
                Ok(_) => {}
                Err(_) => {
                    return Err(spawn_err(std::io::Error::other(
                        "stdin writer thread panicked",
                    )))
                }
            }
        }

        String::from_utf8(output.stdout).map_err(|_| FormatError::Encoding {
            command: command.clone(),
            include: include.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
