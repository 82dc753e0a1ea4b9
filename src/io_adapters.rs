//! Input sources and output sinks for the interpreter.

use crate::error::{Result, ShellError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::io::{Result as IoResult, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A source of input lines, owned by the interpreter for its whole lifetime.
pub trait LineSource {
    /// Print `prompt` and read one line.
    ///
    /// `Ok(None)` means the source is exhausted (end of input or the user
    /// interrupted the session).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Release the underlying resource. Called exactly once, when the shell stops.
    fn close(&mut self) {}
}

/// Interactive terminal input backed by rustyline.
///
/// History is kept in memory for the session only.
pub struct TerminalInput {
    editor: DefaultEditor,
}

impl TerminalInput {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new().map_err(ShellError::Input)?,
        })
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str()).map_err(ShellError::Input)?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) => {
                tracing::info!("input interrupted");
                Ok(None)
            }
            Err(ReadlineError::Eof) => {
                tracing::info!("end of input");
                Ok(None)
            }
            Err(err) => Err(ShellError::Input(err)),
        }
    }
}

/// In-memory input that yields a fixed list of lines.
///
/// Cloned handles share the read counter, so a test can keep one handle and
/// observe how many reads the interpreter performed.
#[derive(Clone)]
pub struct ScriptedInput {
    lines: Arc<Mutex<VecDeque<String>>>,
    reads: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(Mutex::new(lines.into_iter().map(Into::into).collect())),
            reads: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `read_line` calls so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `close` calls so far.
    pub fn closes(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut lines = self.lines.lock().map_err(|_| ShellError::Poisoned)?;
        Ok(lines.pop_front())
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Memory-backed writer for capturing command output.
///
/// Clones share one buffer.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        match self.buf.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf
            .lock()
            .map_err(|_| std::io::Error::other("output buffer poisoned"))?
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
