//! Interactive command shell for operating the Demido Discord bot.
//!
//! The shell reads one line at a time, splits it into a command name,
//! positional parameters and `--flags`, and dispatches it to a command
//! looked up by name or alias. Commands are registered from static
//! [`loader::Namespace`] tables at startup; the Discord commands live in a
//! separate extension registry reached through the `discord` forwarder.
//!
//! A failing, panicking or hanging command is reported and the loop keeps
//! going. The main entry point is [`Interpreter`].

pub mod builtin;
pub mod command;
pub mod config;
pub mod context;
pub mod discord;
pub mod env;
pub mod error;
mod interpreter;
mod io_adapters;
pub mod lexer;
pub mod loader;
pub mod logging;
pub mod parser;
pub mod registry;
pub mod updater;

pub use command::{Command, Flags};
pub use context::{Services, ShellContext};
pub use error::ShellError;
pub use interpreter::Interpreter;
pub use io_adapters::{LineSource, MemWriter, ScriptedInput, TerminalInput};
pub use registry::Registry;
