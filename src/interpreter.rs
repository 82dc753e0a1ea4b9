use crate::command::Command;
use crate::context::{Services, ShellContext};
use crate::error::{Result, ShellError};
use crate::io_adapters::LineSource;
use crate::lexer;
use crate::logging;
use crate::loader::Catalog;
use crate::parser::{self, Invocation};
use crate::registry::Registry;
use futures::FutureExt;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// The interactive read-eval loop.
///
/// The interpreter owns the input source and the main [`Registry`]. Each
/// iteration reads one line, parses it and awaits the resolved command before
/// prompting again, so no two handlers ever run at the same time.
///
/// Example
/// ```
/// use demido_shell::{Interpreter, MemWriter, ScriptedInput, Services, builtin, loader};
///
/// let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// rt.block_on(async {
///     let catalog = loader::load_catalog(builtin::namespace(), vec![]);
///     let input = ScriptedInput::new(["ghost", "exit"]);
///     let out = MemWriter::new();
///     let mut sh = Interpreter::new(catalog, Box::new(input), Services::default())
///         .with_output(Box::new(out.clone()));
///     sh.run().await.unwrap();
///     assert!(out.contents().contains("There is no command named `ghost`."));
/// });
/// ```
pub struct Interpreter {
    input: Option<Box<dyn LineSource>>,
    prompt: String,
    timeout: Option<Duration>,
    commands: Arc<Registry>,
    ctx: ShellContext,
}

impl Interpreter {
    /// Create an interpreter over loaded commands, writing to standard output.
    pub fn new(catalog: Catalog, input: Box<dyn LineSource>, services: Services) -> Self {
        let commands = Arc::new(catalog.commands);
        let ctx = ShellContext::new(
            Box::new(std::io::stdout()),
            Arc::clone(&commands),
            Arc::new(catalog.extensions),
            services,
        );
        Self {
            input: Some(input),
            prompt: String::new(),
            timeout: None,
            commands,
            ctx,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Cancel any handler that has not settled after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send user-facing output somewhere other than standard output.
    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.ctx.set_output(out);
        self
    }

    pub fn is_running(&self) -> bool {
        self.ctx.is_running() && self.input.is_some()
    }

    /// Stop the loop and release the input source. Safe to call repeatedly.
    pub fn stop(&mut self) {
        self.ctx.stop();
        self.release_input();
    }

    fn release_input(&mut self) {
        if let Some(mut input) = self.input.take() {
            input.close();
            tracing::debug!("input source released");
        }
    }

    /// Run until a command stops the shell or the input is exhausted.
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("shell started");
        while self.step().await? {}
        tracing::info!("shell stopped");
        Ok(())
    }

    /// Perform one iteration of the loop.
    ///
    /// Returns `Ok(false)` once the shell has stopped; no input is read then.
    pub async fn step(&mut self) -> Result<bool> {
        if !self.ctx.is_running() {
            self.release_input();
            return Ok(false);
        }
        let Some(input) = self.input.as_mut() else {
            return Ok(false);
        };
        let line = match input.read_line(&self.prompt) {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.stop();
                return Ok(false);
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to read input");
                self.stop();
                return Err(err);
            }
        };

        if let Some(invocation) = parser::parse_line(&lexer::normalize(&line)) {
            self.dispatch(invocation).await?;
        }

        if !self.ctx.is_running() {
            self.release_input();
        }
        Ok(self.is_running())
    }

    /// Resolve and run one invocation.
    ///
    /// Handler failures are reported and swallowed; only a failure to write
    /// to the output is returned.
    pub async fn dispatch(&mut self, invocation: Invocation) -> Result<()> {
        let Some(command) = self.commands.lookup(&invocation.name).cloned() else {
            tracing::debug!(command = %invocation.name, "no such command");
            writeln!(
                self.ctx.out(),
                "There is no command named `{}`.\nCheck \"help\" for more information.",
                invocation.name
            )?;
            return Ok(());
        };

        if let Err(err) = self.invoke(command, &invocation).await {
            let command = err.command().unwrap_or(invocation.name.as_str());
            tracing::error!(command, error = %err, "command failed");
            writeln!(self.ctx.out(), "{err}")?;
        }
        Ok(())
    }

    async fn invoke(&mut self, command: Arc<dyn Command>, invocation: &Invocation) -> Result<()> {
        let name = invocation.name.clone();
        tracing::debug!(command = %name, parameters = invocation.parameters.len(), "dispatching");
        let execution = AssertUnwindSafe(command.execute(
            &invocation.parameters,
            &invocation.flags,
            &mut self.ctx,
        ))
        .catch_unwind();

        let settled = match self.timeout {
            Some(after) => tokio::time::timeout(after, execution)
                .await
                .map_err(|_| ShellError::HandlerTimedOut {
                    name: name.clone(),
                    after,
                })?,
            None => execution.await,
        };

        match settled {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(ShellError::HandlerFailed { name, source }),
            Err(panic) => Err(ShellError::HandlerPanicked {
                name,
                message: logging::panic_payload(panic.as_ref()).to_string(),
            }),
        }
    }
}
