//! The central multiplexer.
//!
//! The router is a single task that owns every adapter session and all of
//! their mutable state. It drains one input channel carrying both user
//! commands and adapter messages, dispatches to the handlers in
//! [`command`] and [`dap`], and emits display lines on the output channel
//! consumed by the prompt. Handler errors become display lines; nothing
//! short-circuits the loop.

mod command;
mod dap;

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::info;

use pesticide_command::Command;
use pesticide_config::Config;
use pesticide_dap::{Adapter, AdapterMessage};

/// One unit of work for the router: a parsed user command or a tagged
/// adapter message.
#[derive(Debug)]
pub enum Input {
    /// A command from the prompt.
    Command(Command),
    /// A decoded DAP message from one adapter's receive loop.
    Adapter(AdapterMessage),
}

impl From<AdapterMessage> for Input {
    fn from(msg: AdapterMessage) -> Self {
        Input::Adapter(msg)
    }
}

/// The router task state.
pub struct Router {
    input: mpsc::Receiver<Input>,
    /// Cloned into each adapter's receive loop as its message sink.
    input_tx: mpsc::Sender<Input>,
    output: mpsc::Sender<String>,
    config: Config,
    adapters: HashMap<String, Adapter>,
    /// Id of the adapter user commands are routed to.
    focused: Option<String>,
}

impl Router {
    /// Build a router over the given channels and configuration table.
    pub fn new(
        input: mpsc::Receiver<Input>,
        input_tx: mpsc::Sender<Input>,
        output: mpsc::Sender<String>,
        config: Config,
    ) -> Self {
        Self {
            input,
            input_tx,
            output,
            config,
            adapters: HashMap::new(),
            focused: None,
        }
    }

    /// Drain the input channel until it closes, then tear down every
    /// remaining adapter. Dropping the router closes the output channel.
    pub async fn run(mut self) {
        while let Some(input) = self.input.recv().await {
            self.dispatch(input).await;
        }
        for adapter in self.adapters.values_mut() {
            adapter.shutdown();
        }
        self.adapters.clear();
        info!("router exited");
    }

    /// Handle one input; errors are reported as display lines.
    async fn dispatch(&mut self, input: Input) {
        let result = match input {
            Input::Command(cmd) => self.handle_command(cmd).await,
            Input::Adapter(msg) => self.handle_dap(msg).await,
        };
        if let Err(e) = result {
            self.println(e.to_string()).await;
        }
    }

    /// Emit one display line.
    async fn println(&mut self, line: impl Into<String>) {
        let _ = self.output.send(line.into()).await;
    }

    /// The focused adapter, or the routing error shown to the user.
    fn focused_adapter_mut(&mut self) -> anyhow::Result<&mut Adapter> {
        use anyhow::Context;
        let id = self.focused.as_ref().context("No adapter in focus")?;
        self.adapters.get_mut(id).context("No adapter in focus")
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------
