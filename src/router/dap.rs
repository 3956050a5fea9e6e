//! Adapter-message dispatch.
//!
//! Responses are correlated to their originating request through the
//! adapter's pending table; events drive run-state, focus, and teardown.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use pesticide_dap::protocol::{
    ErrorResponseBody, Event, EvaluateResponseBody, Message, OutputEventBody, Request, Response,
    SetBreakpointsArguments, Source, StackFrame, StackTraceArguments, StackTraceResponseBody,
    StoppedEventBody,
};
use pesticide_dap::{Adapter, AdapterMessage, RunState};

use super::Router;

impl Router {
    pub(super) async fn handle_dap(&mut self, msg: AdapterMessage) -> Result<()> {
        let AdapterMessage { id, msg } = msg;
        if !self.adapters.contains_key(&id) {
            bail!("Received message for nonexistent adapter");
        }
        match msg {
            Message::Response(res) => self.handle_response(&id, res).await,
            Message::Event(ev) => self.handle_event(&id, ev).await,
            Message::Request(req) => {
                debug!("[{id}] ignoring reverse request: {}", req.command);
                Ok(())
            }
        }
    }

    async fn handle_response(&mut self, id: &str, res: Response) -> Result<()> {
        let adapter = self
            .adapters
            .get_mut(id)
            .context("Received message for nonexistent adapter")?;
        let Some(request) = adapter.take_pending(res.request_seq) else {
            bail!("Received a response to a non-existent request");
        };

        if !res.success {
            let detail = error_summary(&res);
            self.println(format!("{} error: {detail}", res.command)).await;
            return Ok(());
        }

        match res.command.as_str() {
            "initialize" => self.on_initialize_response(id, res).await,
            "stackTrace" => self.on_stack_trace_response(id, res, request).await,
            "evaluate" => self.on_evaluate_response(res).await,
            // Unknown response kinds: the pending entry is gone, nothing
            // else to do.
            _ => Ok(()),
        }
    }

    async fn handle_event(&mut self, id: &str, ev: Event) -> Result<()> {
        match ev.event.as_str() {
            "initialized" => self.on_initialized_event(id).await,
            "stopped" => self.on_stopped_event(id, ev).await,
            "continued" => {
                let adapter = self.adapter_mut(id)?;
                adapter.state = RunState::Running;
                Ok(())
            }
            "output" => {
                let body: OutputEventBody =
                    serde_json::from_value(ev.body.context("output event had no body")?)?;
                self.println(body.output.trim().to_string()).await;
                Ok(())
            }
            "terminated" => {
                if let Some(mut adapter) = self.adapters.remove(id) {
                    adapter.shutdown();
                }
                if self.focused.as_deref() == Some(id) {
                    self.focused = None;
                }
                Ok(())
            }
            other => {
                debug!("[{id}] ignoring event: {other}");
                Ok(())
            }
        }
    }

    async fn on_initialize_response(&mut self, id: &str, res: Response) -> Result<()> {
        let adapter = self.adapter_mut(id)?;
        adapter.capabilities = res
            .body
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();
        let mut req = adapter.next_request("launch");
        req.arguments = adapter.launch_arguments().cloned();
        adapter.send(Message::Request(req)).await?;
        Ok(())
    }

    async fn on_initialized_event(&mut self, id: &str) -> Result<()> {
        let adapter = self.adapter_mut(id)?;
        adapter.state = RunState::Running;
        let files: Vec<_> = adapter.breakpoints.keys().cloned().collect();
        for file in files {
            send_breakpoints_for(adapter, &file).await?;
        }
        if adapter.capabilities.configuration_done() {
            let req = adapter.next_request("configurationDone");
            adapter.send(Message::Request(req)).await?;
        }
        Ok(())
    }

    async fn on_stopped_event(&mut self, id: &str, ev: Event) -> Result<()> {
        let body: StoppedEventBody =
            serde_json::from_value(ev.body.context("stopped event had no body")?)?;
        let adapter = self.adapter_mut(id)?;
        adapter.state = RunState::Stopped;
        if let Some(thread_id) = body.thread_id {
            adapter.focused_thread = Some(thread_id);
            let mut req = adapter.next_request("stackTrace");
            req.arguments = Some(serde_json::to_value(StackTraceArguments { thread_id })?);
            adapter.send(Message::Request(req)).await?;
        }
        self.println(format!(
            "{id} stopped: {}: {}",
            body.reason,
            body.text.unwrap_or_default()
        ))
        .await;
        Ok(())
    }

    async fn on_stack_trace_response(
        &mut self,
        id: &str,
        res: Response,
        request: Request,
    ) -> Result<()> {
        let args: StackTraceArguments = serde_json::from_value(
            request
                .arguments
                .context("stackTrace request had no arguments")?,
        )?;
        let body: StackTraceResponseBody =
            serde_json::from_value(res.body.context("stackTrace response had no body")?)?;

        let adapter = self.adapter_mut(id)?;
        adapter.focused_frame = body.stack_frames.first().map(|frame| frame.id);
        let location = body.stack_frames.first().map(render_file_location);
        adapter.stack_frames.insert(args.thread_id, body.stack_frames);

        match location {
            Some(Ok(lines)) => {
                for line in lines {
                    self.println(line).await;
                }
            }
            Some(Err(e)) => self.println(e.to_string()).await,
            None => {}
        }
        Ok(())
    }

    async fn on_evaluate_response(&mut self, res: Response) -> Result<()> {
        let body: EvaluateResponseBody =
            serde_json::from_value(res.body.context("evaluate response had no body")?)?;
        self.println(body.result).await;
        Ok(())
    }

    fn adapter_mut(&mut self, id: &str) -> Result<&mut Adapter> {
        self.adapters
            .get_mut(id)
            .context("Received message for nonexistent adapter")
    }
}

/// Replace the adapter's entire breakpoint set for one source with the
/// full list the router tracks for it. DAP semantics make every
/// `setBreakpoints` a replacement, so deltas are never sent.
pub(super) async fn send_breakpoints_for(adapter: &mut Adapter, file: &Path) -> Result<()> {
    let breakpoints = adapter.breakpoints.get(file).cloned().unwrap_or_default();
    let path = file.to_string_lossy().into_owned();
    let mut req = adapter.next_request("setBreakpoints");
    req.arguments = Some(serde_json::to_value(SetBreakpointsArguments {
        source: Source {
            name: Some(path.clone()),
            path: Some(path),
            source_reference: None,
        },
        breakpoints,
    })?);
    adapter.send(Message::Request(req)).await?;
    Ok(())
}

/// Render the source window around a stack frame: lines `line-3..=line+3`
/// clamped to the file, 3-digit right-justified line numbers, the current
/// line marked with `->`.
pub(super) fn render_file_location(frame: &StackFrame) -> Result<Vec<String>> {
    let source = frame.source.as_ref().context("No source for stack frame")?;
    if source.source_reference.unwrap_or(0) != 0 {
        bail!("Cannot display source: frame has a sourceReference, not a path");
    }
    let path = source
        .path
        .as_deref()
        .filter(|path| !path.is_empty())
        .context("No source path for stack frame")?;
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Unable to read {path}"))?;
    let lines: Vec<&str> = contents.split('\n').collect();

    let current = frame.line;
    if current < 1 || current > lines.len() as i64 {
        bail!("Invalid line number");
    }

    let mut output = Vec::new();
    for number in (current - 3)..=(current + 3) {
        if number < 1 || number > lines.len() as i64 {
            continue;
        }
        let prefix = if number == current { "->" } else { "" };
        output.push(format!(
            "{prefix:>3} {number:>3}: {}",
            lines[(number - 1) as usize]
        ));
    }
    Ok(output)
}

/// Error summary shown for an unsuccessful response: the adapter's
/// `message`, falling back to the structured `body.error` format.
fn error_summary(res: &Response) -> String {
    res.message
        .clone()
        .or_else(|| {
            let body: ErrorResponseBody = res
                .body
                .clone()
                .and_then(|body| serde_json::from_value(body).ok())
                .unwrap_or_default();
            body.error.map(|e| e.format)
        })
        .unwrap_or_else(|| "unknown error".into())
}
