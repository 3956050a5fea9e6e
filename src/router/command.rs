//! User-command dispatch.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use pesticide_command::Command;
use pesticide_dap::protocol::{
    ContinueArguments, DisconnectArguments, EvaluateArguments, Message, PauseArguments,
    SourceBreakpoint,
};
use pesticide_dap::{Adapter, RunState};

use super::Router;

impl Router {
    pub(super) async fn handle_command(&mut self, cmd: Command) -> Result<()> {
        match cmd {
            Command::Backtrace => self.handle_backtrace().await,
            Command::Break { file, line } => self.handle_break(file, line).await,
            Command::Continue => self.handle_continue().await,
            Command::Down(n) => self.travel_stack_frame(-(n as i64)).await,
            Command::Evaluate { expr } => self.handle_evaluate(expr).await,
            Command::Launch { name } => self.handle_launch(name).await,
            Command::Pause => self.handle_pause().await,
            Command::Quit => self.handle_quit().await,
            Command::Up(n) => self.travel_stack_frame(n as i64).await,
        }
    }

    async fn handle_launch(&mut self, name: String) -> Result<()> {
        let config = self
            .config
            .adapters
            .get(&name)
            .with_context(|| format!("Unknown debug adapter {name}"))?
            .clone();
        let mut adapter = Adapter::new(&config).await?;
        adapter.start(self.input_tx.clone()).await?;
        let id = adapter.id().to_string();
        self.adapters.insert(id.clone(), adapter);
        self.focused = Some(id);
        self.println("Sent initialization request").await;
        Ok(())
    }

    async fn handle_break(&mut self, file: PathBuf, line: i64) -> Result<()> {
        let adapter = self.focused_adapter_mut()?;
        adapter
            .breakpoints
            .entry(file.clone())
            .or_default()
            .push(SourceBreakpoint {
                line,
                condition: None,
            });
        super::dap::send_breakpoints_for(adapter, &file).await
    }

    async fn handle_continue(&mut self) -> Result<()> {
        let adapter = self.focused_adapter_mut()?;
        let thread_id = adapter.focused_thread.unwrap_or(1);
        let mut req = adapter.next_request("continue");
        req.arguments = Some(serde_json::to_value(ContinueArguments { thread_id })?);
        adapter.send(Message::Request(req)).await?;
        Ok(())
    }

    async fn handle_pause(&mut self) -> Result<()> {
        let adapter = self.focused_adapter_mut()?;
        let thread_id = adapter.focused_thread.unwrap_or(1);
        let mut req = adapter.next_request("pause");
        req.arguments = Some(serde_json::to_value(PauseArguments { thread_id })?);
        adapter.send(Message::Request(req)).await?;
        Ok(())
    }

    async fn handle_evaluate(&mut self, expr: String) -> Result<()> {
        let adapter = self.focused_adapter_mut()?;
        if adapter.state != RunState::Stopped {
            bail!("Cannot evaluate expressions while running");
        }
        let frame_id = adapter.focused_frame.context("No stack frame in context")?;
        let mut req = adapter.next_request("evaluate");
        req.arguments = Some(serde_json::to_value(EvaluateArguments {
            expression: expr,
            frame_id: Some(frame_id),
            context: Some("repl".into()),
        })?);
        adapter.send(Message::Request(req)).await?;
        Ok(())
    }

    async fn handle_backtrace(&mut self) -> Result<()> {
        let adapter = self.focused_adapter_mut()?;
        let frames: &[_] = match adapter.focused_thread {
            Some(thread_id) => adapter
                .stack_frames
                .get(&thread_id)
                .map(|frames| frames.as_slice())
                .unwrap_or_default(),
            None => &[],
        };
        let lines: Vec<String> = frames
            .iter()
            .map(|frame| {
                let path = frame
                    .source
                    .as_ref()
                    .and_then(|source| source.path.as_deref())
                    .unwrap_or("<unknown>");
                format!("{path}:{}", frame.line)
            })
            .collect();
        for line in lines {
            self.println(line).await;
        }
        Ok(())
    }

    /// Move the focused stack frame by `delta` within the cached stack of
    /// the focused thread, clamped at both ends, then re-display the
    /// source location.
    async fn travel_stack_frame(&mut self, delta: i64) -> Result<()> {
        let adapter = self.focused_adapter_mut()?;
        let current = adapter.focused_frame.context("No stack frame in context")?;
        let thread_id = adapter
            .focused_thread
            .context("No stack frame in context")?;
        let frames = adapter
            .stack_frames
            .get(&thread_id)
            .filter(|frames| !frames.is_empty())
            .context("No stack frame in context")?;

        let index = frames
            .iter()
            .position(|frame| frame.id == current)
            .unwrap_or(0) as i64;
        let target = (index + delta).clamp(0, frames.len() as i64 - 1) as usize;
        adapter.focused_frame = Some(frames[target].id);

        let location = super::dap::render_file_location(&frames[target]);
        match location {
            Ok(lines) => {
                for line in lines {
                    self.println(line).await;
                }
            }
            Err(e) => self.println(e.to_string()).await,
        }
        Ok(())
    }

    async fn handle_quit(&mut self) -> Result<()> {
        if self.focused.is_none() {
            // Quit everything: close the input channel and let the run
            // loop drain and tear down.
            self.input.close();
            return Ok(());
        }
        let adapter = self.focused_adapter_mut()?;
        if adapter.capabilities.terminate() {
            let req = adapter.next_request("terminate");
            adapter.send(Message::Request(req)).await?;
        } else {
            let mut req = adapter.next_request("disconnect");
            req.arguments = Some(serde_json::to_value(DisconnectArguments {
                terminate_debuggee: Some(true),
            })?);
            adapter.send(Message::Request(req)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{attach_adapter, test_router};
    use super::super::Input;
    use super::*;
    use pesticide_dap::protocol::{Source, StackFrame};

    fn frame(id: i64, path: &str, line: i64) -> StackFrame {
        StackFrame {
            id,
            name: format!("fn{id}"),
            source: Some(Source {
                name: None,
                path: Some(path.to_string()),
                source_reference: None,
            }),
            line,
            column: 1,
        }
    }

    #[tokio::test]
    async fn continue_without_focused_adapter_is_an_error() {
        let (mut router, mut output) = test_router();
        router.dispatch(Input::Command(Command::Continue)).await;
        assert_eq!(output.recv().await.unwrap(), "No adapter in focus");
    }

    #[tokio::test]
    async fn launch_with_unknown_name_is_an_error() {
        let (mut router, mut output) = test_router();
        router
            .dispatch(Input::Command(Command::Launch {
                name: "nope".into(),
            }))
            .await;
        assert_eq!(output.recv().await.unwrap(), "Unknown debug adapter nope");
        assert!(router.adapters.is_empty());
    }

    #[tokio::test]
    async fn continue_sends_request_for_focused_thread() {
        let (mut router, _output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        router.adapters.get_mut("a1").unwrap().focused_thread = Some(4);
        router.dispatch(Input::Command(Command::Continue)).await;

        let req = fake.expect_request("continue").await;
        assert_eq!(req.arguments.unwrap()["threadId"], 4);
    }

    #[tokio::test]
    async fn pause_defaults_to_thread_one() {
        let (mut router, _output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        router.dispatch(Input::Command(Command::Pause)).await;

        let req = fake.expect_request("pause").await;
        assert_eq!(req.arguments.unwrap()["threadId"], 1);
    }

    #[tokio::test]
    async fn break_records_and_sends_full_breakpoint_list() {
        let (mut router, _output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        let file = PathBuf::from("/tmp/a.c");
        router
            .dispatch(Input::Command(Command::Break {
                file: file.clone(),
                line: 10,
            }))
            .await;
        let req = fake.expect_request("setBreakpoints").await;
        let args = req.arguments.unwrap();
        assert_eq!(args["source"]["path"], "/tmp/a.c");
        assert_eq!(args["breakpoints"][0]["line"], 10);

        router
            .dispatch(Input::Command(Command::Break { file, line: 20 }))
            .await;
        let req = fake.expect_request("setBreakpoints").await;
        let bps = req.arguments.unwrap()["breakpoints"].clone();
        // Always the full list, never a delta.
        assert_eq!(bps[0]["line"], 10);
        assert_eq!(bps[1]["line"], 20);
    }

    #[tokio::test]
    async fn evaluate_requires_stopped_state() {
        let (mut router, mut output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        router.adapters.get_mut("a1").unwrap().state = RunState::Running;
        router
            .dispatch(Input::Command(Command::Evaluate {
                expr: "1+1".into(),
            }))
            .await;
        assert_eq!(
            output.recv().await.unwrap(),
            "Cannot evaluate expressions while running"
        );
        // Only the initialize request is pending; no evaluate was issued.
        assert_eq!(router.adapters.get("a1").unwrap().pending_count(), 1);
    }

    #[tokio::test]
    async fn evaluate_when_stopped_uses_focused_frame_and_repl_context() {
        let (mut router, _output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        {
            let adapter = router.adapters.get_mut("a1").unwrap();
            adapter.state = RunState::Stopped;
            adapter.focused_frame = Some(77);
        }
        router
            .dispatch(Input::Command(Command::Evaluate {
                expr: "x + y".into(),
            }))
            .await;

        let req = fake.expect_request("evaluate").await;
        let args = req.arguments.unwrap();
        assert_eq!(args["expression"], "x + y");
        assert_eq!(args["frameId"], 77);
        assert_eq!(args["context"], "repl");
    }

    #[tokio::test]
    async fn backtrace_renders_path_and_line_per_frame() {
        let (mut router, mut output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        {
            let adapter = router.adapters.get_mut("a1").unwrap();
            adapter.focused_thread = Some(1);
            adapter.stack_frames.insert(
                1,
                vec![frame(1, "/src/main.c", 14), frame(2, "/src/util.c", 80)],
            );
        }
        router.dispatch(Input::Command(Command::Backtrace)).await;
        assert_eq!(output.recv().await.unwrap(), "/src/main.c:14");
        assert_eq!(output.recv().await.unwrap(), "/src/util.c:80");
    }

    #[tokio::test]
    async fn up_and_down_clamp_at_stack_ends() {
        let (mut router, mut output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        {
            let adapter = router.adapters.get_mut("a1").unwrap();
            adapter.focused_thread = Some(1);
            adapter.focused_frame = Some(1);
            adapter.stack_frames.insert(
                1,
                vec![
                    frame(1, "/missing/a.c", 1),
                    frame(2, "/missing/b.c", 2),
                    frame(3, "/missing/c.c", 3),
                ],
            );
        }

        // Up past the outermost frame clamps to the last index.
        router.dispatch(Input::Command(Command::Up(10))).await;
        assert_eq!(
            router.adapters.get("a1").unwrap().focused_frame,
            Some(3)
        );
        // The source files do not exist; a diagnostic is displayed.
        assert!(output.recv().await.unwrap().contains("/missing/c.c"));

        // Down past the top clamps to index 0.
        router.dispatch(Input::Command(Command::Down(10))).await;
        assert_eq!(
            router.adapters.get("a1").unwrap().focused_frame,
            Some(1)
        );
    }

    #[tokio::test]
    async fn up_without_stack_is_an_error() {
        let (mut router, mut output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        router.dispatch(Input::Command(Command::Up(1))).await;
        assert_eq!(output.recv().await.unwrap(), "No stack frame in context");
    }

    #[tokio::test]
    async fn quit_prefers_terminate_when_supported() {
        let (mut router, _output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        router
            .adapters
            .get_mut("a1")
            .unwrap()
            .capabilities
            .supports_terminate_request = Some(true);
        router.dispatch(Input::Command(Command::Quit)).await;
        fake.expect_request("terminate").await;
    }

    #[tokio::test]
    async fn quit_falls_back_to_disconnect() {
        let (mut router, _output) = test_router();
        let mut fake = attach_adapter(&mut router, "a1").await;
        fake.expect_request("initialize").await;

        router.dispatch(Input::Command(Command::Quit)).await;
        let req = fake.expect_request("disconnect").await;
        assert_eq!(req.arguments.unwrap()["terminateDebuggee"], true);
    }

    #[tokio::test]
    async fn quit_without_focus_closes_the_input_channel() {
        let (mut router, _output) = test_router();
        let input_tx = router.input_tx.clone();
        router.dispatch(Input::Command(Command::Quit)).await;
        assert!(input_tx
            .send(Input::Command(Command::Continue))
            .await
            .is_err());
    }
}
