//! Per-adapter session state and I/O loops.
//!
//! An [`Adapter`] presents a message-oriented interface to the router and
//! hides the byte-stream transport and the sequence-number discipline.
//! The send loop drains a bounded queue into the transport; the receive
//! loop forwards decoded messages to the router's input channel tagged
//! with the session id.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tokio::process::Child;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pesticide_config::AdapterConfig;

use crate::codec;
use crate::error::DapError;
use crate::protocol::{
    Capabilities, InitializeRequestArguments, Message, Request, SourceBreakpoint, StackFrame,
    Thread,
};
use crate::transport::{Transport, TransportReader, TransportWriter};

/// Depth of the per-adapter send queue.
const SEND_QUEUE_DEPTH: usize = 64;

/// A decoded adapter message tagged with the session id that produced it.
#[derive(Debug)]
pub struct AdapterMessage {
    /// Session id of the originating adapter.
    pub id: String,
    /// The decoded DAP message.
    pub msg: Message,
}

/// Run-state of a debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// The `initialize`/`launch` handshake has not completed.
    Initializing,
    /// The debuggee is executing.
    Running,
    /// The debuggee is stopped (e.g. at a breakpoint).
    Stopped,
}

/// One debug-adapter session.
///
/// All mutable state is owned by the router task; the only cross-task
/// boundaries are the send queue and the shared sequence counter, which
/// the receive loop monotonically raises to match inbound messages.
pub struct Adapter {
    id: String,
    seq: Arc<AtomicI64>,
    launch_args: Option<serde_json::Value>,
    pending: HashMap<i64, Request>,
    send_tx: Option<mpsc::Sender<Message>>,
    send_rx: Option<mpsc::Receiver<Message>>,
    io: Option<(TransportReader, TransportWriter)>,
    child: Option<Child>,
    recv_task: Option<JoinHandle<()>>,

    /// Server capabilities from the `initialize` response.
    pub capabilities: Capabilities,
    /// Current run-state.
    pub state: RunState,
    /// Threads last reported by the adapter.
    pub threads: Vec<Thread>,
    /// Cached stacks by thread id, topmost frame first.
    pub stack_frames: HashMap<i64, Vec<StackFrame>>,
    /// Thread selected by the most recent `stopped` event.
    pub focused_thread: Option<i64>,
    /// Frame id selected within the focused thread's stack.
    pub focused_frame: Option<i64>,
    /// Source breakpoints by absolute file path.
    pub breakpoints: HashMap<PathBuf, Vec<SourceBreakpoint>>,
}

impl Adapter {
    /// Construct the transport and session state. No DAP message is sent
    /// until [`start`](Self::start).
    pub async fn new(config: &AdapterConfig) -> Result<Self, DapError> {
        let transport = Transport::connect(config).await?;
        Ok(Self::with_transport(transport, config.arguments.clone()))
    }

    /// Build a session over an already-open transport.
    pub fn with_transport(transport: Transport, launch_args: Option<serde_json::Value>) -> Self {
        let (id, child, reader, writer) = transport.into_parts();
        let (send_tx, send_rx) = mpsc::channel(SEND_QUEUE_DEPTH);
        Self {
            id,
            seq: Arc::new(AtomicI64::new(0)),
            launch_args,
            pending: HashMap::new(),
            send_tx: Some(send_tx),
            send_rx: Some(send_rx),
            io: Some((reader, writer)),
            child,
            recv_task: None,
            capabilities: Capabilities::default(),
            state: RunState::Initializing,
            threads: Vec::new(),
            stack_frames: HashMap::new(),
            focused_thread: None,
            focused_frame: None,
            breakpoints: HashMap::new(),
        }
    }

    /// The stable session id (subprocess PID or address string).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The configured opaque `launch` arguments.
    pub fn launch_arguments(&self) -> Option<&serde_json::Value> {
        self.launch_args.as_ref()
    }

    /// Launch the send and receive loops and begin initialization.
    ///
    /// Inbound messages are delivered to `sink` as [`AdapterMessage`]s in
    /// the order the adapter emitted them. The first outbound message is
    /// the `initialize` request carrying this client's fixed identity.
    pub async fn start<I>(&mut self, sink: mpsc::Sender<I>) -> Result<(), DapError>
    where
        I: From<AdapterMessage> + Send + 'static,
    {
        let (mut reader, mut writer) = self.io.take().ok_or(DapError::AlreadyStarted)?;
        let mut send_rx = self.send_rx.take().ok_or(DapError::AlreadyStarted)?;

        let send_id = self.id.clone();
        tokio::spawn(async move {
            while let Some(msg) = send_rx.recv().await {
                if let Err(e) = codec::write_message(&mut writer, &msg).await {
                    warn!("[{send_id}] unable to send message to adapter: {e}");
                    continue;
                }
                debug!("[{send_id}] <- {msg:?}");
            }
            debug!("[{send_id}] send loop exited");
        });

        let recv_id = self.id.clone();
        let seq = Arc::clone(&self.seq);
        self.recv_task = Some(tokio::spawn(async move {
            loop {
                let msg = match codec::read_message(&mut reader).await {
                    Ok(msg) => msg,
                    Err(DapError::Closed) => break,
                    Err(e) => {
                        warn!("[{recv_id}] error reading adapter message: {e}");
                        break;
                    }
                };
                // DAP sequences are strictly increasing across the session.
                seq.fetch_max(msg.seq(), Ordering::SeqCst);
                let is_output = matches!(&msg, Message::Event(ev) if ev.event == "output");
                if !is_output {
                    debug!("[{recv_id}] -> {msg:?}");
                }
                let tagged = AdapterMessage {
                    id: recv_id.clone(),
                    msg,
                };
                if sink.send(tagged.into()).await.is_err() {
                    break;
                }
            }
            debug!("[{recv_id}] receive loop exited");
        }));

        info!("[{}] started", self.id);

        let mut init = self.next_request("initialize");
        init.arguments = Some(serde_json::to_value(InitializeRequestArguments {
            client_id: "pesticide".into(),
            client_name: "Pesticide".into(),
            locale: "en-US".into(),
            path_format: "path".into(),
            lines_start_at1: true,
            columns_start_at1: true,
        })?);
        self.send(Message::Request(init)).await
    }

    /// Allocate the next sequence number and return a request envelope.
    pub fn next_request(&self, command: &str) -> Request {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        Request {
            seq,
            command: command.to_string(),
            arguments: None,
        }
    }

    /// Enqueue a message for the send loop. Requests are recorded in the
    /// pending table so their responses can be correlated.
    pub async fn send(&mut self, msg: Message) -> Result<(), DapError> {
        if let Message::Request(req) = &msg {
            self.pending.insert(req.seq, req.clone());
        }
        let tx = self.send_tx.as_ref().ok_or(DapError::QueueClosed)?;
        tx.send(msg).await.map_err(|_| DapError::QueueClosed)
    }

    /// Remove and return the pending request matching `request_seq`.
    pub fn take_pending(&mut self, request_seq: i64) -> Option<Request> {
        self.pending.remove(&request_seq)
    }

    /// Number of requests still awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Highest sequence number observed or allocated so far.
    pub fn current_seq(&self) -> i64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Tear the session down: close the send queue (ending the send loop),
    /// close the transport, and kill any owned subprocess. Idempotent.
    pub fn shutdown(&mut self) {
        let was_open = self.send_tx.take().is_some();
        self.send_rx = None;
        self.io = None;
        if let Some(task) = self.recv_task.take() {
            task.abort();
        }
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                debug!("[{}] failed to kill adapter process: {e}", self.id);
            }
        }
        if was_open {
            info!("[{}] exited", self.id);
        }
    }
}
