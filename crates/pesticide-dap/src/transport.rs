//! Adapter endpoints.
//!
//! A transport owns the bidirectional byte stream for one adapter: a
//! spawned subprocess speaking DAP on stdio, a TCP connection, or both
//! (spawn first, then dial after a warm-up delay).

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};

use pesticide_config::AdapterConfig;

use crate::error::DapError;

/// Boxed read half of a transport.
pub type TransportReader = Box<dyn AsyncBufRead + Send + Unpin>;
/// Boxed write half of a transport.
pub type TransportWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// How long a spawned adapter gets to open its listening port before the
/// TCP connection is attempted in combined mode.
const TCP_WARMUP_DELAY: Duration = Duration::from_millis(500);

/// An open byte stream to one debug adapter, plus the owned subprocess
/// when the adapter was spawned.
pub struct Transport {
    id: String,
    child: Option<Child>,
    reader: TransportReader,
    writer: TransportWriter,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").field("id", &self.id).finish()
    }
}

impl Transport {
    /// Open the endpoint described by `config`.
    ///
    /// The session id is the child PID in subprocess mode and the address
    /// string in TCP and combined modes.
    ///
    /// # Errors
    ///
    /// Any failure (command splitting, spawn, pipe acquisition, dial) is a
    /// construction error; nothing is left running.
    pub async fn connect(config: &AdapterConfig) -> Result<Self, DapError> {
        let mut child = None;
        let mut parts: Option<(String, TransportReader, TransportWriter)> = None;

        if let Some(cmd) = &config.command {
            let argv =
                shlex::split(cmd).ok_or_else(|| DapError::BadCommand(cmd.clone()))?;
            let Some((program, args)) = argv.split_first() else {
                return Err(DapError::BadCommand(cmd.clone()));
            };

            let mut command = Command::new(program);
            command
                .args(args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::null());
            // Terminal signals must not propagate to the adapter.
            #[cfg(unix)]
            command.process_group(0);

            let mut spawned = command
                .spawn()
                .map_err(|e| DapError::Spawn(format!("{program}: {e}")))?;
            let stdin = spawned
                .stdin
                .take()
                .ok_or_else(|| DapError::Spawn("could not capture stdin".into()))?;
            let stdout = spawned
                .stdout
                .take()
                .ok_or_else(|| DapError::Spawn("could not capture stdout".into()))?;

            let id = spawned
                .id()
                .map(|pid| pid.to_string())
                .unwrap_or_else(|| program.clone());
            parts = Some((id, Box::new(BufReader::new(stdout)), Box::new(stdin)));
            child = Some(spawned);
        }

        if let Some(addr) = &config.address {
            if child.is_some() {
                // Give the spawned adapter time to open its listening port.
                tokio::time::sleep(TCP_WARMUP_DELAY).await;
            }
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|source| DapError::Connect {
                    addr: addr.clone(),
                    source,
                })?;
            let (read_half, write_half) = stream.into_split();
            parts = Some((
                addr.clone(),
                Box::new(BufReader::new(read_half)),
                Box::new(write_half),
            ));
        }

        let Some((id, reader, writer)) = parts else {
            return Err(DapError::NoEndpoint);
        };
        Ok(Self {
            id,
            child,
            reader,
            writer,
        })
    }

    /// Build a transport over arbitrary streams. Used by tests to stand in
    /// a scripted adapter without a process or a socket.
    pub fn from_io(
        id: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            child: None,
            reader: Box::new(BufReader::new(reader)),
            writer: Box::new(writer),
        }
    }

    /// The session id derived from the endpoint.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Split into (id, child, reader, writer) for the session loops.
    pub fn into_parts(self) -> (String, Option<Child>, TransportReader, TransportWriter) {
        (self.id, self.child, self.reader, self.writer)
    }
}
