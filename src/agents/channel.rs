use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{AppError, AppResult, WireError};
use crate::wire::{decode_header, decode_reply, Reply, HEADER_BYTES, MAX_PAYLOAD_BYTES};

/// One long-lived control connection to an agent.
///
/// The driver is the only reader and writer. Every read is bounded by a
/// caller-supplied deadline; a short write surfaces as a fatal I/O error.
pub struct AgentChannel {
    stream: TcpStream,
}

impl AgentChannel {
    pub async fn connect(addr: &str) -> AppResult<AgentChannel> {
        let stream = TcpStream::connect(addr).await.map_err(|err| {
            AppError::wire(WireError::Connect {
                addr: addr.to_owned(),
                source: err,
            })
        })?;
        Ok(AgentChannel { stream })
    }

    pub async fn send(&mut self, frame: &[u8]) -> AppResult<()> {
        self.stream.write_all(frame).await.map_err(|err| {
            AppError::wire(WireError::Io {
                context: "send frame",
                source: err,
            })
        })
    }

    /// Reads one reply frame, failing with a deadline error if the agent does
    /// not produce it in time.
    pub async fn read_reply(
        &mut self,
        deadline: Duration,
        context: &'static str,
    ) -> AppResult<Reply> {
        match timeout(deadline, self.read_reply_frame()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::wire(WireError::Deadline { context })),
        }
    }

    async fn read_reply_frame(&mut self) -> AppResult<Reply> {
        let mut header_bytes = [0u8; HEADER_BYTES];
        self.stream
            .read_exact(&mut header_bytes)
            .await
            .map_err(|err| map_read_err(err, "read reply header"))?;
        let header = decode_header(&header_bytes);
        let length = header.length as usize;
        if length > MAX_PAYLOAD_BYTES {
            return Err(AppError::wire(WireError::PayloadTooLarge {
                max_bytes: MAX_PAYLOAD_BYTES,
            }));
        }
        let mut payload = vec![0u8; length];
        self.stream
            .read_exact(&mut payload)
            .await
            .map_err(|err| map_read_err(err, "read reply payload"))?;
        decode_reply(&header, &payload).map_err(AppError::wire)
    }
}

fn map_read_err(err: std::io::Error, context: &'static str) -> AppError {
    if err.kind() == ErrorKind::UnexpectedEof {
        AppError::wire(WireError::ConnectionClosed)
    } else {
        AppError::wire(WireError::Io {
            context,
            source: err,
        })
    }
}
