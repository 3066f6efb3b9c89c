use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Connection error to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Connection closed by agent.")]
    ConnectionClosed,
    #[error("Read timed out during {context}.")]
    Deadline { context: &'static str },
    #[error("Unknown message type {msg_type}.")]
    UnknownMessageType { msg_type: u32 },
    #[error("Unknown report kind {kind}.")]
    UnknownReportKind { kind: u32 },
    #[error("Message length {length} does not match the payload of message type {msg_type}.")]
    LengthMismatch { msg_type: u32, length: u32 },
    #[error("Frame payload exceeded {max_bytes} bytes.")]
    PayloadTooLarge { max_bytes: usize },
    #[error("Truncated {context}: {source}")]
    Truncated {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Expected {expected} from agent {agent}, got message type {actual}.")]
    UnexpectedReply {
        agent: String,
        expected: &'static str,
        actual: u32,
    },
}
