use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Malformed or misaddressed traffic. Always logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("signal addressed to {to}, not to us")]
    Misaddressed { to: String },

    #[error("no connection for peer {0}")]
    UnknownPeer(String),

    #[error("not joined to a room")]
    NotJoined,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),

    #[error("connect failed: {0}")]
    Connect(String),
}

/// Failures reported by the peer-connection primitive. Scoped to one peer.
#[derive(Debug, thiserror::Error)]
pub enum NegotiationError {
    #[error("create offer failed: {0}")]
    CreateOffer(String),

    #[error("create answer failed: {0}")]
    CreateAnswer(String),

    #[error("description rejected: {0}")]
    Description(String),

    #[error("ice candidate rejected: {0}")]
    Candidate(String),

    #[error("track error: {0}")]
    Track(String),

    #[error("connection setup failed: {0}")]
    Setup(String),

    #[error("{0}")]
    InvalidTransition(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("media permission denied")]
    PermissionDenied,

    #[error("no capture device: {0}")]
    NoDevice(String),

    #[error("capture failed: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MeetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("relay.port must be non-zero".into());
        assert_eq!(
            err.to_string(),
            "config validation error: relay.port must be non-zero"
        );
    }

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::Misaddressed { to: "b1".into() };
        assert_eq!(err.to_string(), "signal addressed to b1, not to us");

        let err = ProtocolError::UnknownType("wave".into());
        assert_eq!(err.to_string(), "unknown message type: wave");
    }

    #[test]
    fn meet_error_from_negotiation() {
        let err: MeetError = NegotiationError::Candidate("bad mid".into()).into();
        assert!(matches!(err, MeetError::Negotiation(_)));
        assert_eq!(err.to_string(), "ice candidate rejected: bad mid");
    }

    #[test]
    fn meet_error_from_capture() {
        let err: MeetError = CaptureError::PermissionDenied.into();
        assert!(matches!(err, MeetError::Capture(_)));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn meet_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: MeetError = io_err.into();
        assert!(matches!(err, MeetError::Io(_)));
        assert!(err.to_string().contains("port taken"));
    }
}
