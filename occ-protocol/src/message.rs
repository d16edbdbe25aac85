//! Tagged message envelopes
//!
//! Every frame carries an explicit `kind` so receivers dispatch on the tag
//! instead of probing for fields:
//!
//! ```text
//! {"kind":"read","payload":{"cid":"c1","item":"x"}}
//! {"kind":"commit","payload":{"cid":"c1","tid":"t1","rs":[...],"ws":[...]}}
//! ```

use crate::types::{CommitDecision, CommitRequest, ReadReply, ReadRequest};
use serde::{Deserialize, Serialize};

/// Request sent to a replica or the sequencer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Request {
    /// Point read (replicas only)
    Read(ReadRequest),
    /// Commit submission (client → sequencer) or certification (sequencer → replica)
    Commit(CommitRequest),
}

impl Request {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Read(_) => "read",
            Request::Commit(_) => "commit",
        }
    }
}

/// Reply written back on the same connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum Reply {
    /// Answer to [`Request::Read`]
    Read(ReadReply),
    /// Answer to [`Request::Commit`]
    Commit(CommitDecision),
    /// The request was well-formed but could not be accepted
    Error {
        /// Reason
        message: String,
    },
}

impl Reply {
    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Read(_) => "read",
            Reply::Commit(_) => "commit",
            Reply::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_shape() {
        let request = Request::Read(ReadRequest {
            cid: "c1".into(),
            item: "x".into(),
        });

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], "read");
        assert_eq!(json["payload"]["cid"], "c1");
        assert_eq!(json["payload"]["item"], "x");
    }

    #[test]
    fn test_commit_without_kind_is_rejected() {
        // Bare CommitRequest without the envelope must not be sniffed into a commit
        let raw = r#"{"cid":"c1","tid":"t1","rs":[],"ws":[]}"#;
        assert!(serde_json::from_str::<Request>(raw).is_err());
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let raw = r#"{"kind":"delete","payload":{"cid":"c1","item":"x"}}"#;
        assert!(serde_json::from_str::<Request>(raw).is_err());
    }

    #[test]
    fn test_error_reply_shape() {
        let reply = Reply::Error {
            message: "queue closed".into(),
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["payload"]["message"], "queue closed");
        assert_eq!(reply.kind(), "error");
    }
}
