// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::control::Strategy;

/// Request from a client -> runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a move and block until it finishes
    Go,
    /// Read the current joint position
    Enc,
    /// Anything else, kept for logging
    Unknown(String),
}

// JSON form of a request: {"cmd": "go"}
#[derive(Debug, Deserialize)]
struct Request {
    cmd: String,
}

impl Command {
    /// Parse a request payload.
    ///
    /// Accepts `{"cmd": "..."}` or plain text, in which case only the first
    /// whitespace-separated token counts (`"go now"` is a `Go`).
    pub fn parse(payload: &str) -> Self {
        let name = match serde_json::from_str::<Request>(payload) {
            Ok(req) => req.cmd,
            Err(_) => payload.split_whitespace().next().unwrap_or("").to_string(),
        };
        Self::from_name(&name)
    }

    fn from_name(name: &str) -> Self {
        match name {
            "go" => Command::Go,
            "enc" => Command::Enc,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Reply from runtime -> client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    Ack {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<f64>,
    },
    Nack,
}

impl Reply {
    pub fn ack() -> Self {
        Reply::Ack { position: None }
    }

    pub fn ack_with_position(position: f64) -> Self {
        Reply::Ack {
            position: Some(position),
        }
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, Reply::Ack { .. })
    }
}

/// How a move ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    Completed,
    TimedOut,
    Faulted(String),
    /// Cut short by a controller shutdown
    Aborted,
}

impl MoveOutcome {
    /// Completed and timed-out moves are both acknowledged; faults are not.
    pub fn reply(&self) -> Reply {
        match self {
            MoveOutcome::Completed | MoveOutcome::TimedOut => Reply::ack(),
            MoveOutcome::Faulted(_) | MoveOutcome::Aborted => Reply::Nack,
        }
    }
}

/// Motion phase published by the runtime every tick
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum MotionPhase {
    Idle,
    /// A `go` is being set up or is polling a positional move
    Busy,
    /// The periodic loop is driving the axis
    Armed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotionStatus {
    pub phase: MotionPhase,
    pub strategy: Strategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_s: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(Command::parse("go"), Command::Go);
        assert_eq!(Command::parse("  enc\n"), Command::Enc);
        assert_eq!(Command::parse("go 12 34"), Command::Go);
        assert_eq!(Command::parse("stop"), Command::Unknown("stop".into()));
        assert_eq!(Command::parse(""), Command::Unknown(String::new()));
    }

    #[test]
    fn test_parse_json() {
        assert_eq!(Command::parse(r#"{"cmd":"go"}"#), Command::Go);
        assert_eq!(Command::parse(r#"{"cmd": "enc"}"#), Command::Enc);
        assert_eq!(
            Command::parse(r#"{"cmd":"home"}"#),
            Command::Unknown("home".into())
        );
    }

    #[test]
    fn test_reply_json() {
        assert_eq!(
            serde_json::to_string(&Reply::ack()).unwrap(),
            r#"{"reply":"ack"}"#
        );
        assert_eq!(
            serde_json::to_string(&Reply::ack_with_position(12.5)).unwrap(),
            r#"{"reply":"ack","position":12.5}"#
        );
        assert_eq!(
            serde_json::to_string(&Reply::Nack).unwrap(),
            r#"{"reply":"nack"}"#
        );
    }

    #[test]
    fn test_outcome_reply() {
        assert!(MoveOutcome::Completed.reply().is_ack());
        assert!(MoveOutcome::TimedOut.reply().is_ack());
        assert_eq!(MoveOutcome::Faulted("bus".into()).reply(), Reply::Nack);
        assert_eq!(MoveOutcome::Aborted.reply(), Reply::Nack);
    }
}
