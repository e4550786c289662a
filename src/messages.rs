// src/messages.rs
//
// Inbound control messages. The transport (extension message passing, a pipe,
// a test harness) delivers JSON; everything here is validated before any state
// changes, and an invalid payload yields an explicit error response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{PassStats, PriceReport};

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid message payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    GetCurrentPrices,
    SetActive { active: bool },
    Reprocess,
    SetDisplayMode { mode: String },
    SetShowHours { show: bool },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    Ack { stats: Option<PassStats> },
    Prices { prices: Vec<PriceReport> },
    Error { message: String },
}

pub fn decode_command(json: &str) -> Result<Command, MessageError> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            decode_command(r#"{"type":"get-current-prices"}"#).unwrap(),
            Command::GetCurrentPrices
        );
        assert_eq!(
            decode_command(r#"{"type":"set-display-mode","mode":"replace"}"#).unwrap(),
            Command::SetDisplayMode {
                mode: "replace".to_string()
            }
        );
        assert_eq!(
            decode_command(r#"{"type":"set-active","active":false}"#).unwrap(),
            Command::SetActive { active: false }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(decode_command(r#"{"type":"self-destruct"}"#).is_err());
        assert!(decode_command("not json").is_err());
    }
}
