//! Control messages posted by pages.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// A message a page can post to the worker.
///
/// Messages are JSON objects tagged by their `type` field:
///
/// ```
/// use stashbox::message::ControlMessage;
///
/// let message = ControlMessage::from_value(&serde_json::json!({ "type": "GET_VERSION" }));
/// assert_eq!(message, Some(ControlMessage::GetVersion));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Activate a waiting worker right away.
    SkipWaiting,
    /// Ask for the worker version.
    GetVersion,
}

impl ControlMessage {
    /// Parses a posted value. Anything that is not a known control message
    /// yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match Self::deserialize(value) {
            Ok(message) => Some(message),
            Err(error) => {
                debug!(%error, "ignoring unknown message");
                None
            }
        }
    }
}

/// Reply to [`ControlMessage::GetVersion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    /// The worker version string.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn known_messages_parse() {
        assert_eq!(
            ControlMessage::from_value(&json!({ "type": "SKIP_WAITING" })),
            Some(ControlMessage::SkipWaiting)
        );
        assert_eq!(
            ControlMessage::from_value(&json!({ "type": "GET_VERSION", "extra": 1 })),
            Some(ControlMessage::GetVersion)
        );
    }

    #[test]
    fn unknown_messages_are_ignored() {
        assert_eq!(ControlMessage::from_value(&json!({ "type": "PING" })), None);
        assert_eq!(ControlMessage::from_value(&json!("SKIP_WAITING")), None);
        assert_eq!(ControlMessage::from_value(&json!(null)), None);
    }

    #[test]
    fn version_reply_shape() {
        let reply = VersionReply {
            version: "personaldevpage-v1.2".into(),
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({ "version": "personaldevpage-v1.2" })
        );
    }
}
