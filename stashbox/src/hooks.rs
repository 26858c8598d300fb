//! Background sync and push notification hooks.
//!
//! Nothing inside the worker produces these events. They exist so a host
//! can forward them and get the behaviour the site expects.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Sync tag registered by the contact form.
pub const CONTACT_FORM_SYNC_TAG: &str = "contact-form";

/// Icon shown on push notifications.
pub const NOTIFICATION_ICON: &str = "/assets/favicon-192x192.png";

/// Badge shown on push notifications.
pub const NOTIFICATION_BADGE: &str = "/assets/favicon-32x32.png";

/// Runs the handler for a background sync tag.
///
/// Returns `true` if the tag was recognised.
pub fn background_sync(tag: &str) -> bool {
    if tag == CONTACT_FORM_SYNC_TAG {
        // Submissions are sent by the page itself; the sync only records that
        // connectivity came back.
        info!(tag, "background sync");
        true
    } else {
        debug!(tag, "ignoring unknown sync tag");
        false
    }
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// A notification to display in response to a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification title.
    pub title: String,
    /// Notification text.
    pub body: Option<String>,
    /// Icon path.
    pub icon: String,
    /// Badge path.
    pub badge: String,
    /// Page to open when the notification is clicked.
    pub data: Option<String>,
}

impl Notification {
    /// Builds a notification from a push payload.
    ///
    /// Returns `None` for an empty payload or one that is not the expected
    /// JSON object.
    pub fn from_push(payload: Option<&Bytes>) -> Option<Self> {
        let payload = payload.filter(|payload| !payload.is_empty())?;
        match serde_json::from_slice::<PushPayload>(payload) {
            Ok(push) => Some(Self {
                title: push.title,
                body: push.body,
                icon: NOTIFICATION_ICON.to_owned(),
                badge: NOTIFICATION_BADGE.to_owned(),
                data: push.url,
            }),
            Err(error) => {
                warn!(%error, "malformed push payload");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_payload_becomes_notification() {
        let payload = Bytes::from_static(
            br#"{"title":"New post","body":"Read it now","url":"/blog/new-post"}"#,
        );
        let notification = Notification::from_push(Some(&payload)).unwrap();
        assert_eq!(notification.title, "New post");
        assert_eq!(notification.body.as_deref(), Some("Read it now"));
        assert_eq!(notification.icon, NOTIFICATION_ICON);
        assert_eq!(notification.badge, NOTIFICATION_BADGE);
        assert_eq!(notification.data.as_deref(), Some("/blog/new-post"));
    }

    #[test]
    fn empty_or_malformed_push_is_ignored() {
        assert_eq!(Notification::from_push(None), None);
        assert_eq!(Notification::from_push(Some(&Bytes::new())), None);
        assert_eq!(
            Notification::from_push(Some(&Bytes::from_static(b"not json"))),
            None
        );
    }

    #[test]
    fn only_contact_form_tag_is_handled() {
        assert!(background_sync("contact-form"));
        assert!(!background_sync("newsletter"));
    }
}
