use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// 40-character all-zero hash marking a branch creation/deletion boundary
pub const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

const HEADS_PREFIX: &str = "refs/heads/";
const TAGS_PREFIX: &str = "refs/tags/";

/// Inbound notification envelope relayed by the notification topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    /// Records carried by the envelope; only the first is inspected
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnsMessage {
    /// Attribute bag; `X-Github-Event` classifies the relayed event
    #[serde(rename = "MessageAttributes", default)]
    pub message_attributes: HashMap<String, MessageAttribute>,
    /// JSON-encoded GitHub push event payload
    #[serde(rename = "Message", default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageAttribute {
    #[serde(rename = "Type", default)]
    pub value_type: String,
    #[serde(rename = "Value")]
    pub value: String,
}

/// GitHub push event payload, reduced to the fields classification needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEvent {
    /// Full ref the push touched, e.g. `refs/heads/feature-x`
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Commit hash before the push
    #[serde(default)]
    pub before: String,
    /// Commit hash after the push
    #[serde(default)]
    pub after: String,
    /// Whether the push created the ref
    #[serde(default)]
    pub created: bool,
    /// Whether the push deleted the ref
    #[serde(default)]
    pub deleted: bool,
    pub repository: PushRepository,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRepository {
    /// Repository name within the configured organization
    pub name: String,
}

/// Cleanup action derived from a push event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupTrigger {
    /// A branch was deleted; remove all of its packages
    BranchRemoved { branch: String },
    /// A release tag was created; remove its snapshot packages
    TagCreated { tag: String },
}

/// Classify a push event. First matching condition wins; the two
/// conditions are mutually exclusive by construction.
pub fn classify(event: &PushEvent) -> Option<CleanupTrigger> {
    if event.deleted && event.after == ZERO_SHA {
        let branch = event
            .git_ref
            .strip_prefix(HEADS_PREFIX)
            .unwrap_or(&event.git_ref);
        return Some(CleanupTrigger::BranchRemoved {
            branch: branch.to_string(),
        });
    }

    if event.git_ref.starts_with(TAGS_PREFIX) && event.created && event.before == ZERO_SHA {
        let tag = event
            .git_ref
            .strip_prefix(TAGS_PREFIX)
            .unwrap_or(&event.git_ref);
        return Some(CleanupTrigger::TagCreated {
            tag: tag.to_string(),
        });
    }

    None
}
