//! Agent-to-agent protocol messages, tasks, and update events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Sender role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the calling client.
    User,
    /// Message from the agent.
    Agent,
}

/// Content part of a message or artifact, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    /// Plain text content.
    Text {
        /// Text payload.
        text: String,
    },
    /// File content, either inline bytes or a URI reference.
    File {
        /// Raw file descriptor.
        file: Value,
    },
    /// Structured data.
    Data {
        /// Arbitrary JSON payload.
        data: Value,
    },
}

impl Part {
    /// Returns the text payload for text parts.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::File { .. } | Self::Data { .. } => None,
        }
    }
}

/// A single message exchanged between a client and an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message identifier.
    pub message_id: String,
    /// Sender role.
    pub role: Role,
    /// Content parts.
    pub parts: Vec<Part>,
    /// Conversation context the message belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// Task the message is associated with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Arbitrary metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Message {
    /// Creates a user message with a single text part and a fresh identifier.
    #[must_use]
    pub fn user_text(text: impl Into<String>, context_id: Option<String>) -> Self {
        Self::text(Role::User, text, context_id)
    }

    /// Creates an agent message with a single text part and a fresh identifier.
    #[must_use]
    pub fn agent_text(text: impl Into<String>, context_id: Option<String>) -> Self {
        Self::text(Role::Agent, text, context_id)
    }

    fn text(role: Role, text: impl Into<String>, context_id: Option<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            role,
            parts: vec![Part::Text { text: text.into() }],
            context_id,
            task_id: None,
            metadata: None,
        }
    }

    /// Joins all text parts with newlines.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// Received but not started.
    Submitted,
    /// Being processed.
    Working,
    /// Waiting for more input from the caller.
    InputRequired,
    /// Finished successfully.
    Completed,
    /// Cancelled by the caller.
    Canceled,
    /// Finished with an error.
    Failed,
    /// Rejected by the agent.
    Rejected,
    /// Requires authentication.
    AuthRequired,
    /// Unrecognized state.
    #[serde(other)]
    Unknown,
}

/// Current status of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    /// Current state.
    pub state: TaskState,
    /// Optional status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    /// ISO-8601 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Output produced by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Artifact identifier.
    pub artifact_id: String,
    /// Optional name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Content parts.
    pub parts: Vec<Part>,
}

/// Unit of work tracked by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task identifier.
    pub id: String,
    /// Context identifier.
    pub context_id: String,
    /// Current status.
    pub status: TaskStatus,
    /// Produced artifacts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    /// Message history.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,
    /// Arbitrary metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Status change notification for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusUpdateEvent {
    /// Task identifier.
    pub task_id: String,
    /// Context identifier.
    pub context_id: String,
    /// New status.
    pub status: TaskStatus,
    /// Marks the last update for the task.
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

/// Artifact notification for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskArtifactUpdateEvent {
    /// Task identifier.
    pub task_id: String,
    /// Context identifier.
    pub context_id: String,
    /// Artifact content.
    pub artifact: Artifact,
}

/// Incremental task update, discriminated by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UpdateEvent {
    /// Status change.
    StatusUpdate(TaskStatusUpdateEvent),
    /// Artifact produced.
    ArtifactUpdate(TaskArtifactUpdateEvent),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_message_wire_shape() {
        let message = Message::user_text("hello", Some("ctx-1".into()));
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["parts"], json!([{ "kind": "text", "text": "hello" }]));
        assert_eq!(value["contextId"], "ctx-1");
        assert!(value.get("taskId").is_none());
    }

    #[test]
    fn text_content_skips_non_text_parts() {
        let message: Message = serde_json::from_value(json!({
            "messageId": "m1",
            "role": "agent",
            "parts": [
                { "kind": "text", "text": "a" },
                { "kind": "data", "data": { "x": 1 } },
                { "kind": "text", "text": "b" }
            ]
        }))
        .unwrap();
        assert_eq!(message.text_content(), "a\nb");
    }

    #[test]
    fn unknown_task_state_is_tolerated() {
        let status: TaskStatus = serde_json::from_value(json!({ "state": "paused" })).unwrap();
        assert_eq!(status.state, TaskState::Unknown);
    }
}
