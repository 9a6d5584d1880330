use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type Id = i64;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Project {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Backlog,
    ReadyToDevelop,
    InProgress,
    InReview,
    Done,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: Id,
    pub title: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectRef {
    pub id: Id,
}

/// Payload for `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project: ProjectRef,
}

impl NewTask {
    /// The task the scenario creates directly in `project_id`.
    pub fn smoke_test(project_id: Id) -> Self {
        Self {
            title: "Teste Automatizado - Tarefa Criada Diretamente".to_string(),
            description: "Esta tarefa foi criada por um teste automatizado".to_string(),
            status: TaskStatus::Backlog,
            priority: TaskPriority::Medium,
            project: ProjectRef { id: project_id },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub requires_confirmation: Option<bool>,
    #[serde(default)]
    pub pending_action: Option<Value>,
}

impl ChatReply {
    pub fn needs_confirmation(&self) -> bool {
        self.requires_confirmation.unwrap_or(false) || self.pending_action.is_some()
    }

    /// First `max_chars` characters of the reply message.
    pub fn preview(&self, max_chars: usize) -> String {
        self.message.chars().take(max_chars).collect()
    }
}

/// Body for `POST /api/ai/chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatRequest {
    Message {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Confirm {
        confirm_action: Value,
        approved: bool,
    },
}
