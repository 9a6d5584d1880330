use log::*;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::auth::SessionToken;
use crate::error::{status_error, Error};
use crate::models::{ChatReply, ChatRequest, Id, NewTask, Project, Task};

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }

    pub async fn list_projects(&self, token: &SessionToken) -> Result<Vec<Project>, Error> {
        let url = format!("{}/api/projects", self.base_url);
        debug!("GET {}", url);

        let response = token.authorize(self.client.get(&url)).send().await?;
        read_json(response, &[200]).await
    }

    /// Lists every visible task, or only those of `project_id`.
    pub async fn list_tasks(
        &self,
        token: &SessionToken,
        project_id: Option<Id>,
    ) -> Result<Vec<Task>, Error> {
        let url = match project_id {
            Some(id) => format!("{}/api/tasks/project/{}", self.base_url, id),
            None => format!("{}/api/tasks", self.base_url),
        };
        debug!("GET {}", url);

        let response = token.authorize(self.client.get(&url)).send().await?;
        read_json(response, &[200]).await
    }

    pub async fn create_task(&self, token: &SessionToken, task: &NewTask) -> Result<Task, Error> {
        let url = format!("{}/api/tasks", self.base_url);
        debug!("POST {} (project {})", url, task.project.id);

        let response = token
            .authorize(self.client.post(&url))
            .json(task)
            .send()
            .await?;
        read_json(response, &[200, 201]).await
    }

    /// Sends one message to the AI chat endpoint. No confirmation handling.
    pub async fn send_chat(
        &self,
        token: &SessionToken,
        request: &ChatRequest,
    ) -> Result<ChatReply, Error> {
        let url = format!("{}/api/ai/chat", self.base_url);
        debug!("POST {}", url);

        let response = token
            .authorize(self.client.post(&url))
            .json(request)
            .send()
            .await?;
        read_json(response, &[200]).await
    }

    /// Sends `message` and, if the reply asks for confirmation, approves it once.
    ///
    /// A reply carrying a `pendingAction` is confirmed with that action; a bare
    /// `requiresConfirmation` flag is answered with `confirmation_message`.
    /// Returns the second reply when a confirmation was sent.
    pub async fn chat_create_tasks(
        &self,
        token: &SessionToken,
        message: &str,
        confirmation_message: &str,
    ) -> Result<ChatExchange, Error> {
        let first = self
            .send_chat(
                token,
                &ChatRequest::Message {
                    message: message.to_string(),
                },
            )
            .await?;

        if !first.needs_confirmation() {
            return Ok(ChatExchange {
                initial: first,
                confirmation: None,
            });
        }

        let request = match &first.pending_action {
            Some(action) => ChatRequest::Confirm {
                confirm_action: action.clone(),
                approved: true,
            },
            None => ChatRequest::Message {
                message: confirmation_message.to_string(),
            },
        };
        info!("AI chat requested confirmation, confirming");
        let confirmation = self.send_chat(token, &request).await?;

        Ok(ChatExchange {
            initial: first,
            confirmation: Some(confirmation),
        })
    }
}

/// Both replies of a chat round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatExchange {
    pub initial: ChatReply,
    pub confirmation: Option<ChatReply>,
}

impl ChatExchange {
    /// The reply that settled the exchange.
    pub fn outcome(&self) -> &ChatReply {
        self.confirmation.as_ref().unwrap_or(&self.initial)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, accepted: &[u16]) -> Result<T, Error> {
    let status = response.status();
    let url = response.url().to_string();
    debug!("{} -> {}", url, status);

    if !accepted.contains(&status.as_u16()) {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        warn!("{} answered {}", url, status);
        return Err(status_error(status.as_u16(), body));
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::TaskStatus;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn token() -> SessionToken {
        SessionToken::new("T".to_string())
    }

    #[tokio::test]
    async fn test_list_projects_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/projects")
            .match_header("authorization", "Bearer T")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1,"name":"teste"},{"id":2,"name":"other"}]"#)
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let projects = client.list_projects(&token()).await.unwrap();

        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "teste");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_tasks_uses_project_scoped_route() {
        let mut server = Server::new_async().await;
        let scoped = server
            .mock("GET", "/api/tasks/project/1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":10,"title":"Write docs","status":"IN_PROGRESS"}]"#)
            .create_async()
            .await;
        let global = server
            .mock("GET", "/api/tasks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let tasks = client.list_tasks(&token(), Some(1)).await.unwrap();
        let all = client.list_tasks(&token(), None).await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
        assert!(all.is_empty());
        scoped.assert_async().await;
        global.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_tasks_failure_is_not_an_empty_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/tasks/project/1")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let err = client.list_tasks(&token(), Some(1)).await.unwrap_err();

        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_create_task_accepts_201() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/tasks")
            .match_body(Matcher::PartialJson(json!({
                "status": "BACKLOG",
                "priority": "MEDIUM",
                "project": {"id": 1}
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":42,"title":"Teste Automatizado - Tarefa Criada Diretamente","status":"BACKLOG"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let task = client
            .create_task(&token(), &NewTask::smoke_test(1))
            .await
            .unwrap();

        assert_eq!(task.id, 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_task_rejected() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/tasks")
            .with_status(403)
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let err = client
            .create_task(&token(), &NewTask::smoke_test(1))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            ErrorKind::Status {
                status: 403,
                body: String::new()
            }
        );
    }

    #[tokio::test]
    async fn test_chat_without_confirmation_sends_one_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/ai/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Tarefas criadas"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let exchange = client
            .chat_create_tasks(&token(), "create tasks", "yes")
            .await
            .unwrap();

        assert!(exchange.confirmation.is_none());
        assert_eq!(exchange.outcome().message, "Tarefas criadas");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_confirmation_flag_sends_fixed_reply_once() {
        let mut server = Server::new_async().await;
        let ask = server
            .mock("POST", "/api/ai/chat")
            .match_body(Matcher::Json(json!({"message": "create tasks"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Confirma?","requiresConfirmation":true}"#)
            .expect(1)
            .create_async()
            .await;
        let confirm = server
            .mock("POST", "/api/ai/chat")
            .match_body(Matcher::Json(json!({"message": "Sim, confirmo. Execute a ação."})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"3 tarefas criadas"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let exchange = client
            .chat_create_tasks(&token(), "create tasks", "Sim, confirmo. Execute a ação.")
            .await
            .unwrap();

        assert_eq!(exchange.outcome().message, "3 tarefas criadas");
        assert_eq!(exchange.initial.message, "Confirma?");
        ask.assert_async().await;
        confirm.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_pending_action_is_confirmed_structurally() {
        let mut server = Server::new_async().await;
        let ask = server
            .mock("POST", "/api/ai/chat")
            .match_body(Matcher::Json(json!({"message": "create tasks"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"message":"Confirma?","pendingAction":{"type":"generic_action","originalMessage":"create tasks"}}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let confirm = server
            .mock("POST", "/api/ai/chat")
            .match_body(Matcher::Json(json!({
                "confirmAction": {"type": "generic_action", "originalMessage": "create tasks"},
                "approved": true
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Ação executada com sucesso!"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let exchange = client
            .chat_create_tasks(&token(), "create tasks", "unused")
            .await
            .unwrap();

        assert_eq!(exchange.outcome().message, "Ação executada com sucesso!");
        ask.assert_async().await;
        confirm.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_failed_confirmation_is_an_error() {
        let mut server = Server::new_async().await;
        let _ask = server
            .mock("POST", "/api/ai/chat")
            .match_body(Matcher::Json(json!({"message": "create tasks"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Confirma?","requiresConfirmation":true}"#)
            .create_async()
            .await;
        let _confirm = server
            .mock("POST", "/api/ai/chat")
            .match_body(Matcher::Json(json!({"message": "yes"})))
            .with_status(502)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let client = ApiClient::new(Client::new(), server.url());
        let err = client
            .chat_create_tasks(&token(), "create tasks", "yes")
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(502));
    }
}
