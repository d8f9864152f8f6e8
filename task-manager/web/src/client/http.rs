use super::{ClientError, TaskApi};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use task_manager_core::{Task, TaskChanges, TaskId};

/// Error body the task service answers non-2xx requests with.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// [`TaskApi`] backed by the task service's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Passes 2xx responses through and turns anything else into [`ClientError::Api`].
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ApiErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => format!("Request failed with status {}", status.as_u16()),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(check_status(response).await?.json::<T>().await?)
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self) -> Result<Vec<Task>, ClientError> {
        let response = self.client.get(self.url("/tasks")).send().await?;
        read_json(response).await
    }

    async fn get_task(&self, id: TaskId) -> Result<Task, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        read_json(response).await
    }

    async fn create_task(&self, changes: TaskChanges) -> Result<Task, ClientError> {
        let response = self
            .client
            .post(self.url("/tasks"))
            .json(&changes)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update_task(&self, id: TaskId, changes: TaskChanges) -> Result<Task, ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/tasks/{id}")))
            .json(&changes)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/tasks/{id}")))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
