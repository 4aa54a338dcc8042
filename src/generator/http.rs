use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{GeneratorError, ProjectGenerator};
use crate::models::Task;

/// HTTP client for the generation service.
///
/// Talks JSON to `POST {base_url}/tasks` and `POST {base_url}/blueprint`,
/// sending the API key as a bearer token when one is configured.
#[derive(Debug, Clone)]
pub struct HttpGenerator {
    base_url: Option<String>,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TasksRequest<'a> {
    idea: &'a str,
    count: usize,
}

#[derive(Debug, Serialize)]
struct BlueprintRequest<'a> {
    idea: &'a str,
}

#[derive(Debug, Deserialize)]
struct TasksResponse {
    tasks: Vec<GeneratedTask>,
}

#[derive(Debug, Deserialize)]
struct GeneratedTask {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: String,
}

#[derive(Debug, Deserialize)]
struct BlueprintResponse {
    image: String,
}

impl HttpGenerator {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.map(|url| url.trim_end_matches('/').to_string()),
            api_key,
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GeneratorError> {
        let base_url = self.base_url.as_ref().ok_or(GeneratorError::NotConfigured)?;
        let mut request = self.client.post(format!("{}{}", base_url, path)).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GeneratorError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ProjectGenerator for HttpGenerator {
    async fn generate_project_tasks(
        &self,
        idea: &str,
        count: usize,
    ) -> Result<Vec<Task>, GeneratorError> {
        let response: TasksResponse = self.post("/tasks", &TasksRequest { idea, count }).await?;
        if response.tasks.is_empty() {
            return Err(GeneratorError::Malformed("no tasks returned".to_string()));
        }

        Ok(response
            .tasks
            .into_iter()
            .map(|t| Task::new(t.title, t.description, t.category))
            .collect())
    }

    async fn generate_project_blueprint(&self, idea: &str) -> Result<String, GeneratorError> {
        let response: BlueprintResponse = self.post("/blueprint", &BlueprintRequest { idea }).await?;
        if response.image.is_empty() {
            return Err(GeneratorError::Malformed("empty blueprint reference".to_string()));
        }
        Ok(response.image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_generator_fails_without_network() {
        let generator = HttpGenerator::new(None, None);
        assert!(!generator.is_configured());

        let err = generator.generate_project_blueprint("idea").await.unwrap_err();
        assert!(matches!(err, GeneratorError::NotConfigured));
    }

    #[test]
    fn trims_trailing_slash() {
        let generator = HttpGenerator::new(Some("http://localhost:9000/".into()), None);
        assert_eq!(generator.base_url.as_deref(), Some("http://localhost:9000"));
    }
}
