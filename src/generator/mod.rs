//! Client side of the external task/blueprint generation service.
//!
//! The engine only depends on [`ProjectGenerator`]. [`HttpGenerator`] is the
//! production implementation; tests substitute their own.

mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpGenerator;

use crate::models::Task;

/// Generation service errors.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Generation service is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait ProjectGenerator: Send + Sync {
    /// Break a project idea into `count` backlog tasks.
    async fn generate_project_tasks(&self, idea: &str, count: usize)
        -> Result<Vec<Task>, GeneratorError>;

    /// Produce an image reference (URL or data URI) for the idea.
    async fn generate_project_blueprint(&self, idea: &str) -> Result<String, GeneratorError>;
}

/// Both halves of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedProject {
    pub tasks: Vec<Task>,
    pub blueprint: String,
}

/// Issue both requests concurrently and wait for both. If either fails the
/// whole run fails and the other result is discarded.
pub async fn generate_project(
    generator: &dyn ProjectGenerator,
    idea: &str,
    count: usize,
) -> Result<GeneratedProject, GeneratorError> {
    let (tasks, blueprint) = tokio::try_join!(
        generator.generate_project_tasks(idea, count),
        generator.generate_project_blueprint(idea),
    )?;
    Ok(GeneratedProject { tasks, blueprint })
}
