//! Cloud browser-automation REST client.
//!
//! Starts a task with `POST /api/v1/run-task`, then polls
//! `GET /api/v1/task/{id}` until the service reports a terminal status.
//! Retailer credentials travel as named secrets so they never appear in the
//! prompt text.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, info_span, warn, Instrument};

use super::prompt::{EMAIL_SECRET, PASSWORD_SECRET};
use super::{AgentRun, AgentTask, AutomationAgent};
use crate::config::GlobalConfig;
use crate::{AppError, Result};

#[derive(Debug, Serialize)]
struct RunTaskRequest<'a> {
    task: &'a str,
    secrets: &'a BTreeMap<String, String>,
    allowed_domains: &'a [String],
    max_agent_steps: u32,
    use_vision: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    browser_profile_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct RunTaskResponse {
    id: String,
    #[serde(default)]
    live_url: Option<String>,
}

/// Lifecycle states reported by the automation service.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum TaskStatus {
    Created,
    Running,
    Paused,
    Finished,
    Failed,
    Stopped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct TaskDetails {
    status: TaskStatus,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    live_url: Option<String>,
}

/// [`AutomationAgent`] backed by the cloud automation API.
pub struct CloudAgent {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    secrets: BTreeMap<String, String>,
    allowed_domains: Vec<String>,
    profile_id: Option<String>,
    use_vision: bool,
    poll_interval: Duration,
    max_poll_failures: u32,
}

impl CloudAgent {
    /// Build a client from loaded configuration.
    #[must_use]
    pub fn new(config: &GlobalConfig) -> Self {
        let credentials = &config.credentials;
        let mut secrets = BTreeMap::new();
        secrets.insert(EMAIL_SECRET.to_owned(), credentials.retailer_email.clone());
        secrets.insert(
            PASSWORD_SECRET.to_owned(),
            credentials.retailer_password.clone(),
        );

        Self {
            http: reqwest::Client::new(),
            base_url: config.automation.base_url.trim_end_matches('/').to_owned(),
            api_key: credentials.automation_api_key.clone(),
            secrets,
            allowed_domains: config.retailer.allowed_domains.clone(),
            profile_id: credentials.automation_profile_id.clone(),
            use_vision: config.automation.use_vision,
            poll_interval: config.automation.poll_interval(),
            max_poll_failures: config.automation.max_poll_failures,
        }
    }

    /// Override the delay between status polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn start(&self, task: &AgentTask) -> Result<RunTaskResponse> {
        let body = RunTaskRequest {
            task: &task.prompt,
            secrets: &self.secrets,
            allowed_domains: &self.allowed_domains,
            max_agent_steps: task.max_steps,
            use_vision: self.use_vision,
            browser_profile_id: self.profile_id.as_deref(),
        };

        let response = self
            .http
            .post(format!("{}/api/v1/run-task", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn details(&self, task_id: &str) -> Result<TaskDetails> {
        let response = self
            .http
            .get(format!("{}/api/v1/task/{task_id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn run_to_completion(&self, task: AgentTask) -> Result<AgentRun> {
        let started = self.start(&task).await?;
        let task_id = started.id;
        let mut live_url = started.live_url;
        info!(task_id, max_steps = task.max_steps, "automation task started");
        if let Some(url) = &live_url {
            info!(task_id, live_url = %url, "live browser view available");
        }

        let mut failures = 0u32;
        loop {
            sleep(self.poll_interval).await;

            let details = match self.details(&task_id).await {
                Ok(details) => {
                    failures = 0;
                    details
                }
                Err(err) => {
                    failures += 1;
                    if failures > self.max_poll_failures {
                        return Err(AppError::Agent(format!(
                            "lost contact with task {task_id}: {err}"
                        )));
                    }
                    warn!(task_id, %err, failures, "task status poll failed");
                    continue;
                }
            };

            if live_url.is_none() {
                if let Some(url) = details.live_url {
                    info!(task_id, live_url = %url, "live browser view available");
                    live_url = Some(url);
                }
            }

            match details.status {
                TaskStatus::Finished => {
                    let output = details
                        .output
                        .filter(|output| !output.trim().is_empty())
                        .ok_or_else(|| {
                            AppError::Agent(format!("task {task_id} finished without output"))
                        })?;
                    info!(task_id, output_len = output.len(), "automation task finished");
                    return Ok(AgentRun {
                        task_id,
                        output,
                        live_url,
                    });
                }
                TaskStatus::Failed => {
                    let detail = details.output.unwrap_or_else(|| "no details".into());
                    return Err(AppError::Agent(format!("task {task_id} failed: {detail}")));
                }
                TaskStatus::Stopped => {
                    return Err(AppError::Agent(format!("task {task_id} was stopped")));
                }
                TaskStatus::Created
                | TaskStatus::Running
                | TaskStatus::Paused
                | TaskStatus::Unknown => {}
            }
        }
    }
}

impl AutomationAgent for CloudAgent {
    fn run(&self, task: AgentTask) -> Pin<Box<dyn Future<Output = Result<AgentRun>> + Send + '_>> {
        let span = info_span!("automation_run", base_url = %self.base_url);
        Box::pin(self.run_to_completion(task).instrument(span))
    }
}
