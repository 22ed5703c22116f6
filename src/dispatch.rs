//! Background grocery job dispatch.
//!
//! Each accepted mention becomes one detached tokio task: post a "starting"
//! note, run the automation agent, then post exactly one completion message.
//! Nothing here is retried; a failed run is reported to the channel and the
//! user mentions the bot again to try once more.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

use crate::automation::prompt::task_prompt;
use crate::automation::result::CartReport;
use crate::automation::{AgentTask, AutomationAgent};
use crate::config::{GlobalConfig, RetailerConfig};
use crate::models::job::DispatchJob;
use crate::slack::client::{ChatNotifier, SlackMessage};
use crate::slack::messages;

/// Runs grocery jobs and reports their outcome to Slack.
pub struct JobDispatcher {
    agent: Arc<dyn AutomationAgent>,
    notifier: Arc<dyn ChatNotifier>,
    retailer: RetailerConfig,
    bot_name: String,
    max_steps: u32,
}

impl JobDispatcher {
    /// Create a dispatcher bound to an agent and a chat destination.
    #[must_use]
    pub fn new(
        config: &GlobalConfig,
        agent: Arc<dyn AutomationAgent>,
        notifier: Arc<dyn ChatNotifier>,
    ) -> Self {
        Self {
            agent,
            notifier,
            retailer: config.retailer.clone(),
            bot_name: config.bot_name.clone(),
            max_steps: config.automation.max_steps,
        }
    }

    /// Spawn `job` as a detached task and return immediately.
    pub fn dispatch(self: &Arc<Self>, job: DispatchJob) -> JoinHandle<()> {
        let span = info_span!(
            "grocery_job",
            job_id = %job.job_id,
            channel = %job.channel,
            items = job.items.len()
        );
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(job).await }.instrument(span))
    }

    /// Post the usage hint without blocking the caller.
    pub fn send_help(
        self: &Arc<Self>,
        channel: String,
        thread_ts: Option<String>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let message = SlackMessage::plain(channel, messages::help(&this.bot_name))
                .in_thread(thread_ts.as_deref());
            if let Err(err) = this.notifier.post(message).await {
                error!(%err, "failed to post help message");
            }
        })
    }

    /// Execute one job to completion, reporting every outcome to the channel.
    pub async fn run(&self, job: DispatchJob) {
        info!(user = ?job.user, "grocery job started");
        self.reply(&job, messages::started(&self.retailer.name, &job.items))
            .await;

        let task = AgentTask {
            prompt: task_prompt(&self.retailer, &job.items),
            max_steps: self.max_steps,
        };

        let text = match self.agent.run(task).await {
            Ok(run) => {
                let report = CartReport::from_output(&run.output);
                if report.is_success() {
                    info!(
                        task_id = %run.task_id,
                        unavailable = report.unavailable_items.len(),
                        "cart ready"
                    );
                } else {
                    warn!(task_id = %run.task_id, "agent finished without a cart url");
                }
                messages::completed(&self.retailer.name, &report)
            }
            Err(err) => {
                error!(%err, "automation run failed");
                messages::errored(&err.to_string())
            }
        };

        self.reply(&job, text).await;
        info!("grocery job finished");
    }

    async fn reply(&self, job: &DispatchJob, text: String) {
        let message =
            SlackMessage::plain(job.channel.clone(), text).in_thread(job.thread_ts.as_deref());
        if let Err(err) = self.notifier.post(message).await {
            error!(%err, "failed to post job update");
        }
    }
}
