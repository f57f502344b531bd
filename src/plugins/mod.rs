mod anti_flood;
mod anti_link;
mod commands;
mod filters;
mod incoming_snapshot;
mod message_logging;
mod panel;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::commands::CommandRegistry;
use crate::models::Job;
use crate::stats::Stats;
use crate::store::Store;

/// Shared state every plugin needs to act. Ported from the single
/// `context` dict threaded through
/// `original_source/app/services/plugins/*.py` as an explicit, typed
/// struct rather than a dynamically-keyed map.
pub struct PluginContext {
    pub store: Arc<Store>,
    pub api: Arc<ApiClient>,
    pub commands: Arc<CommandRegistry>,
    pub owner_id: Option<String>,
    pub report_anti_actions: bool,
    pub stats: Arc<Stats>,
    pub incoming_updates_enabled: bool,
    pub incoming_updates_store_raw: bool,
}

#[derive(Debug)]
pub struct PluginError(pub String);

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PluginError {}

pub type PluginFuture<'a> = Pin<Box<dyn Future<Output = Result<bool, PluginError>> + Send + 'a>>;

/// A single step in the moderation/command chain (§4.7). `handle` returns
/// `Ok(true)` to short-circuit the chain (the update was fully handled) or
/// `Ok(false)` to let the next plugin run, matching
/// `original_source/app/services/plugins/base.py::Plugin.handle`.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;
    fn handle<'a>(&'a self, ctx: &'a PluginContext, job: &'a Job) -> PluginFuture<'a>;
}

/// Fixed dispatch order, mirroring
/// `original_source/app/services/plugins/registry.py::PluginRegistry` and
/// the module's own wiring of which plugins run and in what order:
/// incoming snapshot, message logging, anti-link, anti-flood, word
/// filters, commands, then the admin panel.
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn with_default_chain() -> Self {
        PluginRegistry {
            plugins: vec![
                Box::new(incoming_snapshot::IncomingSnapshotPlugin),
                Box::new(message_logging::MessageLoggingPlugin),
                Box::new(anti_link::AntiLinkPlugin),
                Box::new(anti_flood::AntiFloodPlugin::new()),
                Box::new(filters::FilterWordsPlugin),
                Box::new(commands::CommandsPlugin),
                Box::new(panel::PanelPlugin),
            ],
        }
    }

    /// Runs `job` through each plugin in order, stopping at the first one
    /// that reports `true` or errors (§4.9: "the remainder of the chain is
    /// not executed for that job"). The error is returned to the caller —
    /// the worker loop — which records it on the job's `WorkerStatus` and
    /// on `Stats`; it is not swallowed here.
    pub async fn dispatch(&self, ctx: &PluginContext, job: &Job) -> Result<(), PluginError> {
        for plugin in &self.plugins {
            match plugin.handle(ctx, job).await {
                Ok(true) => return Ok(()),
                Ok(false) => continue,
                Err(err) => {
                    eprintln!("plugin {} failed on job {}: {err}", plugin.name(), job.job_id);
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}
