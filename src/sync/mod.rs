mod backoff;
mod config;
mod task;
mod translator;

pub(crate) use config::SyncConfig;
pub(crate) use task::{ChainSyncRunner, RunOutcome, SyncTask};
