//! Configuration for the execution context.

use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable consulted for the process id when none is configured.
pub const PROCESS_ID_ENV: &str = "TELLUS_PROCESS_ID";

/// Reporting node used when the host name cannot be determined.
pub const FALLBACK_REPORTING_NODE: &str = "127.0.0.1";

/// Settings stamped onto every session a context opens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Operation name set on each new session.
    pub operation_name: Option<String>,
    /// Origin identifier. Defaults to the host name.
    pub reporting_node: Option<String>,
    /// Defaults to [`PROCESS_ID_ENV`], then the OS process id.
    pub process_id: Option<u32>,
}

impl ContextConfig {
    /// The configured node, else the host name, else `127.0.0.1`.
    pub fn resolve_reporting_node(&self) -> String {
        self.reporting_node
            .clone()
            .or_else(get_hostname)
            .unwrap_or_else(|| FALLBACK_REPORTING_NODE.to_string())
    }

    pub fn resolve_process_id(&self) -> u32 {
        self.process_id_from(env::var(PROCESS_ID_ENV).ok().as_deref())
    }

    /// Resolution with an explicit environment value. An unparseable value
    /// yields `0`.
    pub fn process_id_from(&self, env_value: Option<&str>) -> u32 {
        if let Some(pid) = self.process_id {
            return pid;
        }
        match env_value {
            Some(raw) => raw.trim().parse().unwrap_or(0),
            None => std::process::id(),
        }
    }
}

fn get_hostname() -> Option<String> {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
}
