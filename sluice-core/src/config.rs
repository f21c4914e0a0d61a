//! Dispatcher configuration. Deserializable so hosts can embed it in their own config files.

use serde::{Deserialize, Serialize};

/// How `dispatch` waits for an async handler when no sync handler is registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingMode {
    /// `block_in_place` on a multi-thread runtime, a helper thread on a current-thread runtime,
    /// a throwaway current-thread runtime outside any runtime.
    #[default]
    Auto,
    /// Always drive the handler on a helper thread with its own current-thread runtime.
    DedicatedThread,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub blocking: BlockingMode,
    /// Name given to helper threads spawned for the blocking wait.
    pub helper_thread_name: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            blocking: BlockingMode::Auto,
            helper_thread_name: "sluice-blocking".to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn blocking(mut self, mode: BlockingMode) -> Self {
        self.blocking = mode;
        self
    }

    pub fn helper_thread_name(mut self, name: impl Into<String>) -> Self {
        self.helper_thread_name = name.into();
        self
    }
}
