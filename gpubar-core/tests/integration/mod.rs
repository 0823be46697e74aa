//! Shared helpers for integration tests

mod service_tests;
mod ssh_config_tests;
mod supervisor_tests;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gpubar_core::monitoring::{CommandRunner, MonitoringError, MonitoringResult};
use gpubar_core::Target;

/// Transport double replaying canned outputs per call
#[derive(Default)]
pub struct ScriptedSsh {
    responses: Mutex<VecDeque<MonitoringResult<String>>>,
    calls: Mutex<Vec<(Target, String)>>,
}

impl ScriptedSsh {
    pub fn new(responses: impl IntoIterator<Item = MonitoringResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Target, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedSsh {
    async fn run(&self, target: &Target, command: &str) -> MonitoringResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((target.clone(), command.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MonitoringError::Command("Connection refused".into())))
    }
}

pub fn fail(text: &str) -> MonitoringResult<String> {
    Err(MonitoringError::Command(text.to_string()))
}

pub const RTX_ROW: &str =
    "0, RTX 4090, 78, 66, 10240, 24576, 45, 210.3, 450.0, 550.54.14, 12.4\n";
