//! Scripted command runner for tests

use super::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::ShipwrightResult;
use async_trait::async_trait;
use std::sync::Mutex;

type Handler = Box<dyn Fn(&CommandSpec) -> Option<ShipwrightResult<CommandOutput>> + Send + Sync>;

/// Records every call and answers with the first matching handler.
///
/// Calls no handler claims succeed with empty output.
pub(crate) struct FakeRunner {
    calls: Mutex<Vec<CommandSpec>>,
    handlers: Vec<Handler>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            handlers: Vec::new(),
        }
    }

    /// Register a handler; earlier handlers take precedence
    pub(crate) fn on<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CommandSpec) -> Option<ShipwrightResult<CommandOutput>> + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count<P>(&self, predicate: P) -> usize
    where
        P: Fn(&CommandSpec) -> bool,
    {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> ShipwrightResult<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        for handler in &self.handlers {
            if let Some(result) = handler(spec) {
                return result;
            }
        }
        Ok(CommandOutput::success(""))
    }
}
