//! Scripted collaborators for tests
//!
//! `ScriptedTransport` answers from per-path queues (falling back to a fixed
//! outcome once a queue drains) and records every call with the credential
//! it carried. `ScriptedOperator` answers prompts from a queue and counts them.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use remote::{ApiRequest, RemoteOutcome, Transport};

use crate::operator::Operator;

/// One call seen by `ScriptedTransport`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub credential: String,
}

#[derive(Default)]
pub struct ScriptedTransport {
    queued: Mutex<HashMap<String, VecDeque<RemoteOutcome>>>,
    fallback: Mutex<HashMap<String, RemoteOutcome>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot outcome for `path`.
    pub fn push(&self, path: &str, outcome: RemoteOutcome) -> &Self {
        self.queued
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Outcome returned for `path` whenever its queue is empty.
    pub fn always(&self, path: &str, outcome: RemoteOutcome) -> &Self {
        self.fallback
            .lock()
            .unwrap()
            .insert(path.to_string(), outcome);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.path == path)
            .collect()
    }

    fn next_outcome(&self, path: &str) -> RemoteOutcome {
        if let Some(outcome) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }
        self.fallback
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| RemoteOutcome::Failure(format!("no scripted outcome for {path}")))
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a ApiRequest,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = RemoteOutcome> + Send + 'a>> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: request.path.clone(),
            credential: credential.to_string(),
        });
        let outcome = self.next_outcome(&request.path);
        Box::pin(async move { outcome })
    }
}

#[derive(Default)]
pub struct ScriptedOperator {
    lines: Mutex<VecDeque<Option<String>>>,
    confirms: Mutex<VecDeque<bool>>,
    selections: Mutex<VecDeque<Option<usize>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator that answers successive line prompts with `lines`.
    pub fn with_lines(lines: &[&str]) -> Self {
        let operator = Self::new();
        for line in lines {
            operator.push_line(Some(line));
        }
        operator
    }

    pub fn push_line(&self, line: Option<&str>) -> &Self {
        self.lines
            .lock()
            .unwrap()
            .push_back(line.map(str::to_owned));
        self
    }

    pub fn push_confirm(&self, answer: bool) -> &Self {
        self.confirms.lock().unwrap().push_back(answer);
        self
    }

    pub fn push_selection(&self, index: Option<usize>) -> &Self {
        self.selections.lock().unwrap().push_back(index);
        self
    }

    /// Every prompt shown so far, in order (lines, confirms and menus).
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Operator for ScriptedOperator {
    fn prompt_line(&self, prompt: &str) -> Option<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.lines.lock().unwrap().pop_front().flatten()
    }

    fn confirm(&self, prompt: &str, default: bool) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.confirms.lock().unwrap().pop_front().unwrap_or(default)
    }

    fn select(&self, prompt: &str, options: &[String]) -> Option<usize> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.selections
            .lock()
            .unwrap()
            .pop_front()
            .flatten()
            .filter(|i| *i < options.len())
    }
}

/// Shorthand for an `Ok` outcome.
pub fn ok(payload: serde_json::Value) -> RemoteOutcome {
    RemoteOutcome::Ok(payload)
}
