//! Bridge executable backend
//!
//! Spawns the configured bridge once per call, writes a [`BridgeRequest`]
//! line to its stdin and reads a [`BridgeResponse`] line from its stdout.
//! The bridge is what actually drives the task-management application
//! (for example by generating and running automation scripts).

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::domain::{Candidate, Containment, Item, ItemChanges, ItemId, ItemType, Properties};

use super::protocol::{BridgeManifest, BridgeRequest, BridgeResponse};
use super::{Backend, BackendError};

#[derive(Debug, Deserialize)]
struct CreatedData {
    id: ItemId,
}

#[derive(Debug, Deserialize)]
struct CandidateData {
    id: ItemId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RemovedData {
    #[serde(default = "one")]
    removed: usize,
}

fn one() -> usize {
    1
}

/// Backend that talks to an external bridge executable
#[derive(Debug, Clone)]
pub struct BridgeBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl BridgeBackend {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// Asks the bridge to describe itself
    pub fn manifest(&self) -> Result<BridgeManifest, BackendError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--manifest")
            .output()
            .map_err(|e| {
                BackendError::Unavailable(format!(
                    "failed to execute bridge {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Unavailable(format!(
                "bridge returned error: {}",
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| BackendError::Protocol(format!("failed to parse bridge manifest: {}", e)))
    }

    /// Executes one request and returns the response payload
    pub fn execute(&self, request: &BridgeRequest<'_>) -> Result<serde_json::Value, BackendError> {
        let operation = request.operation();
        tracing::debug!(bridge = %self.program.display(), operation, "calling bridge");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                BackendError::Unavailable(format!(
                    "failed to spawn bridge {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let request_json = serde_json::to_string(request)
            .map_err(|e| BackendError::Protocol(format!("failed to serialize request: {}", e)))?;

        // Stdin is dropped at the end of this block so the bridge sees EOF
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| BackendError::Unavailable("bridge stdin not captured".to_string()))?;
            writeln!(stdin, "{}", request_json).map_err(|e| {
                BackendError::Unavailable(format!("failed to write to bridge: {}", e))
            })?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BackendError::Unavailable("bridge stdout not captured".to_string()))?;
        let response_line = BufReader::new(stdout).lines().next();

        // Reap the child before interpreting the response
        let _ = child.wait();

        let response_line = response_line
            .ok_or_else(|| BackendError::Protocol("no response from bridge".to_string()))?
            .map_err(|e| BackendError::Unavailable(format!("failed to read bridge response: {}", e)))?;

        let response: BridgeResponse = serde_json::from_str(&response_line)
            .map_err(|e| BackendError::Protocol(format!("failed to parse bridge response: {}", e)))?;

        response.into_result(operation)
    }

    /// Executes a request and decodes its payload
    fn call<T: DeserializeOwned>(&self, request: BridgeRequest<'_>) -> Result<T, BackendError> {
        let data = self.execute(&request)?;
        serde_json::from_value(data).map_err(|e| {
            BackendError::Protocol(format!("unexpected '{}' payload: {}", request.operation(), e))
        })
    }
}

impl Backend for BridgeBackend {
    fn name(&self) -> &str {
        "bridge"
    }

    fn create_task(&mut self, name: &str, properties: &Properties) -> Result<ItemId, BackendError> {
        let created: CreatedData = self.call(BridgeRequest::create(ItemType::Task, name, properties))?;
        Ok(created.id)
    }

    fn create_project(
        &mut self,
        name: &str,
        properties: &Properties,
    ) -> Result<ItemId, BackendError> {
        let created: CreatedData =
            self.call(BridgeRequest::create(ItemType::Project, name, properties))?;
        Ok(created.id)
    }

    fn lookup_candidates(&mut self, item_type: ItemType) -> Result<Vec<Candidate>, BackendError> {
        let listed: Vec<CandidateData> = self.call(BridgeRequest::List { item_type })?;
        Ok(listed
            .into_iter()
            .map(|c| Candidate {
                id: c.id,
                name: c.name,
            })
            .collect())
    }

    fn get_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<Item, BackendError> {
        self.call(BridgeRequest::Get { item_type, id })
    }

    fn edit_item(
        &mut self,
        item_type: ItemType,
        id: &ItemId,
        changes: &ItemChanges,
    ) -> Result<(), BackendError> {
        self.execute(&BridgeRequest::Edit {
            item_type,
            id,
            changes,
        })?;
        Ok(())
    }

    fn remove_item(&mut self, item_type: ItemType, id: &ItemId) -> Result<usize, BackendError> {
        let removed: RemovedData = self.call(BridgeRequest::Remove { item_type, id })?;
        Ok(removed.removed)
    }

    fn move_item(&mut self, id: &ItemId, destination: &Containment) -> Result<(), BackendError> {
        self.execute(&BridgeRequest::Move { id, destination })?;
        Ok(())
    }
}
