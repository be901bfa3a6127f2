//! Caller-driven polling of asynchronous Salt jobs and root-cause
//! extraction from failed state results.

use crate::client::core::SaltClient;
use crate::utils::json_path::get_path;
use crate::{Error, Result};
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::info;

/// Outcome of one poll of an asynchronous Salt job.
///
/// "Still running" is an explicit third outcome, distinct from both success
/// and failure; the failure outcomes (job unknown, scheduling conflict,
/// state failed) are members of the error taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// The job finished successfully; carries the node's result payload.
    Succeeded(Map<String, Value>),
    /// The job has not finished yet; poll again later.
    StillRunning,
}

impl JobStatus {
    pub fn is_still_running(&self) -> bool {
        matches!(self, JobStatus::StillRunning)
    }

    /// The node's result payload, if the job completed.
    pub fn into_result(self) -> Option<Map<String, Value>> {
        match self {
            JobStatus::Succeeded(result) => Some(result),
            JobStatus::StillRunning => None,
        }
    }
}

impl SaltClient {
    /// Poll the status of an asynchronous Salt job on the given node.
    ///
    /// Each call is one state sample; the client runs no polling loop of
    /// its own.
    pub async fn poll_job(&self, job_id: &str, node_name: &str) -> Result<JobStatus> {
        info!(job_id, node = node_name, "polling Salt job");

        let endpoint = format!("/jobs/{job_id}");
        let ans = self
            .authenticated_request(Method::GET, &endpoint, None)
            .await
            .map_err(|e| e.with_operation(format!("Salt job polling failed for ID {job_id}")))?;

        interpret_poll_response(job_id, node_name, &ans)
    }
}

/// Interpret a `GET /jobs/{jid}` response body into a job outcome.
fn interpret_poll_response(job_id: &str, node_name: &str, ans: &Value) -> Result<JobStatus> {
    let job_info = get_path(ans, "info[0]")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::shape("info[0]"))?;

    // Unknown job ID: maybe the Salt server restarted or something like
    // that.
    if let Some(errmsg) = job_info.get("Error") {
        info!(job_id, "Salt job not found");
        let reason = match errmsg.as_str() {
            Some(reason) => reason.to_string(),
            None => errmsg.to_string(),
        };
        return Err(Error::JobNotFound {
            job_id: job_id.to_string(),
            reason,
        });
    }

    let result = job_info
        .get("Result")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::shape("info[0].Result"))?;

    // No result yet, the job is still running.
    if result.is_empty() {
        info!(job_id, "Salt job is still running");
        return Ok(JobStatus::StillRunning);
    }

    let node_result = result
        .get(node_name)
        .and_then(Value::as_object)
        .ok_or_else(|| Error::shape(format!("info[0].Result[{node_name}]")))?;

    // The job is done: check if it has succeeded.
    let retcode = node_result
        .get("retcode")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .ok_or_else(|| Error::shape(format!("info[0].Result[{node_name}].retcode")))?;

    match retcode {
        0 => {
            info!(job_id, "Salt job succeeded");
            Ok(JobStatus::Succeeded(node_result.clone()))
        }
        // Concurrent state execution.
        1 => Err(Error::ConcurrentExecution {
            job_id: job_id.to_string(),
        }),
        _ => {
            info!(job_id, "Salt job failed");
            Err(Error::AsyncJobFailed {
                reason: state_failure_root_cause(node_result.get("return")),
            })
        }
    }
}

const REQUISITE_FAILED_PREFIX: &str = "One or more requisite failed";

/// Extract the root cause out of a failed state's `return` payload.
///
/// Total function: an unexpected shape yields a fallback string naming it,
/// never an error.
fn state_failure_root_cause(output: Option<&Value>) -> String {
    match output {
        Some(Value::String(reason)) => reason.clone(),
        Some(Value::Object(states)) => {
            // Order-independent scan: the first failing entry that is not a
            // propagated requisite failure wins.
            for state in states.values() {
                let Some(state) = state.as_object() else {
                    continue;
                };
                let failed = state.get("result").and_then(Value::as_bool) == Some(false);
                let comment = state.get("comment").and_then(Value::as_str);
                if let (true, Some(comment)) = (failed, comment) {
                    if !comment.starts_with(REQUISITE_FAILED_PREFIX) {
                        return comment.to_string();
                    }
                }
            }
            "state failed, root cause not found".to_string()
        }
        Some(other) => format!("unknown error type ({})", json_type_name(other)),
        None => "unknown error type (absent)".to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
