// An in-memory LoggingApi that records the request bodies it receives.
use crate::api::LoggingApi;
use crate::error::{Error, Result};
use crate::http::to_json_body;

use async_trait::async_trait;
use google_logging2::api::{ListLogEntriesRequest, ListLogEntriesResponse, WriteLogEntriesRequest};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorded {
    writes: Vec<Value>,
    lists: Vec<Value>,
    deletes: Vec<(String, String)>,
    list_responses: VecDeque<ListLogEntriesResponse>,
    fail_writes: bool,
}

#[derive(Clone, Default)]
pub(crate) struct RecordingApi {
    recorded: Arc<Mutex<Recorded>>,
}

impl RecordingApi {
    pub(crate) fn writes(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().writes.clone()
    }

    pub(crate) fn lists(&self) -> Vec<Value> {
        self.recorded.lock().unwrap().lists.clone()
    }

    pub(crate) fn deletes(&self) -> Vec<(String, String)> {
        self.recorded.lock().unwrap().deletes.clone()
    }

    pub(crate) fn push_list_response(&self, response: Value) {
        let response = serde_json::from_value(response).unwrap();
        self.recorded
            .lock()
            .unwrap()
            .list_responses
            .push_back(response);
    }

    pub(crate) fn fail_writes(&self) {
        self.recorded.lock().unwrap().fail_writes = true;
    }
}

#[async_trait]
impl LoggingApi for RecordingApi {
    async fn write_entries(&self, request: WriteLogEntriesRequest) -> Result<()> {
        let body = to_json_body(&request)?;
        let mut recorded = self.recorded.lock().unwrap();
        if recorded.fail_writes {
            return Err(Error::HttpResponseError {
                context: "writing log entries".to_string(),
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "unavailable".to_string(),
            });
        }
        recorded.writes.push(body);
        Ok(())
    }

    async fn list_entries(&self, request: ListLogEntriesRequest) -> Result<ListLogEntriesResponse> {
        let body = to_json_body(&request)?;
        let mut recorded = self.recorded.lock().unwrap();
        recorded.lists.push(body);
        Ok(recorded.list_responses.pop_front().unwrap_or_default())
    }

    async fn logger_delete(&self, project: &str, logger_name: &str) -> Result<()> {
        self.recorded
            .lock()
            .unwrap()
            .deletes
            .push((project.to_string(), logger_name.to_string()));
        Ok(())
    }
}
