//! Worker message protocol
//!
//! Messages are tagged by `type` so their JSON form matches what the UI layer
//! exchanges with the worker:
//!
//! ```text
//! → {"type":"parse","payload":{"text":"...","chunkSize":1000}}
//! ← {"type":"progress","progress":42}            (zero or more)
//! ← {"type":"complete","data":{...}}  |  {"type":"error","error":"..."}
//! ```

use serde::{Deserialize, Serialize};
use tally_common::types::IngestionResult;

use crate::executor::{ParseOptions, DEFAULT_CHUNK_SIZE};

/// Inbound message to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    Parse { payload: ParsePayload },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsePayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
}

impl ParsePayload {
    pub fn options(&self) -> ParseOptions {
        ParseOptions::with_chunk_size(self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE))
    }
}

impl WorkerRequest {
    pub fn parse(text: String, options: ParseOptions) -> Self {
        WorkerRequest::Parse {
            payload: ParsePayload {
                text,
                chunk_size: Some(options.chunk_size),
            },
        }
    }
}

/// Outbound message from the worker.
///
/// For one parse: any number of `Progress`, then exactly one of `Complete`
/// or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerResponse {
    Progress { progress: u8 },
    Complete { data: IngestionResult },
    Error { error: String },
}

impl WorkerResponse {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerResponse::Progress { .. })
    }
}
