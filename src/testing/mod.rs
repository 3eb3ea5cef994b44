//! Test doubles for the transport boundary.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::api::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// One scripted outcome for a request
#[derive(Debug, Clone)]
pub struct Reply {
    outcome: Result<HttpResponse, String>,
    delay: Option<Duration>,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            outcome: Ok(HttpResponse::new(status, body)),
            delay: None,
        }
    }

    pub fn network(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Transport that answers from per-route FIFO queues and records every
/// request it sees. Unscripted routes answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<HashMap<(String, String), VecDeque<Reply>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: &str, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == method && r.path == path)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&(request.method.to_string(), request.path.clone()))
            .and_then(VecDeque::pop_front);

        let Some(reply) = reply else {
            return Ok(HttpResponse::new(
                404,
                serde_json::json!({"success": false, "message": "not scripted"}),
            ));
        };

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.outcome.map_err(TransportError::Connection)
    }
}
