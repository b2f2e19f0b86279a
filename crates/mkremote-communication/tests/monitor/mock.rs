use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mkremote_communication::{
    AdaptivePoller, FileUpload, MachineApi, MachineClient, PollIntervals, QueueSynchronizer,
};
use mkremote_core::{ApiError, Endpoints, EventBus};
use serde_json::{json, Value};
use tokio::sync::Notify;

/// One recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

/// Scripted in-memory bridge
pub struct MockApi {
    endpoints: Endpoints,
    status: Mutex<VecDeque<Result<Value, ApiError>>>,
    last_status: Mutex<Option<Result<Value, ApiError>>>,
    server_queue: Mutex<Vec<String>>,
    files: Mutex<Vec<String>>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<String, usize>>,
    hold: Mutex<Option<(String, Arc<Notify>)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            endpoints: Endpoints::default(),
            status: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(None),
            server_queue: Mutex::new(Vec::new()),
            files: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            hold: Mutex::new(None),
        }
    }

    pub fn with_queue(queue: &[&str]) -> Self {
        let api = Self::new();
        *api.server_queue.lock().unwrap() = queue.iter().map(|s| s.to_string()).collect();
        *api.files.lock().unwrap() = queue.iter().map(|s| s.to_string()).collect();
        api
    }

    /// Queue up status responses; the last one repeats once the script runs out
    pub fn script(&self, responses: impl IntoIterator<Item = Result<Value, ApiError>>) {
        self.status.lock().unwrap().extend(responses);
    }

    /// Fail the next `n` requests to `path` with a network error
    pub fn fail_next(&self, path: &str, n: usize) {
        self.failures.lock().unwrap().insert(path.to_string(), n);
    }

    /// Fail the next `n` queue pushes with a network error
    pub fn fail_next_pushes(&self, n: usize) {
        let path = self.endpoints.update_file_queue.clone();
        self.fail_next(&path, n);
    }

    fn injected_failure(&self, path: &str) -> Result<(), ApiError> {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(path) {
            Some(left) if *left > 0 => {
                *left -= 1;
                Err(ApiError::Network {
                    url: path.to_string(),
                    reason: "connection reset".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Keep the next POST to `path` outstanding until the notify fires
    pub fn hold_next_post(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some((path.to_string(), notify.clone()));
        notify
    }

    pub fn server_queue(&self) -> Vec<String> {
        self.server_queue.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    /// Names passed to open_file, in order ("" means none)
    pub fn opened(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|c| c.path == self.endpoints.open_file)
            .map(|c| c.body["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn record(&self, method: &'static str, path: &str, body: Value) {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body,
        });
    }

    fn listing(&self) -> Value {
        let files: Vec<Value> = self
            .files
            .lock()
            .unwrap()
            .iter()
            .map(|f| json!(["/home/machinekit/files", f]))
            .collect();
        json!({ "file_queue": self.server_queue(), "result": files })
    }
}

#[async_trait]
impl MachineApi for MockApi {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.record("GET", path, Value::Null);
        self.injected_failure(path)?;
        if path == self.endpoints.status {
            let next = self.status.lock().unwrap().pop_front();
            let mut last = self.last_status.lock().unwrap();
            if let Some(next) = next {
                *last = Some(next);
            }
            return last
                .clone()
                .unwrap_or_else(|| Err(ApiError::malformed("no status scripted")));
        }
        if path == self.endpoints.files {
            return Ok(self.listing());
        }
        Ok(json!({}))
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.record("POST", path, body.clone());

        let hold = {
            let mut hold = self.hold.lock().unwrap();
            match hold.as_ref() {
                Some((held, _)) if held == path => hold.take().map(|(_, n)| n),
                _ => None,
            }
        };
        if let Some(notify) = hold {
            notify.notified().await;
        }

        self.injected_failure(path)?;
        if path == self.endpoints.update_file_queue {
            let queue: Vec<String> = serde_json::from_value(body["new_queue"].clone())
                .map_err(|e| ApiError::malformed(e.to_string()))?;
            *self.server_queue.lock().unwrap() = queue;
        }
        Ok(json!({ "success": "ok" }))
    }

    async fn upload(&self, path: &str, file: FileUpload) -> Result<Value, ApiError> {
        self.record("UPLOAD", path, json!({ "file": file.file_name }));
        self.files.lock().unwrap().push(file.file_name);
        Ok(json!({ "success": "file added" }))
    }
}

/// Status body as the bridge sends it
pub fn status(x: f64, rcs_state: &str, file: &str) -> Result<Value, ApiError> {
    Ok(json!({
        "machineStatus": {
            "power": {"enabled": true, "estop": false},
            "position": {
                "x": {"pos": x, "homed": true},
                "y": {"pos": 0.0, "homed": true},
                "z": {"pos": 0.0, "homed": true}
            },
            "spindle": {
                "spindle_speed": 0.0,
                "spindle_enabled": 0,
                "spindle_brake": 1,
                "spindle_direction": 0,
                "spindlerate": 1.0
            },
            "program": {
                "file": file,
                "interp_state": "INTERP_IDLE",
                "task_mode": "MODE_AUTO",
                "feedrate": 1.0,
                "rcs_state": rcs_state,
                "tool_change": 0
            },
            "values": {"velocity": 50.0}
        }
    }))
}

pub struct Harness {
    pub api: Arc<MockApi>,
    pub client: Arc<MachineClient>,
    pub queue: Arc<QueueSynchronizer>,
    pub bus: Arc<EventBus>,
    pub poller: AdaptivePoller,
}

pub fn harness(api: MockApi) -> Harness {
    let api = Arc::new(api);
    let bus = Arc::new(EventBus::new());
    let client = Arc::new(MachineClient::new(api.clone()));
    let queue = Arc::new(QueueSynchronizer::new(client.clone(), bus.clone()));
    let poller = AdaptivePoller::new(
        client.clone(),
        queue.clone(),
        bus.clone(),
        PollIntervals::default(),
    );
    Harness {
        api,
        client,
        queue,
        bus,
        poller,
    }
}
