use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;

use oad_core::catalog::{HttpVerb, Operation};

use crate::bind::{self, PlannedBody, RequestPlan};
use crate::error::DispatchError;

/// Sizing for the dispatch worker pool.
#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    /// Upper bound on concurrently executing requests.
    pub workers: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig { workers: 8 }
    }
}

/// Outcome delivered to the completion callback, exactly once per
/// accepted `invoke`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvokeOutcome {
    /// Parsed JSON response body, or `""` when the body is empty.
    pub result: Value,
    /// HTTP status code, or `-1` when the exchange never produced one.
    #[serde(rename = "resultStatus")]
    pub result_status: i32,
}

impl InvokeOutcome {
    /// The local-failure sentinel.
    pub fn failure() -> Self {
        InvokeOutcome {
            result: Value::String(String::new()),
            result_status: -1,
        }
    }
}

/// Executes bound requests on a bounded worker pool without blocking the
/// caller. Completions arrive in I/O order, not submission order, and an
/// enqueued request always runs to completion. Dropping the dispatcher
/// abandons requests still in flight.
pub struct Dispatcher {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
    permits: Arc<Semaphore>,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Result<Self, DispatchError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| DispatchError::Init(e.to_string()))?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DispatchError::Init(e.to_string()))?;
        Ok(Dispatcher {
            runtime,
            client,
            permits: Arc::new(Semaphore::new(config.workers.max(1))),
        })
    }

    /// Bind `values` to the operation and enqueue the request, returning
    /// as soon as the work is queued. `on_complete` fires exactly once,
    /// from a worker thread, with either the exchange outcome or the
    /// failure sentinel.
    ///
    /// `values` must align 1:1 with the operation's parameters; a length
    /// mismatch fails synchronously and `on_complete` never fires.
    pub fn invoke<F>(
        &self,
        operation: &Operation,
        base_url: &str,
        values: Vec<Value>,
        on_complete: F,
    ) -> Result<(), DispatchError>
    where
        F: FnOnce(InvokeOutcome) + Send + 'static,
    {
        let plan = bind::plan_request(operation, base_url, &values)?;
        let id = operation.id.clone();
        let client = self.client.clone();
        let permits = Arc::clone(&self.permits);

        self.runtime.spawn(async move {
            // Holding a permit bounds the number of in-flight requests.
            let _permit = permits.acquire_owned().await.ok();
            log::debug!("{id}: {} {}", plan.method, plan.url);
            let outcome = match execute(&client, plan).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::warn!("{id}: request failed: {err}");
                    InvokeOutcome::failure()
                }
            };
            log::debug!("{id}: resultStatus {}", outcome.result_status);
            on_complete(outcome);
        });
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
enum ExecuteError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("response body is not JSON: {0}")]
    Body(#[from] serde_json::Error),
}

async fn execute(
    client: &reqwest::Client,
    plan: RequestPlan,
) -> Result<InvokeOutcome, ExecuteError> {
    let RequestPlan {
        method,
        url,
        headers,
        body,
    } = plan;

    let mut request = client.request(method_of(method), &url);
    for (name, value) in &headers {
        request = request.header(name, value);
    }
    request = match body {
        PlannedBody::None => request,
        PlannedBody::Json(value) => request.json(&value),
        PlannedBody::Form(encoded) => request.body(encoded),
    };

    let response = request.send().await?;
    let status = i32::from(response.status().as_u16());
    let text = response.text().await?;
    // An empty body still reports its real status; only a body that
    // fails to parse as JSON degrades to the sentinel.
    let result = if text.trim().is_empty() {
        Value::String(String::new())
    } else {
        serde_json::from_str(&text)?
    };
    Ok(InvokeOutcome {
        result,
        result_status: status,
    })
}

fn method_of(verb: HttpVerb) -> reqwest::Method {
    match verb {
        HttpVerb::Get => reqwest::Method::GET,
        HttpVerb::Post => reqwest::Method::POST,
        HttpVerb::Put => reqwest::Method::PUT,
        HttpVerb::Delete => reqwest::Method::DELETE,
    }
}
