// crates/lead-intake-server/tests/common/mod.rs
// ============================================================================
// Module: Server Test Fixtures
// Description: In-memory backends and an ephemeral-port server harness.
// ============================================================================

#![allow(dead_code, reason = "Each test binary uses a different subset of fixtures.")]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use lead_intake_core::InMemoryContactDirectory;
use lead_intake_core::InMemoryFollowupQueue;
use lead_intake_core::InMemoryRecordStore;
use lead_intake_core::InMemoryTtlStore;
use lead_intake_core::InMemoryVerificationProvider;
use lead_intake_core::ManualClock;
use lead_intake_core::MemoryEventSink;
use lead_intake_core::PipelineTables;
use lead_intake_core::SubmissionPipeline;
use lead_intake_core::VerificationService;
use lead_intake_core::VerificationSettings;
use lead_intake_server::AppState;
use lead_intake_server::RouteSettings;
use tokio::sync::oneshot;
use url::Url;

pub const PARTIAL: &str = "Partial";
pub const COMPLETED: &str = "R2E";
pub const START_MS: i64 = 1_700_000_000_000;
pub const FORM_URL: &str = "https://forms.example.test/register";
pub const DEMO_CODE: &str = "424242";
pub const FIFTEEN_MINUTES_MS: i64 = 15 * 60 * 1000;

/// In-memory backends shared between the router and assertions.
#[derive(Clone)]
pub struct Backends {
    pub contacts: InMemoryContactDirectory,
    pub records: InMemoryRecordStore,
    pub queue: InMemoryFollowupQueue,
    pub verifier: InMemoryVerificationProvider,
    pub clock: ManualClock,
    pub events: MemoryEventSink,
}

impl Backends {
    pub fn new() -> Self {
        Self {
            contacts: InMemoryContactDirectory::new(),
            records: InMemoryRecordStore::new(),
            queue: InMemoryFollowupQueue::new(),
            verifier: InMemoryVerificationProvider::new(DEMO_CODE),
            clock: ManualClock::new(START_MS),
            events: MemoryEventSink::new(),
        }
    }

    pub fn settings() -> RouteSettings {
        RouteSettings::new(Url::parse(FORM_URL).unwrap())
    }

    pub fn pipeline(&self) -> SubmissionPipeline {
        SubmissionPipeline::new(
            Arc::new(self.contacts.clone()),
            Arc::new(self.records.clone()),
            Arc::new(self.queue.clone()),
            Arc::new(self.clock.clone()),
            Arc::new(self.events.clone()),
            PipelineTables {
                partial: PARTIAL.to_string(),
                completed: COMPLETED.to_string(),
            },
        )
    }

    pub fn verification(&self) -> VerificationService {
        VerificationService::new(
            Arc::new(self.verifier.clone()),
            Arc::new(InMemoryTtlStore::new()),
            Arc::new(self.clock.clone()),
            Arc::new(self.events.clone()),
            VerificationSettings::default(),
        )
    }

    /// State without verification routes.
    pub fn state(&self, settings: RouteSettings) -> AppState {
        AppState::new(self.pipeline(), None, settings)
    }

    /// State with verification routes mounted.
    pub fn state_with_verification(&self, settings: RouteSettings) -> AppState {
        AppState::new(self.pipeline(), Some(self.verification()), settings)
    }

    /// Waits until `check` holds or two seconds pass.
    pub async fn eventually(&self, check: impl Fn(&Self) -> bool) -> bool {
        for _ in 0..200 {
            if check(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check(self)
    }
}

/// Router served on an ephemeral loopback port.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Posts a raw body with a JSON content type.
    pub async fn post_raw(&self, path: &str, body: impl Into<String>) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("content-type", "application/json")
            .body(body.into())
            .send()
            .await
            .expect("send")
    }

    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.post_raw(path, body.to_string()).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
