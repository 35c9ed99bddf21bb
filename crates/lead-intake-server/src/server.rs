// crates/lead-intake-server/src/server.rs
// ============================================================================
// Module: Lead Intake Server
// Description: Builds backends from configuration and serves the router.
// Purpose: Wire the pipeline, follow-up worker, and event sink into a process.
// Dependencies: lead-intake-core, lead-intake-config, lead-intake-providers,
//               lead-intake-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! [`LeadIntakeServer::from_config`] validates configuration and builds
//! either the remote HTTP backends or the in-memory ones, the follow-up queue
//! (memory or `SQLite`), and the event sink. [`LeadIntakeServer::serve`] runs
//! the router and the follow-up worker side by side until shutdown; the
//! worker is stopped after the listener drains.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use lead_intake_config::BackendMode;
use lead_intake_config::LeadIntakeConfig;
use lead_intake_config::LogSink;
use lead_intake_config::QueueStoreType;
use lead_intake_core::Clock;
use lead_intake_core::ContactDirectory;
use lead_intake_core::FileEventSink;
use lead_intake_core::FollowupQueue;
use lead_intake_core::FollowupSettings;
use lead_intake_core::FollowupTask;
use lead_intake_core::FollowupWorker;
use lead_intake_core::InMemoryContactDirectory;
use lead_intake_core::InMemoryFollowupQueue;
use lead_intake_core::InMemoryLinkShortener;
use lead_intake_core::InMemoryRecordStore;
use lead_intake_core::InMemoryTtlStore;
use lead_intake_core::InMemoryVerificationProvider;
use lead_intake_core::LeadEvent;
use lead_intake_core::LeadEventKind;
use lead_intake_core::LeadEventSink;
use lead_intake_core::LinkShortener;
use lead_intake_core::NoopEventSink;
use lead_intake_core::PipelineTables;
use lead_intake_core::RecordStore;
use lead_intake_core::StderrEventSink;
use lead_intake_core::SubmissionPipeline;
use lead_intake_core::SystemClock;
use lead_intake_core::VerificationProvider;
use lead_intake_core::VerificationService;
use lead_intake_core::VerificationSettings;
use lead_intake_core::WorkerSettings;
use lead_intake_providers::AirtableConfig;
use lead_intake_providers::AirtableRecordStore;
use lead_intake_providers::HttpSettings;
use lead_intake_providers::ShortIoConfig;
use lead_intake_providers::ShortIoShortener;
use lead_intake_providers::TextMagicConfig;
use lead_intake_providers::TextMagicDirectory;
use lead_intake_providers::TwilioVerifyConfig;
use lead_intake_providers::TwilioVerifyProvider;
use lead_intake_store_sqlite::SqliteFollowupQueue;
use lead_intake_store_sqlite::SqliteQueueConfig;
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::routes::AppState;
use crate::routes::RouteSettings;
use crate::routes::router;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Short link domain used by the in-memory shortener when none is set.
const DEMO_SHORT_DOMAIN: &str = "links.local";

// ============================================================================
// SECTION: Server
// ============================================================================

/// Configured lead-intake process.
pub struct LeadIntakeServer {
    /// Validated configuration.
    config: LeadIntakeConfig,
    /// Handler state.
    state: AppState,
    /// Follow-up worker, started by [`Self::serve_with_listener`].
    worker: FollowupWorker,
    /// Event sink.
    events: Arc<dyn LeadEventSink>,
    /// Time source.
    clock: Arc<dyn Clock>,
}

impl LeadIntakeServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or a backend
    /// cannot be initialized.
    pub fn from_config(config: LeadIntakeConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let form_url =
            config.followup.form_url().map_err(|err| ServerError::Config(err.to_string()))?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let events = build_event_sink(&config)?;
        let backends = build_backends(&config)?;
        let queue = build_queue(&config)?;

        let mut followup = FollowupSettings::new(form_url.clone(), &config.records.completed_table);
        followup.message_template.clone_from(&config.followup.message_template);
        let task = FollowupTask::new(
            Arc::clone(&backends.contacts),
            Arc::clone(&backends.records),
            backends.shortener,
            followup,
        );
        let worker = FollowupWorker::new(
            Arc::clone(&queue),
            task,
            Arc::clone(&clock),
            Arc::clone(&events),
            WorkerSettings {
                poll_interval: config.followup.poll_interval(),
                batch_size: config.followup.batch_size,
            },
        );
        let pipeline = SubmissionPipeline::new(
            backends.contacts,
            backends.records,
            queue,
            Arc::clone(&clock),
            Arc::clone(&events),
            PipelineTables {
                partial: config.records.partial_table.clone(),
                completed: config.records.completed_table.clone(),
            },
        )
        .with_delay(config.followup.delay())
        .with_wake(worker.wake_handle());

        let verification = backends.verifier.map(|provider| {
            VerificationService::new(
                provider,
                Arc::new(InMemoryTtlStore::new()),
                Arc::clone(&clock),
                Arc::clone(&events),
                VerificationSettings {
                    cooldown: config.verification.cooldown(),
                    pending_ttl: config.verification.pending_ttl(),
                },
            )
        });
        let settings = RouteSettings {
            response_mode: config.server.response_mode,
            form_url,
            max_body_bytes: config.server.max_body_bytes,
        };
        Ok(Self {
            state: AppState::new(pipeline, verification, settings),
            config,
            worker,
            events,
            clock,
        })
    }

    /// Returns a router over this server's state.
    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.socket_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {addr} failed: {err}")))?;
        self.serve_with_listener(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    /// Serves on `listener` until `shutdown` resolves, then stops the worker.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when the listener fails.
    pub async fn serve_with_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|err| ServerError::Transport(format!("listener address: {err}")))?;
        let app = router(self.state);
        let (stop_tx, stop_rx) = watch::channel(false);
        let worker = tokio::spawn(self.worker.run(stop_rx));
        self.events.record(
            &LeadEvent::new(LeadEventKind::ServerStarted, self.clock.now_ms())
                .with_detail(format!("listening on {addr}")),
        );
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")));
        let _ = stop_tx.send(true);
        let _ = worker.await;
        served
    }
}

// ============================================================================
// SECTION: Backends
// ============================================================================

/// Facade implementations selected by configuration.
struct Backends {
    /// Contact directory.
    contacts: Arc<dyn ContactDirectory>,
    /// Record store.
    records: Arc<dyn RecordStore>,
    /// Link shortener.
    shortener: Arc<dyn LinkShortener>,
    /// Verification provider when verification is enabled.
    verifier: Option<Arc<dyn VerificationProvider>>,
}

/// Builds remote or in-memory backends.
fn build_backends(config: &LeadIntakeConfig) -> Result<Backends, ServerError> {
    match config.backends.mode {
        BackendMode::Http => build_http_backends(config),
        BackendMode::Memory => Ok(build_memory_backends(config)),
    }
}

/// Builds the HTTP clients for each remote service.
fn build_http_backends(config: &LeadIntakeConfig) -> Result<Backends, ServerError> {
    let http = HttpSettings {
        connect_timeout: config.http.connect_timeout(),
        request_timeout: config.http.request_timeout(),
    };
    let contacts = TextMagicDirectory::new(
        TextMagicConfig {
            base_url: config.contacts.base_url.clone(),
            username: config.contacts.username.clone(),
            api_key: config.contacts.api_key.clone(),
            list_id: config.contacts.list_id.clone(),
        },
        &http,
    )
    .map_err(|err| ServerError::Init(err.to_string()))?;
    let records = AirtableRecordStore::new(
        AirtableConfig {
            base_url: config.records.base_url.clone(),
            api_key: config.records.api_key.clone(),
            base_id: config.records.base_id.clone(),
        },
        &http,
    )
    .map_err(|err| ServerError::Init(err.to_string()))?;
    let shortener = ShortIoShortener::new(
        ShortIoConfig {
            base_url: config.shortener.base_url.clone(),
            api_key: config.shortener.api_key.clone(),
            domain: config.shortener.domain.clone(),
        },
        &http,
    )
    .map_err(|err| ServerError::Init(err.to_string()))?;
    let verifier: Option<Arc<dyn VerificationProvider>> = if config.verification.enabled {
        let provider = TwilioVerifyProvider::new(
            TwilioVerifyConfig {
                base_url: config.verification.base_url.clone(),
                account_sid: config.verification.account_sid.clone(),
                auth_token: config.verification.auth_token.clone(),
                service_sid: config.verification.service_sid.clone(),
            },
            &http,
        )
        .map_err(|err| ServerError::Init(err.to_string()))?;
        Some(Arc::new(provider))
    } else {
        None
    };
    Ok(Backends {
        contacts: Arc::new(contacts),
        records: Arc::new(records),
        shortener: Arc::new(shortener),
        verifier,
    })
}

/// Builds in-memory fakes for local runs.
fn build_memory_backends(config: &LeadIntakeConfig) -> Backends {
    let domain = if config.shortener.domain.is_empty() {
        DEMO_SHORT_DOMAIN
    } else {
        config.shortener.domain.as_str()
    };
    let verifier: Option<Arc<dyn VerificationProvider>> = match &config.verification.demo_code {
        Some(code) if config.verification.enabled => {
            Some(Arc::new(InMemoryVerificationProvider::new(code.clone())))
        }
        _ => None,
    };
    Backends {
        contacts: Arc::new(InMemoryContactDirectory::new()),
        records: Arc::new(InMemoryRecordStore::new()),
        shortener: Arc::new(InMemoryLinkShortener::new(domain)),
        verifier,
    }
}

/// Builds the follow-up queue.
fn build_queue(config: &LeadIntakeConfig) -> Result<Arc<dyn FollowupQueue>, ServerError> {
    let queue = &config.followup.queue;
    match queue.store_type {
        QueueStoreType::Memory => Ok(Arc::new(InMemoryFollowupQueue::new())),
        QueueStoreType::Sqlite => {
            let path = queue.path.clone().ok_or_else(|| {
                ServerError::Config("sqlite followup queue requires path".to_string())
            })?;
            let sqlite = SqliteFollowupQueue::new(&SqliteQueueConfig {
                path,
                busy_timeout_ms: queue.busy_timeout_ms,
            })
            .map_err(|err| ServerError::Init(err.to_string()))?;
            Ok(Arc::new(sqlite))
        }
    }
}

/// Builds the event sink.
fn build_event_sink(config: &LeadIntakeConfig) -> Result<Arc<dyn LeadEventSink>, ServerError> {
    match config.logging.sink {
        LogSink::Stderr => Ok(Arc::new(StderrEventSink)),
        LogSink::None => Ok(Arc::new(NoopEventSink)),
        LogSink::File => {
            let path = config.logging.path.as_deref().ok_or_else(|| {
                ServerError::Config("file event sink requires logging.path".to_string())
            })?;
            let sink = FileEventSink::new(path)
                .map_err(|err| ServerError::Init(format!("event log: {err}")))?;
            Ok(Arc::new(sink))
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Backend initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Listener errors.
    #[error("transport error: {0}")]
    Transport(String),
}
