// ── Session ──
//
// Owns the replica and the remote binding, drives the phased
// initialization state machine and the run loop. Exactly one control
// flow (the task awaiting `run`) ever touches the replica or issues
// binding calls; callers interact through a `SessionHandle`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, oneshot, Notify};
use tracing::{debug, error, info, warn};

use connwatch_bus::{BusError, Category, NotificationRecord, RemoteBinding};

use crate::command::{self, Command, CommandEnvelope, CommandRequest, Reply};
use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::event::{ChangeEvent, SessionEvent};
use crate::model::ObjectPath;
use crate::multiplex::{Multiplexer, Ready};
use crate::reactor::{self, Inbound};
use crate::store::Replica;
use crate::stream::EventStream;

/// Initialization progress of the replica.
///
/// The replica accepts notification patches only in [`Ready`](Self::Ready);
/// the intermediate phases name the snapshot fetch currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPhase {
    Uninitialized,
    AwaitingState,
    AwaitingTechnologies,
    AwaitingServices,
    Ready,
}

impl InitPhase {
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

type SecondaryHook = Box<dyn FnMut() + Send>;

/// A session against the remote connection-management service.
///
/// Lifecycle: [`init`](Self::init) subscribes and loads the replica,
/// then [`run`](Self::run) processes notifications and commands until
/// [`quit`](Self::quit). `run` is re-entrant -- the quit flag clears on
/// exit, so the loop can be entered again later in the process lifetime.
pub struct Session<B: RemoteBinding> {
    binding: B,
    config: SessionConfig,
    replica: Replica,
    phase: InitPhase,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Option<mpsc::Receiver<CommandEnvelope>>,
    event_tx: broadcast::Sender<Arc<SessionEvent>>,
    quit: Arc<Notify>,
    mux: Option<Multiplexer>,
    secondary_rx: Option<mpsc::UnboundedReceiver<()>>,
    secondary_hook: Option<SecondaryHook>,
}

impl<B: RemoteBinding> Session<B> {
    pub fn new(binding: B, config: SessionConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_queue);
        let (event_tx, _) = broadcast::channel(config.event_capacity);

        Self {
            binding,
            config,
            replica: Replica::new(),
            phase: InitPhase::Uninitialized,
            command_tx,
            command_rx: Some(command_rx),
            event_tx,
            quit: Arc::new(Notify::new()),
            mux: None,
            secondary_rx: None,
            secondary_hook: None,
        }
    }

    /// A cloneable handle for submitting commands and subscribing to
    /// events from other tasks.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            command_tx: self.command_tx.clone(),
            event_tx: self.event_tx.clone(),
            quit: Arc::clone(&self.quit),
        }
    }

    /// Read access to the replica. Valid between loop turns; snapshots
    /// handed to other tasks go through command replies instead.
    pub fn replica(&self) -> &Replica {
        &self.replica
    }

    pub fn phase(&self) -> InitPhase {
        self.phase
    }

    /// Register the secondary input source: a readiness channel plus the
    /// hook to invoke per tick. Must be called before [`init`](Self::init).
    pub fn set_secondary_input(
        &mut self,
        readiness: mpsc::UnboundedReceiver<()>,
        hook: impl FnMut() + Send + 'static,
    ) {
        self.secondary_rx = Some(readiness);
        self.secondary_hook = Some(Box::new(hook));
    }

    /// Request the run loop to exit at its next check.
    pub fn quit(&self) {
        self.quit.notify_one();
    }

    // ── Initialization ───────────────────────────────────────────────

    /// Subscribe to change notifications and load the replica.
    ///
    /// The subscription is registered before any snapshot fetch, and the
    /// three fetches are serialized, so every change the remote service
    /// emits is either contained in a snapshot or buffered on the
    /// notification channel for the run loop. Calling `init` again after
    /// it succeeded is a no-op.
    pub async fn init(&mut self) -> Result<(), CoreError> {
        if self.phase.is_ready() {
            return Ok(());
        }

        let notifications = self
            .binding
            .subscribe(&[Category::Manager, Category::Service, Category::Technology])
            .await?;
        debug!("subscribed to change notifications");

        self.phase = InitPhase::AwaitingState;
        let state = self.binding.fetch_state().await?;
        self.replica.load_state(state);

        self.phase = InitPhase::AwaitingTechnologies;
        let technologies = self.binding.fetch_technologies().await?;
        self.replica.load_technologies(technologies);

        self.phase = InitPhase::AwaitingServices;
        let services = self.binding.fetch_services().await?;
        self.replica.load_services(services);

        self.phase = InitPhase::Ready;

        let command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| CoreError::Internal("command receiver already taken".into()))?;
        self.mux = Some(Multiplexer::new(
            notifications,
            command_rx,
            self.secondary_rx.take(),
            Arc::clone(&self.quit),
        ));

        info!(
            technologies = self.replica.technology_count(),
            services = self.replica.service_count(),
            "replica initialized"
        );
        Ok(())
    }

    // ── Run loop ─────────────────────────────────────────────────────

    /// Process notifications, commands and secondary input until
    /// [`quit`](Self::quit) or a transport failure.
    ///
    /// A transport failure is fatal to the loop, not necessarily to the
    /// process -- the caller decides.
    pub async fn run(&mut self, poll_secondary: bool) -> Result<(), CoreError> {
        let mut mux = self
            .mux
            .take()
            .ok_or_else(|| CoreError::Internal("run() called before init()".into()))?;
        debug!(poll_secondary, "entering run loop");

        let result = loop {
            match mux.poll_next(poll_secondary).await {
                Ready::Quit => {
                    debug!("run loop exiting on quit");
                    break Ok(());
                }
                Ready::Notifications(batch) => {
                    for record in batch {
                        self.handle_record(record);
                    }
                }
                Ready::Command(CommandEnvelope { request, reply_tx }) => {
                    let result = self.dispatch(request).await;
                    let _ = reply_tx.send(result);
                }
                Ready::Secondary => {
                    if let Some(hook) = self.secondary_hook.as_mut() {
                        hook();
                    }
                }
                Ready::TransportClosed => {
                    error!("notification transport closed; leaving run loop");
                    break Err(CoreError::Transport(BusError::Disconnected));
                }
            }
        };

        self.mux = Some(mux);
        result
    }

    // ── Command dispatch ─────────────────────────────────────────────

    /// Validate and execute one command request.
    ///
    /// Validation and lookup failures return without touching the
    /// replica or the binding.
    pub async fn dispatch(&mut self, request: CommandRequest) -> Result<Reply, CoreError> {
        let command = command::parse(&request)?;
        self.execute(command).await
    }

    async fn execute(&mut self, command: Command) -> Result<Reply, CoreError> {
        match command {
            Command::GetState => {
                let properties = self.binding.fetch_state().await?;
                if !self.phase.is_ready() {
                    self.replica.load_state(properties.clone());
                }
                Ok(Reply::new("get_state", to_value(&properties)?))
            }

            Command::GetTechnologies => {
                let records = self.binding.fetch_technologies().await?;
                if !self.phase.is_ready() {
                    self.replica.load_technologies(records.clone());
                }
                Ok(Reply::new("get_technologies", to_value(&records)?))
            }

            Command::GetServices => {
                let records = self.binding.fetch_services().await?;
                if !self.phase.is_ready() {
                    self.replica.load_services(records.clone());
                }
                Ok(Reply::new("get_services", to_value(&records)?))
            }

            Command::GetHomePage => self.home_page(),

            Command::GetServicesFromTech { technology } => self.services_from_tech(&technology),

            Command::Connect { service } => self.connect(&service).await,
        }
    }

    /// Composite view of global state plus technologies, straight from
    /// the replica -- no remote round-trip.
    fn home_page(&self) -> Result<Reply, CoreError> {
        let technologies: Vec<_> = self.replica.technologies().collect();
        let data = json!({
            "state": to_value(self.replica.global_state())?,
            "technologies": to_value(&technologies)?,
        });
        Ok(Reply::new("get_home_page", data))
    }

    /// Services matching a technology's type, narrowed to connected ones
    /// when the technology itself is connected.
    fn services_from_tech(&self, technology: &ObjectPath) -> Result<Reply, CoreError> {
        let tech = self
            .replica
            .technology(technology)
            .ok_or_else(|| CoreError::NotFound {
                kind: "technology",
                identifier: technology.to_string(),
            })?;
        let tech_type = tech.technology_type().ok_or_else(|| {
            CoreError::protocol(format!("technology {technology} has no Type property"))
        })?;

        let services = self.replica.services_matching(tech_type, tech.connected());
        let data = json!({
            "services": to_value(&services)?,
            "technology": to_value(tech)?,
        });
        Ok(Reply::new("get_services_from_tech", data))
    }

    async fn connect(&mut self, service: &ObjectPath) -> Result<Reply, CoreError> {
        if !self.replica.has_service(service) {
            return Err(CoreError::NotFound {
                kind: "service",
                identifier: service.to_string(),
            });
        }

        self.binding.connect_service(service.as_str()).await?;
        Ok(Reply::new("connect", Value::Null))
    }

    // ── Notification handling ────────────────────────────────────────

    fn handle_record(&mut self, record: NotificationRecord) {
        match reactor::classify(record) {
            Inbound::Change(notification) => {
                if !self.phase.is_ready() {
                    debug!(
                        signal = %notification.signal,
                        "notification before initialization complete; dropped"
                    );
                    return;
                }
                match reactor::apply(&mut self.replica, &self.config.namespace, &notification) {
                    Ok(Some(change)) => self.forward(change),
                    Ok(None) => {}
                    Err(e) => {
                        warn!(
                            error = %e,
                            signal = %notification.signal,
                            "malformed notification skipped"
                        );
                    }
                }
            }
            Inbound::Agent => {
                debug!("agent request rejected: interactive credentials not implemented");
                self.emit(SessionEvent::AgentRequestRejected);
            }
            Inbound::Unknown { interface } => {
                warn!(interface, "notification from untracked interface ignored");
            }
        }
    }

    fn forward(&self, change: ChangeEvent) {
        if self.config.interest.includes(change.category()) {
            self.emit(SessionEvent::Change(change));
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Best-effort: zero receivers or lagged subscribers never affect
        // replica consistency.
        let _ = self.event_tx.send(Arc::new(event));
    }
}

// ── SessionHandle ────────────────────────────────────────────────────

/// Cheaply cloneable handle for interacting with a running session.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<CommandEnvelope>,
    event_tx: broadcast::Sender<Arc<SessionEvent>>,
    quit: Arc<Notify>,
}

impl SessionHandle {
    /// Submit a command and await its reply.
    ///
    /// Resolution may require a remote round-trip; a command the remote
    /// service never answers leaves the caller pending (timeouts are an
    /// external concern).
    pub async fn query(&self, request: CommandRequest) -> Result<Reply, CoreError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(CommandEnvelope { request, reply_tx })
            .await
            .map_err(|_| CoreError::Transport(BusError::Disconnected))?;
        reply_rx
            .await
            .map_err(|_| CoreError::Transport(BusError::Disconnected))?
    }

    /// Subscribe to normalized session events.
    pub fn events(&self) -> broadcast::Receiver<Arc<SessionEvent>> {
        self.event_tx.subscribe()
    }

    /// Subscribe as a `Stream` for use with combinators.
    pub fn event_stream(&self) -> EventStream {
        EventStream::new(self.event_tx.subscribe())
    }

    /// Request the run loop to exit at its next check.
    pub fn quit(&self) {
        self.quit.notify_one();
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn to_value<T: Serialize>(value: &T) -> Result<Value, CoreError> {
    serde_json::to_value(value)
        .map_err(|e| CoreError::Internal(format!("reply serialization failed: {e}")))
}
