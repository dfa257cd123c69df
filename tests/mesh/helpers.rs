//! Shared wiring for in-memory mesh integration tests.

use std::sync::{Arc, Mutex, PoisonError};

use agentmesh::clock::ManualClock;
use agentmesh::config::RoutingSection;
use agentmesh::messaging::{
    adapters::memory::{InMemoryMessageRepository, LoopbackTransport},
    domain::{DeliveryStatus, InterAgentMessage},
    ports::PeerRequest,
    services::{DirectDelivery, HandlerError, InboundHandler, MessageInbox},
};
use agentmesh::registry::{
    adapters::memory::{InMemoryAgentRegistry, InMemoryHealthProbe},
    domain::{AgentMetadata, AgentName},
    services::{HealthMonitor, ServiceRegistry},
};
use agentmesh::workflow::{
    adapters::{DeliveryDispatcher, memory::InMemoryWorkflowStore},
    services::{WorkflowCallbackHandler, WorkflowCoordinator, WorkflowEngine, WorkflowRouter},
};
use async_trait::async_trait;
use rstest::fixture;
use serde_json::{Value, json};

/// Name the coordinator registers under.
pub const COORDINATOR: &str = "coordinator";

/// Port the coordinator listens on.
pub const COORDINATOR_PORT: u16 = 8000;

/// Registry service used across the mesh.
pub type MeshRegistry = ServiceRegistry<InMemoryAgentRegistry, ManualClock>;

/// Health monitor used across the mesh.
pub type MeshMonitor = HealthMonitor<InMemoryAgentRegistry, InMemoryHealthProbe, ManualClock>;

/// Direct delivery bound to one sending agent.
pub type MeshDelivery = DirectDelivery<
    InMemoryAgentRegistry,
    InMemoryHealthProbe,
    InMemoryMessageRepository,
    LoopbackTransport,
    ManualClock,
>;

/// Dispatcher used by the coordinator's engine.
pub type MeshDispatcher = DeliveryDispatcher<
    InMemoryAgentRegistry,
    InMemoryHealthProbe,
    InMemoryMessageRepository,
    LoopbackTransport,
    ManualClock,
>;

/// Coordinator under test.
pub type MeshCoordinator = WorkflowCoordinator<
    InMemoryAgentRegistry,
    InMemoryHealthProbe,
    InMemoryWorkflowStore,
    MeshDispatcher,
    ManualClock,
>;

/// Agent double that records every request and acknowledges it.
#[derive(Default)]
pub struct AgentStub {
    received: Mutex<Vec<PeerRequest>>,
}

impl AgentStub {
    /// Returns a copy of every request received so far.
    #[must_use]
    pub fn received(&self) -> Vec<PeerRequest> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl InboundHandler for AgentStub {
    async fn handle(&self, request: &PeerRequest) -> Result<Value, HandlerError> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(json!({ "status": "accepted" }))
    }
}

/// A complete single-process mesh.
pub struct Mesh {
    /// Shared clock.
    pub clock: ManualClock,
    /// Registry service.
    pub registry: MeshRegistry,
    /// Health monitor.
    pub monitor: MeshMonitor,
    /// Scripted liveness probe.
    pub probe: Arc<InMemoryHealthProbe>,
    /// In-process transport.
    pub transport: Arc<LoopbackTransport>,
    /// Shared message log.
    pub messages: Arc<InMemoryMessageRepository>,
    /// The coordinator.
    pub coordinator: MeshCoordinator,
}

impl Mesh {
    /// Builds a mesh with the default routing policy and a running
    /// coordinator.
    pub async fn new() -> Self {
        let clock = ManualClock::starting_now();
        let registry = ServiceRegistry::new(
            Arc::new(InMemoryAgentRegistry::new()),
            Arc::new(clock.clone()),
        );
        let probe = Arc::new(InMemoryHealthProbe::new());
        let monitor = HealthMonitor::new(registry.clone(), Arc::clone(&probe));
        let transport = Arc::new(LoopbackTransport::new());
        let messages = Arc::new(InMemoryMessageRepository::new());

        let coordinator_name = AgentName::new(COORDINATOR).expect("valid coordinator name");
        let delivery = DirectDelivery::new(
            monitor.clone(),
            Arc::clone(&messages),
            Arc::clone(&transport),
            coordinator_name,
        );
        let engine = WorkflowEngine::new(
            Arc::new(InMemoryWorkflowStore::new()),
            Arc::new(DeliveryDispatcher::new(delivery)),
            Arc::new(clock.clone()),
        );
        let policy = RoutingSection::default()
            .to_policy()
            .expect("default policy is valid");
        let coordinator = WorkflowCoordinator::new(
            WorkflowRouter::new(Arc::new(policy)),
            engine.clone(),
            monitor.clone(),
        );

        let mesh = Self {
            clock,
            registry: registry.clone(),
            monitor,
            probe,
            transport,
            messages,
            coordinator,
        };
        let handler = Arc::new(WorkflowCallbackHandler::new(engine, registry));
        mesh.serve(COORDINATOR, COORDINATOR_PORT, MessageInbox::new(handler))
            .await;
        mesh
    }

    /// Registers `name` on `port`, marks it healthy and binds a recording
    /// stub as its receiver.
    pub async fn start_agent(&self, name: &str, port: u16) -> Arc<AgentStub> {
        let stub = Arc::new(AgentStub::default());
        self.serve(name, port, MessageInbox::new(Arc::clone(&stub)))
            .await;
        stub
    }

    async fn serve<H>(&self, name: &str, port: u16, inbox: MessageInbox<H>)
    where
        H: InboundHandler + 'static,
    {
        self.registry
            .register(name, AgentMetadata::new().with_port(port))
            .await
            .expect("agent registration succeeds");
        self.probe
            .set_healthy(format!("http://localhost:{port}/health"), true);
        self.transport
            .bind(format!("http://localhost:{port}"), Arc::new(inbox));
    }

    /// Returns the delivery statuses recorded for `correlation_id`.
    pub async fn coordinator_delivery_history(&self, correlation_id: &str) -> Vec<DeliveryStatus> {
        self.delivery_from(COORDINATOR)
            .history(correlation_id)
            .await
            .expect("message log readable")
            .iter()
            .map(InterAgentMessage::status)
            .collect()
    }

    /// Returns a sender acting as `name`.
    #[must_use]
    pub fn delivery_from(&self, name: &str) -> MeshDelivery {
        DirectDelivery::new(
            self.monitor.clone(),
            Arc::clone(&self.messages),
            Arc::clone(&self.transport),
            AgentName::new(name).expect("valid agent name"),
        )
    }
}

/// Fixture building a fresh mesh.
#[fixture]
pub async fn mesh() -> Mesh {
    Mesh::new().await
}
