//! Shared world state for workflow routing BDD scenarios.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use agentmesh::clock::ManualClock;
use agentmesh::workflow::{
    adapters::memory::InMemoryWorkflowStore,
    domain::{WorkflowId, WorkflowPlan},
    ports::{DispatchError, DispatchRequest, WorkflowDispatcher},
    services::{WorkflowEngine, WorkflowRouter},
};
use async_trait::async_trait;
use rstest::fixture;
use serde_json::{Value, json};

/// Engine type used by the BDD world.
pub type TestEngine = WorkflowEngine<InMemoryWorkflowStore, ScriptedDispatcher, ManualClock>;

/// Dispatcher that accepts hand-offs only to agents marked reachable.
#[derive(Default)]
pub struct ScriptedDispatcher {
    reachable: Mutex<HashSet<String>>,
}

impl ScriptedDispatcher {
    /// Marks `agent` as accepting hand-offs.
    pub fn reach(&self, agent: &str) {
        self.reachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent.to_owned());
    }
}

#[async_trait]
impl WorkflowDispatcher for ScriptedDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<Value, DispatchError> {
        let reachable = self
            .reachable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(request.primary_agent.as_str());
        if reachable {
            Ok(json!({ "status": "accepted" }))
        } else {
            Err(DispatchError::Unreachable {
                agent: request.primary_agent.clone(),
                reason: "not registered".to_owned(),
            })
        }
    }
}

/// Scenario world for workflow routing behaviour tests.
pub struct RoutingWorld {
    /// Router built from the configured policy.
    pub router: Option<WorkflowRouter>,
    /// Engine under test.
    pub engine: TestEngine,
    /// Dispatcher feeding the engine.
    pub dispatcher: Arc<ScriptedDispatcher>,
    /// Plan produced by the last routing step.
    pub plan: Option<WorkflowPlan>,
    /// Workflow started by the last execution step.
    pub workflow: Option<WorkflowId>,
}

impl RoutingWorld {
    /// Creates a world without a routing policy.
    #[must_use]
    pub fn new() -> Self {
        let dispatcher = Arc::new(ScriptedDispatcher::default());
        let engine = WorkflowEngine::new(
            Arc::new(InMemoryWorkflowStore::new()),
            Arc::clone(&dispatcher),
            Arc::new(ManualClock::starting_now()),
        );
        Self {
            router: None,
            engine,
            dispatcher,
            plan: None,
            workflow: None,
        }
    }

    /// Returns the configured router.
    ///
    /// # Errors
    ///
    /// Fails when no policy step ran.
    pub fn router(&self) -> Result<&WorkflowRouter, eyre::Report> {
        self.router
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no routing policy configured in scenario world"))
    }

    /// Returns the last routed plan.
    ///
    /// # Errors
    ///
    /// Fails when no routing step ran.
    pub fn plan(&self) -> Result<&WorkflowPlan, eyre::Report> {
        self.plan
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no plan in scenario world"))
    }

    /// Returns the last started workflow.
    ///
    /// # Errors
    ///
    /// Fails when no execution step ran.
    pub fn workflow(&self) -> Result<WorkflowId, eyre::Report> {
        self.workflow
            .ok_or_else(|| eyre::eyre!("no workflow in scenario world"))
    }
}

impl Default for RoutingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RoutingWorld {
    RoutingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
