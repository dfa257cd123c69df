//! Given steps for workflow routing BDD scenarios.

use std::sync::Arc;

use super::world::RoutingWorld;
use agentmesh::config::RoutingSection;
use agentmesh::workflow::services::WorkflowRouter;
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given("the default routing policy")]
fn default_routing_policy(world: &mut RoutingWorld) -> Result<(), eyre::Report> {
    let policy = RoutingSection::default()
        .to_policy()
        .wrap_err("build default routing policy")?;
    world.router = Some(WorkflowRouter::new(Arc::new(policy)));
    Ok(())
}

#[given(r#"the agent "{agent}" is reachable"#)]
fn agent_is_reachable(world: &mut RoutingWorld, agent: String) {
    world.dispatcher.reach(&agent);
}
