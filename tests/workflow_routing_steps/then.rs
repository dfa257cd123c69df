//! Then steps for workflow routing BDD scenarios.

use super::world::{RoutingWorld, run_async};
use rstest_bdd_macros::then;

#[then(r#"the primary agent is "{agent}""#)]
fn primary_agent_is(world: &RoutingWorld, agent: String) -> Result<(), eyre::Report> {
    let primary = world.plan()?.primary_agent();
    if primary.as_str() != agent {
        return Err(eyre::eyre!("expected primary agent '{agent}', got '{primary}'"));
    }
    Ok(())
}

#[then(r#"the supporting agents are "{agents}""#)]
fn supporting_agents_are(world: &RoutingWorld, agents: String) -> Result<(), eyre::Report> {
    let expected: Vec<&str> = agents.split(',').map(str::trim).collect();
    let actual: Vec<&str> = world
        .plan()?
        .supporting_agents()
        .iter()
        .map(|agent| agent.as_str())
        .collect();
    if actual != expected {
        return Err(eyre::eyre!(
            "expected supporting agents {expected:?}, got {actual:?}"
        ));
    }
    Ok(())
}

#[then("the estimated duration is {minutes:u32} minutes")]
fn estimated_duration_is(world: &RoutingWorld, minutes: u32) -> Result<(), eyre::Report> {
    let estimate = world.plan()?.estimated_minutes();
    if estimate != minutes {
        return Err(eyre::eyre!("expected {minutes} minutes, got {estimate}"));
    }
    Ok(())
}

#[then("the route is a fallback")]
fn route_is_fallback(world: &RoutingWorld) -> Result<(), eyre::Report> {
    if !world.plan()?.is_fallback() {
        return Err(eyre::eyre!("expected a fallback route"));
    }
    Ok(())
}

#[then(r#"the workflow status is "{status}""#)]
fn workflow_status_is(world: &RoutingWorld, status: String) -> Result<(), eyre::Report> {
    let id = world.workflow()?;
    let instance = run_async(world.engine.get_status(id))
        .map_err(|err| eyre::eyre!("get_status failed: {err}"))?;
    if instance.status().as_str() != status {
        return Err(eyre::eyre!(
            "expected workflow status '{status}', got '{}'",
            instance.status()
        ));
    }
    Ok(())
}
