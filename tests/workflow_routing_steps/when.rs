//! When steps for workflow routing BDD scenarios.

use super::world::{RoutingWorld, run_async};
use agentmesh::workflow::domain::CallerIdentity;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use serde_json::Value;

#[when(r#"the user asks "{text}""#)]
fn user_asks(world: &mut RoutingWorld, text: String) -> Result<(), eyre::Report> {
    let plan = world
        .router()?
        .route(&text, Value::Null)
        .wrap_err("route request")?;
    world.plan = Some(plan);
    Ok(())
}

#[when(r#"the request "{text}" is executed"#)]
fn request_is_executed(world: &mut RoutingWorld, text: String) -> Result<(), eyre::Report> {
    let plan = world
        .router()?
        .route(&text, Value::Null)
        .wrap_err("route request")?;
    let instance = run_async(
        world
            .engine
            .execute(plan.clone(), CallerIdentity::new("user-1", "patient")),
    )
    .wrap_err("execute workflow")?;
    world.plan = Some(plan);
    world.workflow = Some(instance.id());
    Ok(())
}

#[when("the agent reports completion")]
fn agent_reports_completion(world: &mut RoutingWorld) -> Result<(), eyre::Report> {
    let id = world.workflow()?;
    run_async(world.engine.on_complete(id));
    Ok(())
}

#[when(r#"the agent reports the error "{reason}""#)]
fn agent_reports_error(world: &mut RoutingWorld, reason: String) -> Result<(), eyre::Report> {
    let id = world.workflow()?;
    run_async(world.engine.on_error(id, reason));
    Ok(())
}
