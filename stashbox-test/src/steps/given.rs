use anyhow::{Error, anyhow};
use cucumber::gherkin::Step;
use cucumber::given;
use http::StatusCode;
use stashbox::LifecycleState;

use crate::steps::StepExt;
use crate::world::StashboxWorld;

#[given(expr = "the network serves the site")]
fn network_serves_site(world: &mut StashboxWorld) {
    world
        .network
        .serve_paths(world.manifest.iter().map(String::as_str));
}

#[given(expr = "the network serves {string} with body {string}")]
fn network_serves(world: &mut StashboxWorld, target: String, body: String) {
    world.network.serve(&target, body);
}

#[given(expr = "the network answers {string} with status {int}")]
fn network_answers_status(
    world: &mut StashboxWorld,
    target: String,
    status: u16,
) -> Result<(), Error> {
    let status = StatusCode::from_u16(status)?;
    world.network.serve_status(&target, status, "error page");
    Ok(())
}

#[given(expr = "{string} is unreachable")]
fn url_unreachable(world: &mut StashboxWorld, target: String) {
    world.network.break_url(&target);
}

#[given(expr = "the install manifest is:")]
fn install_manifest(world: &mut StashboxWorld, step: &Step) -> Result<(), Error> {
    let entries = step
        .docstring_lines()
        .ok_or_else(|| anyhow!("manifest entries not provided"))?;
    world.manifest = entries;
    Ok(())
}

#[given(expr = "worker {string} is running")]
async fn worker_running(world: &mut StashboxWorld, version: String) -> Result<(), Error> {
    let state = world.start_worker(&version).await?;
    if state != LifecycleState::Activated {
        return Err(anyhow!(
            "worker {version} ended up {state}: {:?}",
            world.start_error
        ));
    }
    Ok(())
}

#[given(expr = "the network is offline")]
fn network_offline(world: &mut StashboxWorld) {
    world.network.set_offline(true);
}

#[given(expr = "cache reads fail")]
fn cache_reads_fail(world: &mut StashboxWorld) {
    world.storage.fail_reads(true);
}

#[given(expr = "cache writes fail")]
fn cache_writes_fail(world: &mut StashboxWorld) {
    world.storage.fail_writes(true);
}

#[given(expr = "cache deletes fail")]
fn cache_deletes_fail(world: &mut StashboxWorld) {
    world.storage.fail_deletes(true);
}
