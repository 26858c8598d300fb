use std::time::Duration;

use anyhow::{Error, anyhow};
use bytes::Bytes;
use cucumber::gherkin::Step;
use cucumber::when;
use serde_json::json;
use stashbox::Destination;

use crate::world::StashboxWorld;

#[when(expr = "worker {string} starts")]
async fn worker_starts(world: &mut StashboxWorld, version: String) -> Result<(), Error> {
    world.start_worker(&version).await?;
    Ok(())
}

#[when(expr = "the page requests {string}")]
async fn page_requests(world: &mut StashboxWorld, target: String) -> Result<(), Error> {
    world.request(&target, Destination::Other).await
}

#[when(expr = "the page loads image {string}")]
async fn page_loads_image(world: &mut StashboxWorld, target: String) -> Result<(), Error> {
    world.request(&target, Destination::Image).await
}

#[when(expr = "the page navigates to {string}")]
async fn page_navigates(world: &mut StashboxWorld, target: String) -> Result<(), Error> {
    world.request(&target, Destination::Document).await
}

#[when(expr = "background revalidation finishes")]
async fn revalidation_finishes(world: &mut StashboxWorld) -> Result<(), Error> {
    let completed = world
        .worker()?
        .offload()
        .wait_all_timeout(Duration::from_secs(5))
        .await;
    if !completed {
        return Err(anyhow!("background tasks did not complete within timeout"));
    }
    Ok(())
}

#[when(expr = "the network goes offline")]
fn network_goes_offline(world: &mut StashboxWorld) {
    world.network.set_offline(true);
}

#[when(expr = "the network comes back online")]
fn network_comes_back(world: &mut StashboxWorld) {
    world.network.set_offline(false);
}

#[when(expr = "the network starts serving {string} with body {string}")]
fn network_starts_serving(world: &mut StashboxWorld, target: String, body: String) {
    world.network.serve(&target, body);
}

#[when(expr = "the page sends a {word} message")]
async fn page_sends_message(world: &mut StashboxWorld, kind: String) -> Result<(), Error> {
    world.reply = world
        .worker()?
        .post_message(json!({ "type": kind }))
        .await?;
    Ok(())
}

#[when(expr = "a push arrives with payload:")]
async fn push_arrives(world: &mut StashboxWorld, step: &Step) -> Result<(), Error> {
    let payload = step
        .docstring
        .as_deref()
        .map(|payload| Bytes::from(payload.trim().to_owned()));
    world.notification = world.worker()?.push(payload).await?;
    Ok(())
}

#[when(expr = "the notification is clicked")]
async fn notification_clicked(world: &mut StashboxWorld) -> Result<(), Error> {
    let notification = world
        .notification
        .clone()
        .ok_or_else(|| anyhow!("no notification is shown"))?;
    world
        .worker()?
        .dispatch(stashbox::WorkerEvent::NotificationClick(notification))
        .await?;
    Ok(())
}
