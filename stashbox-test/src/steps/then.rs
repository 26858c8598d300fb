use anyhow::{Error, anyhow};
use cucumber::gherkin::Step;
use cucumber::then;

use crate::steps::StepExt;
use crate::world::{Outcome, StashboxWorld};

#[then(expr = "the response body is {string}")]
fn response_body(world: &mut StashboxWorld, expected: String) -> Result<(), Error> {
    let served = world.served()?;
    let body = String::from_utf8_lossy(served.response.body());
    if body != expected {
        return Err(anyhow!("response body {body:?} does not match {expected:?}"));
    }
    Ok(())
}

#[then(expr = "the response status is {int}")]
fn response_status(world: &mut StashboxWorld, expected: u16) -> Result<(), Error> {
    let status = world.served()?.response.status().as_u16();
    if status != expected {
        return Err(anyhow!("response status {status} does not match {expected}"));
    }
    Ok(())
}

#[then(expr = "the response comes from the {word}")]
fn response_source(world: &mut StashboxWorld, expected: String) -> Result<(), Error> {
    let source = world.served()?.source.as_str();
    if source != expected {
        return Err(anyhow!("response came from the {source}, expected {expected}"));
    }
    Ok(())
}

#[then(expr = "the response comes from generation {string}")]
fn response_generation(world: &mut StashboxWorld, expected: String) -> Result<(), Error> {
    let served = world.served()?;
    match served.source.generation() {
        Some(generation) if generation.as_str() == expected => Ok(()),
        other => Err(anyhow!("response came from {other:?}, expected {expected}")),
    }
}

#[then(expr = "the request fails")]
fn request_fails(world: &mut StashboxWorld) -> Result<(), Error> {
    match &world.outcome {
        Some(Outcome::Failed(_)) => Ok(()),
        other => Err(anyhow!("expected the request to fail, got {other:?}")),
    }
}

#[then(expr = "the request passes through to the network")]
fn request_passes_through(world: &mut StashboxWorld) -> Result<(), Error> {
    match &world.outcome {
        Some(Outcome::Passthrough) => Ok(()),
        other => Err(anyhow!("expected a passthrough, got {other:?}")),
    }
}

#[then(expr = "the network was asked for {string} {int} time(s)")]
fn network_calls(world: &mut StashboxWorld, target: String, expected: usize) -> Result<(), Error> {
    let calls = world.network.calls(&target);
    if calls != expected {
        return Err(anyhow!(
            "network was asked for {target} {calls} times, expected {expected}"
        ));
    }
    Ok(())
}

#[then(expr = "the worker is {word}")]
fn worker_state(world: &mut StashboxWorld, expected: String) -> Result<(), Error> {
    let state = world.worker()?.state();
    if state.as_str() != expected {
        return Err(anyhow!(
            "worker is {state}, expected {expected} (start error: {:?})",
            world.start_error
        ));
    }
    Ok(())
}

#[then(expr = "installation failed")]
fn installation_failed(world: &mut StashboxWorld) -> Result<(), Error> {
    if world.start_error.is_none() {
        return Err(anyhow!("expected installation to fail"));
    }
    Ok(())
}

#[then(expr = "the cache generations are {string}")]
async fn cache_generations(world: &mut StashboxWorld, expected: String) -> Result<(), Error> {
    let expected: Vec<String> = expected
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect();
    let actual = world.storage.generation_names().await;
    if actual != expected {
        return Err(anyhow!(
            "cache generations {actual:?} do not match {expected:?}"
        ));
    }
    Ok(())
}

#[then(expr = "generation {string} holds:")]
async fn generation_holds(
    world: &mut StashboxWorld,
    name: String,
    step: &Step,
) -> Result<(), Error> {
    let mut expected: Vec<String> = step
        .docstring_lines()
        .ok_or_else(|| anyhow!("expected entries not provided"))?
        .iter()
        .map(|target| world.network.url(target))
        .collect();
    expected.sort();

    let actual = world
        .storage
        .entries(&name)
        .await
        .ok_or_else(|| anyhow!("generation {name} does not exist"))?;
    if actual != expected {
        return Err(anyhow!(
            "generation {name} holds {actual:?}, expected {expected:?}"
        ));
    }
    Ok(())
}

#[then(expr = "generation {string} is empty or missing")]
async fn generation_empty(world: &mut StashboxWorld, name: String) -> Result<(), Error> {
    match world.storage.entries(&name).await {
        Some(entries) if !entries.is_empty() => Err(anyhow!(
            "generation {name} holds {entries:?}, expected nothing"
        )),
        _ => Ok(()),
    }
}

#[then(expr = "the reply version is {string}")]
fn reply_version(world: &mut StashboxWorld, expected: String) -> Result<(), Error> {
    let reply = world
        .reply
        .as_ref()
        .ok_or_else(|| anyhow!("no reply was posted"))?;
    if reply.version != expected {
        return Err(anyhow!(
            "reply version {} does not match {expected}",
            reply.version
        ));
    }
    Ok(())
}

#[then(expr = "no reply is posted")]
fn no_reply(world: &mut StashboxWorld) -> Result<(), Error> {
    match &world.reply {
        None => Ok(()),
        Some(reply) => Err(anyhow!("unexpected reply {reply:?}")),
    }
}

#[then(expr = "a notification titled {string} is shown")]
fn notification_shown(world: &mut StashboxWorld, expected: String) -> Result<(), Error> {
    let notification = world
        .notification
        .as_ref()
        .ok_or_else(|| anyhow!("no notification is shown"))?;
    if notification.title != expected {
        return Err(anyhow!(
            "notification title {:?} does not match {expected:?}",
            notification.title
        ));
    }
    Ok(())
}

#[then(expr = "no notification is shown")]
fn no_notification(world: &mut StashboxWorld) -> Result<(), Error> {
    match &world.notification {
        None => Ok(()),
        Some(notification) => Err(anyhow!("unexpected notification {notification:?}")),
    }
}

#[then(expr = "a window is opened at {string}")]
fn window_opened(world: &mut StashboxWorld, target: String) -> Result<(), Error> {
    let expected = world.network.url(&target);
    let opened: Vec<String> = world
        .worker()?
        .clients()
        .take_opened_windows()
        .into_iter()
        .map(String::from)
        .collect();
    if opened != vec![expected.clone()] {
        return Err(anyhow!("opened windows {opened:?}, expected [{expected}]"));
    }
    Ok(())
}
