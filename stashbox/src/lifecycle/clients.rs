//! Registry of open pages.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use smol_str::SmolStr;
use tracing::{debug, info};
use url::Url;

/// Identifier of an open page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// An open page and the worker version controlling it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    id: ClientId,
    url: Url,
    controller: Option<SmolStr>,
}

impl Client {
    /// Returns the client identifier.
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns the page URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the version of the worker controlling this page.
    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }
}

#[derive(Debug, Default)]
struct ClientsInner {
    clients: DashMap<ClientId, Client>,
    next_id: AtomicU64,
    opened: Mutex<Vec<Url>>,
}

/// Pages the worker may control.
///
/// The host registers pages as they open. Activation claims all of them for
/// the new worker version, and a notification click asks the host to open a
/// new window, which is recorded here until the host drains it.
#[derive(Debug, Clone, Default)]
pub struct Clients {
    inner: Arc<ClientsInner>,
}

impl Clients {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an uncontrolled page.
    pub fn register(&self, url: Url) -> ClientId {
        let id = ClientId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(%id, %url, "client registered");
        self.inner.clients.insert(
            id,
            Client {
                id,
                url,
                controller: None,
            },
        );
        id
    }

    /// Forgets a closed page.
    pub fn unregister(&self, id: ClientId) -> Option<Client> {
        self.inner.clients.remove(&id).map(|(_, client)| client)
    }

    /// Returns a snapshot of one page.
    pub fn get(&self, id: ClientId) -> Option<Client> {
        self.inner.clients.get(&id).map(|entry| entry.value().clone())
    }

    /// Returns the number of registered pages.
    pub fn len(&self) -> usize {
        self.inner.clients.len()
    }

    /// Returns `true` if no page is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.clients.is_empty()
    }

    /// Makes `version` the controller of every registered page.
    ///
    /// Returns the number of pages claimed.
    pub fn claim(&self, version: &str) -> usize {
        let mut claimed = 0;
        for mut entry in self.inner.clients.iter_mut() {
            entry.controller = Some(SmolStr::new(version));
            claimed += 1;
        }
        info!(version, claimed, "claimed clients");
        claimed
    }

    /// Returns the number of pages controlled by `version`.
    pub fn controlled_by(&self, version: &str) -> usize {
        self.inner
            .clients
            .iter()
            .filter(|entry| entry.controller() == Some(version))
            .count()
    }

    /// Asks the host to open a window at `url`.
    pub fn open_window(&self, url: Url) {
        debug!(%url, "open window requested");
        self.opened().push(url);
    }

    /// Takes every pending open-window request.
    pub fn take_opened_windows(&self) -> Vec<Url> {
        std::mem::take(&mut *self.opened())
    }

    fn opened(&self) -> std::sync::MutexGuard<'_, Vec<Url>> {
        self.inner
            .opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str) -> Url {
        Url::parse("https://portfolio.example/").unwrap().join(path).unwrap()
    }

    #[test]
    fn claim_controls_every_page() {
        let clients = Clients::new();
        let first = clients.register(page("/"));
        clients.register(page("/projects"));

        assert_eq!(clients.claim("personaldevpage-v1.2"), 2);
        assert_eq!(clients.controlled_by("personaldevpage-v1.2"), 2);
        assert_eq!(
            clients.get(first).unwrap().controller(),
            Some("personaldevpage-v1.2")
        );
    }

    #[test]
    fn unregistered_pages_are_not_claimed() {
        let clients = Clients::new();
        let id = clients.register(page("/"));
        assert!(clients.unregister(id).is_some());
        assert_eq!(clients.claim("v2"), 0);
        assert!(clients.is_empty());
    }

    #[test]
    fn opened_windows_are_drained() {
        let clients = Clients::new();
        clients.open_window(page("/blog"));
        assert_eq!(clients.take_opened_windows(), vec![page("/blog")]);
        assert!(clients.take_opened_windows().is_empty());
    }
}
