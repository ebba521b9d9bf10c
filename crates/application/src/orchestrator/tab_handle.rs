//! Shared handle on a tab that sends can run against

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use courier_domain::request::Request;
use courier_domain::response::Response;
use courier_domain::tab::Tab;
use tokio_util::sync::CancellationToken;

/// A tab shared between the caller and its in-flight send.
///
/// The lock is only held for short synchronous sections, never across an
/// `.await`.
#[derive(Debug)]
pub struct TabHandle {
    tab: Mutex<Tab>,
    alive: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TabHandle {
    /// Wraps a tab.
    #[must_use]
    pub fn new(tab: Tab) -> Arc<Self> {
        Arc::new(Self {
            tab: Mutex::new(tab),
            alive: AtomicBool::new(true),
            cancel: Mutex::new(None),
        })
    }

    /// Id of the wrapped tab.
    #[must_use]
    pub fn id(&self) -> String {
        lock(&self.tab).id.clone()
    }

    /// Copy of the tab as it is now.
    #[must_use]
    pub fn snapshot(&self) -> Tab {
        lock(&self.tab).clone()
    }

    /// Current request snapshot.
    #[must_use]
    pub fn request(&self) -> Arc<Request> {
        lock(&self.tab).request()
    }

    /// Last response delivered to the tab.
    #[must_use]
    pub fn response(&self) -> Option<Arc<Response>> {
        lock(&self.tab).response()
    }

    /// True while a send is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        lock(&self.tab).is_loading
    }

    /// False once the tab has been closed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Runs `f` with the tab locked.
    pub fn with_tab<R>(&self, f: impl FnOnce(&mut Tab) -> R) -> R {
        f(&mut lock(&self.tab))
    }

    /// Edits the request. Sends already running keep their snapshot.
    pub fn edit(&self, f: impl FnOnce(&mut Request)) {
        lock(&self.tab).edit(f);
    }

    /// Closes the tab. A send still in flight runs on, but its result is discarded.
    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }

    /// Cancels the in-flight send, if any. Returns true when there was one.
    pub fn cancel(&self) -> bool {
        lock(&self.cancel).as_ref().is_some_and(|token| {
            token.cancel();
            true
        })
    }

    /// Claims the tab for a send. `None` if a send is already in flight or the tab is closed.
    pub(crate) fn try_begin(&self) -> Option<CancellationToken> {
        if !self.is_alive() || !lock(&self.tab).begin_send() {
            return None;
        }
        let token = CancellationToken::new();
        *lock(&self.cancel) = Some(token.clone());
        Some(token)
    }

    /// Releases the tab and delivers the response. Returns false when the tab was closed.
    pub(crate) fn finish(&self, response: Option<Arc<Response>>) -> bool {
        *lock(&self.cancel) = None;
        let mut tab = lock(&self.tab);
        if !self.is_alive() {
            tab.is_loading = false;
            return false;
        }
        tab.finish_send(response);
        true
    }
}
