//! Editable request tabs

use std::sync::Arc;

use crate::environment::{Variable, VariableMap};
use crate::id::generate_id;
use crate::request::{HttpMethod, Request};
use crate::response::Response;

/// One editable request plus at most one response.
///
/// The request sits behind an `Arc` and is only ever replaced whole, so a
/// send holding the previous snapshot never sees a half-applied edit.
#[derive(Debug, Clone)]
pub struct Tab {
    /// Tab identity, distinct from the request id.
    pub id: String,
    request: Arc<Request>,
    response: Option<Arc<Response>>,
    /// True while a send is in flight.
    pub is_loading: bool,
    /// True when the request differs from its saved copy.
    pub is_dirty: bool,
    /// Id of the saved request this tab was opened from or saved to.
    pub collection_request_id: Option<String>,
    /// Tab-level overrides, the base of the local scope.
    pub local_variables: VariableMap,
}

impl Tab {
    /// Opens a tab on a new, unsaved request.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            id: generate_id(),
            request: Arc::new(request),
            response: None,
            is_loading: false,
            is_dirty: false,
            collection_request_id: None,
            local_variables: VariableMap::new(),
        }
    }

    /// Opens a tab on an empty `GET` request.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Request::http("Untitled Request", HttpMethod::Get, ""))
    }

    /// Opens a tab on a copy of a saved request, linked back to it.
    #[must_use]
    pub fn open_saved(saved: &Request) -> Self {
        Self {
            collection_request_id: Some(saved.id.clone()),
            ..Self::new(saved.clone())
        }
    }

    /// Opens a new tab on a duplicate of this tab's request.
    ///
    /// The duplicate gets a fresh request id, no response and no link to a
    /// saved request.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            local_variables: self.local_variables.clone(),
            ..Self::new(self.request.duplicate())
        }
    }

    /// Current request snapshot.
    #[must_use]
    pub fn request(&self) -> Arc<Request> {
        Arc::clone(&self.request)
    }

    /// Last response, if any.
    #[must_use]
    pub fn response(&self) -> Option<Arc<Response>> {
        self.response.clone()
    }

    /// Applies an edit to a copy of the request and swaps it in.
    pub fn edit(&mut self, f: impl FnOnce(&mut Request)) {
        let mut next = (*self.request).clone();
        f(&mut next);
        self.request = Arc::new(next);
        self.is_dirty = true;
    }

    /// Sets a tab-level variable override.
    pub fn set_local_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.local_variables.insert(name.into(), Variable::new(value));
    }

    /// Marks the send as started. Returns false if one is already in flight.
    pub fn begin_send(&mut self) -> bool {
        if self.is_loading {
            return false;
        }
        self.is_loading = true;
        true
    }

    /// Marks the send as finished, replacing the response when one was produced.
    pub fn finish_send(&mut self, response: Option<Arc<Response>>) {
        self.is_loading = false;
        if response.is_some() {
            self.response = response;
        }
    }

    /// Records an explicit save.
    pub fn mark_saved(&mut self, collection_request_id: impl Into<String>) {
        self.collection_request_id = Some(collection_request_id.into());
        self.is_dirty = false;
    }
}

impl Default for Tab {
    fn default() -> Self {
        Self::empty()
    }
}
