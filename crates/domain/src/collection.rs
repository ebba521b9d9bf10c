//! Collections of saved requests

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::environment::VariableMap;
use crate::id::{Identified, generate_id};
use crate::request::Request;

/// A node in the collection tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionItem {
    /// A folder of further items
    Folder(Folder),
    /// A saved request
    Request(Request),
}

impl CollectionItem {
    /// Returns the id of the folder or request.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.id,
            Self::Request(request) => &request.id,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.name,
            Self::Request(request) => &request.name,
        }
    }
}

/// A named folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Stable identity
    pub id: String,
    /// Folder name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Child items in display order
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Interchange fields kept for round-trip
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl Folder {
    /// Creates an empty folder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            description: None,
            items: Vec::new(),
            extras: Map::new(),
        }
    }

    /// Appends a request.
    #[must_use]
    pub fn with_request(mut self, request: Request) -> Self {
        self.items.push(CollectionItem::Request(request));
        self
    }

    /// Appends a sub-folder.
    #[must_use]
    pub fn with_folder(mut self, folder: Self) -> Self {
        self.items.push(CollectionItem::Folder(folder));
        self
    }
}

/// A named, ordered tree of folders and saved requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Stable identity
    pub id: String,
    /// Collection name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Collection-scope variables
    #[serde(default, skip_serializing_if = "VariableMap::is_empty")]
    pub variables: VariableMap,
    /// Top-level items in display order
    #[serde(default)]
    pub items: Vec<CollectionItem>,
    /// Interchange fields kept for round-trip
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Map<String, Value>,
}

impl Collection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            description: None,
            variables: VariableMap::new(),
            items: Vec::new(),
            extras: Map::new(),
        }
    }

    /// Appends a request at the root.
    #[must_use]
    pub fn with_request(mut self, request: Request) -> Self {
        self.items.push(CollectionItem::Request(request));
        self
    }

    /// Appends a folder at the root.
    #[must_use]
    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.items.push(CollectionItem::Folder(folder));
        self
    }

    /// Every saved request, depth first in display order.
    #[must_use]
    pub fn requests(&self) -> Vec<&Request> {
        let mut out = Vec::new();
        collect_requests(&self.items, &mut out);
        out
    }

    /// Number of saved requests at any depth.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    /// Finds a saved request by id at any depth.
    #[must_use]
    pub fn find_request(&self, id: &str) -> Option<&Request> {
        self.requests().into_iter().find(|r| r.id == id)
    }

    /// Replaces the saved request with the same id, or appends it at the root.
    ///
    /// Returns true when an existing request was replaced.
    pub fn upsert_request(&mut self, request: Request) -> bool {
        match replace_request(&mut self.items, request) {
            None => true,
            Some(request) => {
                self.items.push(CollectionItem::Request(request));
                false
            }
        }
    }
}

impl Identified for Collection {
    fn id(&self) -> &str {
        &self.id
    }
}

fn collect_requests<'a>(items: &'a [CollectionItem], out: &mut Vec<&'a Request>) {
    for item in items {
        match item {
            CollectionItem::Request(request) => out.push(request),
            CollectionItem::Folder(folder) => collect_requests(&folder.items, out),
        }
    }
}

/// Gives the request back when no item with its id exists.
fn replace_request(items: &mut [CollectionItem], request: Request) -> Option<Request> {
    let mut pending = request;
    for item in items {
        match item {
            CollectionItem::Request(existing) if existing.id == pending.id => {
                *existing = pending;
                return None;
            }
            CollectionItem::Request(_) => {}
            CollectionItem::Folder(folder) => match replace_request(&mut folder.items, pending) {
                None => return None,
                Some(back) => pending = back,
            },
        }
    }
    Some(pending)
}
