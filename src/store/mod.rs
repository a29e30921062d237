//! Persistence seam. Handlers and the report pipeline talk to a
//! [`DocumentStore`] and never to a concrete database, so the MongoDB
//! backend and the in-memory backend are interchangeable.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ApiError;

/// Collection names, one per entity type.
pub mod collections {
    pub const USER: &str = "user";
    pub const CHILD: &str = "child";
    pub const GOAL: &str = "goal";
    pub const SESSION: &str = "session";
    pub const PROGRESS_NOTE: &str = "progressnote";
    pub const DONATION: &str = "donation";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Field equals the value. On a list-valued field this matches
    /// membership, document-store style.
    Eq,
    /// Field value is one of the listed values.
    In,
}

#[derive(Debug, Clone)]
pub struct Cond {
    pub field: String,
    pub op: Op,
    pub value: Value,
}

/// A conjunction of field conditions. The empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conds: Vec<Cond>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conds.push(Cond { field: field.into(), op: Op::Eq, value: value.into() });
        self
    }

    pub fn is_in<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        self.conds.push(Cond { field: field.into(), op: Op::In, value: Value::Array(values) });
        self
    }

    pub fn conds(&self) -> &[Cond] {
        &self.conds
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `doc` into `collection` and return the store-assigned
    /// identifier. A client-supplied `id` field is discarded.
    async fn insert(&self, collection: &str, doc: Value) -> Result<String, ApiError>;

    async fn find(&self, collection: &str, filter: Filter) -> Result<Vec<Value>, ApiError>;

    async fn find_one(&self, collection: &str, filter: Filter) -> Result<Option<Value>, ApiError>;

    /// Atomically append `items` to the list field `field` of the document
    /// identified by `id`. Returns the number of matched documents (0 or 1);
    /// existing list content is never read or rewritten.
    async fn push(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        items: Vec<Value>,
    ) -> Result<u64, ApiError>;

    /// Run an aggregation pipeline store-side.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Value>,
    ) -> Result<Vec<Value>, ApiError>;
}

/// Fetch every document matching `filter` and deserialize into `T`.
pub async fn find_as<T>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: Filter,
) -> Result<Vec<T>, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    store
        .find(collection, filter)
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(ApiError::from))
        .collect()
}
