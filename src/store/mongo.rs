//! MongoDB-backed [`DocumentStore`].
//!
//! Documents cross this boundary as `serde_json::Value`; the conversion to
//! and from BSON lives here, including the `_id <-> id` field mapping and
//! hex encoding of object ids.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use mongodb::{Client, Collection, Database};
use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::store::{Cond, DocumentStore, Filter, Op};

#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The driver connects lazily; an unreachable server surfaces on the
    /// first operation, not here.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, ApiError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self { db: client.database(db_name) })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<String, ApiError> {
        let mut document = json_to_document(&doc);
        document.remove("id");
        let result = self.collection(collection).insert_one(document).await?;
        result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .ok_or_else(|| ApiError::Internal("store returned a non-ObjectId identifier".into()))
    }

    async fn find(&self, collection: &str, filter: Filter) -> Result<Vec<Value>, ApiError> {
        let filter = build_filter(&filter)?;
        let docs: Vec<Document> =
            self.collection(collection).find(filter).await?.try_collect().await?;
        Ok(docs.iter().map(doc_to_json).collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<Option<Value>, ApiError> {
        let filter = build_filter(&filter)?;
        Ok(self.collection(collection).find_one(filter).await?.as_ref().map(doc_to_json))
    }

    async fn push(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        items: Vec<Value>,
    ) -> Result<u64, ApiError> {
        let oid = parse_object_id(id)?;
        let entries: Vec<Bson> = items.iter().map(json_to_bson).collect();
        let mut push_doc = Document::new();
        push_doc.insert(field, doc! { "$each": entries });
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": oid }, doc! { "$push": push_doc })
            .await?;
        Ok(result.matched_count)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Value>,
    ) -> Result<Vec<Value>, ApiError> {
        let stages: Vec<Document> = pipeline.iter().map(json_to_document).collect();
        let docs: Vec<Document> =
            self.collection(collection).aggregate(stages).await?.try_collect().await?;
        Ok(docs.iter().map(doc_to_json).collect())
    }
}

fn parse_object_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::InvalidId)
}

fn build_filter(filter: &Filter) -> Result<Document, ApiError> {
    let mut out = Document::new();
    for Cond { field, op, value } in filter.conds() {
        let key = if field == "id" { "_id" } else { field.as_str() };
        let value = condition_value(field, value)?;
        match op {
            Op::Eq => out.insert(key, value),
            Op::In => {
                let options = match value {
                    Bson::Array(items) => items,
                    other => vec![other],
                };
                out.insert(key, doc! { "$in": options })
            }
        };
    }
    Ok(out)
}

/// Conditions on `id` must run against `_id` as ObjectId values; the hex
/// string the API traffics in would never match.
fn condition_value(field: &str, value: &Value) -> Result<Bson, ApiError> {
    if field != "id" {
        return Ok(json_to_bson(value));
    }
    match value {
        Value::String(s) => Ok(Bson::ObjectId(parse_object_id(s)?)),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(Bson::ObjectId(parse_object_id(s)?)),
                _ => Err(ApiError::InvalidId),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Bson::Array),
        _ => Err(ApiError::InvalidId),
    }
}

fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Bson::Int64(i)
            } else {
                Bson::Double(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(map_to_document(map)),
    }
}

fn map_to_document(map: &Map<String, Value>) -> Document {
    let mut doc = Document::new();
    for (key, value) in map {
        doc.insert(key.clone(), json_to_bson(value));
    }
    doc
}

fn json_to_document(value: &Value) -> Document {
    match value {
        Value::Object(map) => map_to_document(map),
        _ => Document::new(),
    }
}

fn bson_to_json(bson: &Bson) -> Value {
    match bson {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(i) => Value::from(*i),
        Bson::Int64(i) => Value::from(*i),
        Bson::Double(f) => Value::from(*f),
        Bson::String(s) => Value::String(s.clone()),
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => doc_to_json(doc),
        other => Value::String(other.to_string()),
    }
}

/// BSON document to API-shape JSON: `_id` comes back as a hex `id`.
fn doc_to_json(doc: &Document) -> Value {
    let mut out = Map::new();
    for (key, value) in doc {
        let key = if key == "_id" { "id".to_string() } else { key.clone() };
        out.insert(key, bson_to_json(value));
    }
    Value::Object(out)
}
