//! In-memory [`DocumentStore`] used by the test suite. Mirrors the MongoDB
//! backend's observable behavior: store-assigned ids, membership semantics
//! for equality on list fields, and `$group` emitting nothing on empty input.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{DocumentStore, Filter, Op};

type Collections = HashMap<String, Vec<Value>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections.read().await.get(collection).map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, doc: Value) -> Result<String, ApiError> {
        let Value::Object(mut record) = doc else {
            return Err(ApiError::Internal("document must be a JSON object".into()));
        };
        let id = Uuid::new_v4().simple().to_string();
        record.insert("id".to_string(), Value::String(id.clone()));
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(Value::Object(record));
        Ok(id)
    }

    async fn find(&self, collection: &str, filter: Filter) -> Result<Vec<Value>, ApiError> {
        let collections = self.collections.read().await;
        let docs = collections.get(collection).map_or(&[][..], Vec::as_slice);
        Ok(docs.iter().filter(|doc| matches(doc, &filter)).cloned().collect())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Filter,
    ) -> Result<Option<Value>, ApiError> {
        let collections = self.collections.read().await;
        let docs = collections.get(collection).map_or(&[][..], Vec::as_slice);
        Ok(docs.iter().find(|doc| matches(doc, &filter)).cloned())
    }

    async fn push(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        items: Vec<Value>,
    ) -> Result<u64, ApiError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(doc) =
            docs.iter_mut().find(|doc| doc.get("id").and_then(Value::as_str) == Some(id))
        else {
            return Ok(0);
        };
        let Some(record) = doc.as_object_mut() else {
            return Ok(0);
        };
        let entry = record.entry(field.to_string()).or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(list) => {
                list.extend(items);
                Ok(1)
            }
            _ => Err(ApiError::Internal(format!("field {field} is not a list"))),
        }
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Value>,
    ) -> Result<Vec<Value>, ApiError> {
        let rows =
            self.collections.read().await.get(collection).cloned().unwrap_or_default();
        run_pipeline(rows, &pipeline)
    }
}

fn matches(doc: &Value, filter: &Filter) -> bool {
    filter.conds().iter().all(|cond| {
        let field_value = doc.get(&cond.field).unwrap_or(&Value::Null);
        match cond.op {
            Op::Eq => value_matches(field_value, &cond.value),
            Op::In => match &cond.value {
                Value::Array(options) => {
                    options.iter().any(|option| value_matches(field_value, option))
                }
                _ => false,
            },
        }
    })
}

/// Equality with membership semantics on list-valued fields.
fn value_matches(field_value: &Value, target: &Value) -> bool {
    match field_value {
        Value::Array(items) => items.contains(target) || field_value == target,
        _ => field_value == target,
    }
}

/// Interprets the stages the service actually issues: `$match` with field
/// equality and a single-bucket `$group` with `$sum` accumulators. Anything
/// else fails loudly rather than returning a wrong answer.
fn run_pipeline(mut rows: Vec<Value>, pipeline: &[Value]) -> Result<Vec<Value>, ApiError> {
    for stage in pipeline {
        let Some(stage_doc) = stage.as_object() else {
            return Err(ApiError::Internal(format!("malformed pipeline stage: {stage}")));
        };
        if let Some(cond) = stage_doc.get("$match") {
            rows.retain(|row| match_stage(row, cond));
        } else if let Some(group) = stage_doc.get("$group") {
            rows = group_stage(rows, group)?;
        } else {
            return Err(ApiError::Internal(format!("unsupported pipeline stage: {stage}")));
        }
    }
    Ok(rows)
}

fn match_stage(row: &Value, cond: &Value) -> bool {
    cond.as_object().is_some_and(|conds| {
        conds
            .iter()
            .all(|(field, target)| value_matches(row.get(field).unwrap_or(&Value::Null), target))
    })
}

fn group_stage(rows: Vec<Value>, stage: &Value) -> Result<Vec<Value>, ApiError> {
    let Some(accumulators) = stage.as_object() else {
        return Err(ApiError::Internal("malformed $group stage".into()));
    };
    // Grouping over no input emits no bucket at all.
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let mut bucket = Map::new();
    for (key, accumulator) in accumulators {
        if key == "_id" {
            bucket.insert(key.clone(), accumulator.clone());
            continue;
        }
        let Some(operand) = accumulator.get("$sum") else {
            return Err(ApiError::Internal(format!("unsupported accumulator: {accumulator}")));
        };
        let total = match operand {
            Value::String(field_ref) if field_ref.starts_with('$') => {
                let field = &field_ref[1..];
                json!(
                    rows.iter()
                        .map(|row| row.get(field).and_then(Value::as_f64).unwrap_or(0.0))
                        .sum::<f64>()
                )
            }
            other => match other.as_i64() {
                Some(step) => json!(step * rows.len() as i64),
                None => json!(other.as_f64().unwrap_or(0.0) * rows.len() as f64),
            },
        };
        bucket.insert(key.clone(), total);
    }
    Ok(vec![Value::Object(bucket)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::collections;

    fn donation_pipeline(match_doc: Value) -> Vec<Value> {
        vec![
            json!({ "$match": match_doc }),
            json!({ "$group": { "_id": null, "total": { "$sum": "$amount" }, "count": { "$sum": 1 } } }),
        ]
    }

    #[tokio::test]
    async fn insert_assigns_an_id_and_ignores_the_client_one() {
        let store = MemoryStore::new();
        let id = store
            .insert(collections::CHILD, json!({ "id": "forged", "first_name": "Mara" }))
            .await
            .unwrap();
        assert_ne!(id, "forged");

        let doc = store
            .find_one(collections::CHILD, Filter::new().eq("id", id.as_str()))
            .await
            .unwrap()
            .expect("inserted document should be findable by its id");
        assert_eq!(doc["first_name"], json!("Mara"));
    }

    #[tokio::test]
    async fn eq_on_a_list_field_matches_membership() {
        let store = MemoryStore::new();
        store
            .insert(collections::CHILD, json!({ "first_name": "A", "parent_ids": ["p1", "p2"] }))
            .await
            .unwrap();
        store
            .insert(collections::CHILD, json!({ "first_name": "B", "parent_ids": ["p2"] }))
            .await
            .unwrap();

        let hits =
            store.find(collections::CHILD, Filter::new().eq("parent_ids", "p1")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["first_name"], json!("A"));

        let hits =
            store.find(collections::CHILD, Filter::new().eq("parent_ids", "p2")).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn in_condition_matches_any_of() {
        let store = MemoryStore::new();
        for child_id in ["c1", "c2", "c3"] {
            store
                .insert(collections::SESSION, json!({ "child_id": child_id }))
                .await
                .unwrap();
        }
        let hits = store
            .find(collections::SESSION, Filter::new().is_in("child_id", ["c1", "c3"]))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn empty_filter_returns_everything() {
        let store = MemoryStore::new();
        store.insert(collections::GOAL, json!({ "title": "one" })).await.unwrap();
        store.insert(collections::GOAL, json!({ "title": "two" })).await.unwrap();
        let hits = store.find(collections::GOAL, Filter::new()).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn push_appends_in_order_and_reports_a_match() {
        let store = MemoryStore::new();
        let id = store
            .insert(collections::SESSION, json!({ "child_id": "c1", "goals_progress": [] }))
            .await
            .unwrap();

        let matched = store
            .push(
                collections::SESSION,
                &id,
                "goals_progress",
                vec![json!({ "goal_id": "g1" }), json!({ "goal_id": "g2" })],
            )
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let matched = store
            .push(collections::SESSION, &id, "goals_progress", vec![json!({ "goal_id": "g3" })])
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let doc = store
            .find_one(collections::SESSION, Filter::new().eq("id", id.as_str()))
            .await
            .unwrap()
            .unwrap();
        let entries = doc["goals_progress"].as_array().unwrap();
        let order: Vec<&str> =
            entries.iter().map(|e| e["goal_id"].as_str().unwrap()).collect();
        assert_eq!(order, ["g1", "g2", "g3"]);
    }

    #[tokio::test]
    async fn push_to_a_missing_document_matches_nothing() {
        let store = MemoryStore::new();
        let matched = store
            .push(collections::SESSION, "absent", "goals_progress", vec![json!({})])
            .await
            .unwrap();
        assert_eq!(matched, 0);
    }

    #[tokio::test]
    async fn aggregate_sums_amounts_and_counts_rows() {
        let store = MemoryStore::new();
        store
            .insert(collections::DONATION, json!({ "donor_id": "d1", "amount": 25.0 }))
            .await
            .unwrap();
        store
            .insert(collections::DONATION, json!({ "donor_id": "d1", "amount": 10.5 }))
            .await
            .unwrap();
        store
            .insert(collections::DONATION, json!({ "donor_id": "d2", "amount": 100.0 }))
            .await
            .unwrap();

        let rows = store
            .aggregate(collections::DONATION, donation_pipeline(json!({ "donor_id": "d1" })))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["total"], json!(35.5));
        assert_eq!(rows[0]["count"], json!(2));
    }

    #[tokio::test]
    async fn aggregate_over_no_matches_emits_no_bucket() {
        let store = MemoryStore::new();
        store
            .insert(collections::DONATION, json!({ "donor_id": "d1", "amount": 25.0 }))
            .await
            .unwrap();
        let rows = store
            .aggregate(collections::DONATION, donation_pipeline(json!({ "donor_id": "nobody" })))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn unsupported_stage_errors_instead_of_guessing() {
        let store = MemoryStore::new();
        store.insert(collections::DONATION, json!({ "amount": 1.0 })).await.unwrap();
        let result =
            store.aggregate(collections::DONATION, vec![json!({ "$lookup": {} })]).await;
        assert!(result.is_err());
    }
}
