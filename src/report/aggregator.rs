//! Builds the per-parent weekly summary from store reads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::store::{DocumentStore, Filter, collections, find_as};
use crate::types::{Child, Goal, Session};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub parent_id: String,
    pub children: Vec<ChildSummary>,
    pub total_sessions: usize,
    pub total_progress_updates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildSummary {
    pub child_id: String,
    pub name: String,
    pub session_count: usize,
    pub goal_count: usize,
    pub progress_update_count: usize,
}

/// Resolve the parent's children, bulk-read their sessions and goals in one
/// query each, and fold the counts per child. An unknown parent id is not an
/// error; it yields an empty report.
pub async fn weekly_report(
    store: &dyn DocumentStore,
    parent_id: &str,
) -> Result<Report, ApiError> {
    let children: Vec<Child> =
        find_as(store, collections::CHILD, Filter::new().eq("parent_ids", parent_id)).await?;

    if children.is_empty() {
        return Ok(Report {
            parent_id: parent_id.to_string(),
            children: Vec::new(),
            total_sessions: 0,
            total_progress_updates: 0,
        });
    }

    let child_ids: Vec<String> = children.iter().map(|child| child.id.clone()).collect();
    let sessions: Vec<Session> = find_as(
        store,
        collections::SESSION,
        Filter::new().is_in("child_id", child_ids.clone()),
    )
    .await?;
    let goals: Vec<Goal> =
        find_as(store, collections::GOAL, Filter::new().is_in("child_id", child_ids)).await?;

    let mut session_counts: HashMap<&str, usize> = HashMap::new();
    let mut update_counts: HashMap<&str, usize> = HashMap::new();
    for session in &sessions {
        *session_counts.entry(session.child_id.as_str()).or_default() += 1;
        *update_counts.entry(session.child_id.as_str()).or_default() +=
            session.goals_progress.len();
    }
    let mut goal_counts: HashMap<&str, usize> = HashMap::new();
    for goal in &goals {
        *goal_counts.entry(goal.child_id.as_str()).or_default() += 1;
    }

    // Children keep their store order in the report.
    let summaries: Vec<ChildSummary> = children
        .iter()
        .map(|child| ChildSummary {
            child_id: child.id.clone(),
            name: format!("{} {}", child.first_name, child.last_name).trim().to_string(),
            session_count: session_counts.get(child.id.as_str()).copied().unwrap_or(0),
            goal_count: goal_counts.get(child.id.as_str()).copied().unwrap_or(0),
            progress_update_count: update_counts.get(child.id.as_str()).copied().unwrap_or(0),
        })
        .collect();

    let total_sessions = summaries.iter().map(|child| child.session_count).sum();
    let total_progress_updates =
        summaries.iter().map(|child| child.progress_update_count).sum();

    Ok(Report {
        parent_id: parent_id.to_string(),
        children: summaries,
        total_sessions,
        total_progress_updates,
    })
}
