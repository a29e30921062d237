use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Structural and range checks applied to a payload before it reaches the
/// store. Referential checks (does the target document exist) are not part
/// of this; the store is the source of truth for those.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

fn default_true() -> bool {
    true
}

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::validation("invalid email address")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Therapist,
    Parent,
    Donor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
}

impl Default for GoalStatus {
    fn default() -> Self {
        GoalStatus::Active
    }
}

/// Who a progress note is intended for. Stored verbatim; enforcement is a
/// concern of the (out-of-scope) authorization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Center,
    Parents,
    Therapists,
    Donors,
    Public,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Parents
    }
}

/// A staff member, parent or donor account. `password_hash` is only present
/// on accounts created through signup and is never serialized into listing
/// responses (handlers blank it before replying).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

impl Validate for User {
    fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub therapist_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
}

impl Validate for Child {
    fn validate(&self) -> Result<(), ApiError> {
        if self.parent_ids.iter().any(String::is_empty) {
            return Err(ApiError::validation("parent_ids must not contain empty entries"));
        }
        if self.therapist_ids.iter().any(String::is_empty) {
            return Err(ApiError::validation("therapist_ids must not contain empty entries"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub child_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_metric: Option<String>,
    #[serde(default)]
    pub status: GoalStatus,
}

impl Validate for Goal {
    fn validate(&self) -> Result<(), ApiError> {
        if self.child_id.is_empty() {
            return Err(ApiError::validation("child_id must not be empty"));
        }
        Ok(())
    }
}

/// One progress observation against a goal, recorded during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgressEntry {
    pub goal_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Validate for GoalProgressEntry {
    fn validate(&self) -> Result<(), ApiError> {
        if self.goal_id.is_empty() {
            return Err(ApiError::validation("goals_progress entry is missing goal_id"));
        }
        if let Some(rating) = self.rating
            && !(1..=5).contains(&rating)
        {
            return Err(ApiError::validation("rating must be between 1 and 5"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub child_id: String,
    pub therapist_id: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub goals_progress: Vec<GoalProgressEntry>,
}

impl Validate for Session {
    fn validate(&self) -> Result<(), ApiError> {
        if self.child_id.is_empty() {
            return Err(ApiError::validation("child_id must not be empty"));
        }
        if self.therapist_id.is_empty() {
            return Err(ApiError::validation("therapist_id must not be empty"));
        }
        for entry in &self.goals_progress {
            entry.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressNote {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub child_id: String,
    pub therapist_id: String,
    pub note: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Validate for ProgressNote {
    fn validate(&self) -> Result<(), ApiError> {
        if self.child_id.is_empty() {
            return Err(ApiError::validation("child_id must not be empty"));
        }
        if self.therapist_id.is_empty() {
            return Err(ApiError::validation("therapist_id must not be empty"));
        }
        Ok(())
    }
}

/// A monetary donation, optionally tied to a donor account and/or a child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub date: NaiveDate,
}

impl Validate for Donation {
    fn validate(&self) -> Result<(), ApiError> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ApiError::validation("amount must be a non-negative number"));
        }
        Ok(())
    }
}
