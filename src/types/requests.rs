//! Request payloads and query parameters for the HTTP surface.

use serde::Deserialize;

use crate::error::ApiError;
use crate::types::entities::{GoalProgressEntry, Role, Validate, validate_email};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Validate for SignupRequest {
    fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.email)?;
        if self.username.trim().is_empty() {
            return Err(ApiError::validation("username must not be empty"));
        }
        if self.password.is_empty() {
            return Err(ApiError::validation("password must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `PATCH /sessions/{id}/goals-progress`. The batch is all-or-nothing:
/// one bad entry rejects the whole request before anything is written.
#[derive(Debug, Deserialize)]
pub struct GoalsProgressPatch {
    pub items: Vec<GoalProgressEntry>,
}

impl Validate for GoalsProgressPatch {
    fn validate(&self) -> Result<(), ApiError> {
        if self.items.is_empty() {
            return Err(ApiError::validation("items must not be empty"));
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct ListChildrenQuery {
    pub parent_id: Option<String>,
    pub therapist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListGoalsQuery {
    pub child_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub child_id: Option<String>,
    pub therapist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListProgressNotesQuery {
    pub child_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListDonationsQuery {
    pub child_id: Option<String>,
    pub donor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DonationsSummaryQuery {
    pub child_id: Option<String>,
    pub donor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeeklyReportQuery {
    pub parent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailWeeklyReportRequest {
    pub parent_id: String,
    pub to_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_payload_checks() {
        let ok = SignupRequest {
            name: "Dana Reyes".to_string(),
            email: "dana@example.com".to_string(),
            username: "dana".to_string(),
            password: "hunter2".to_string(),
            role: Role::Parent,
        };
        assert!(ok.validate().is_ok());

        let bad_email = SignupRequest { email: "dana".to_string(), ..ok_clone(&ok) };
        assert!(bad_email.validate().is_err());

        let blank_user = SignupRequest { username: "  ".to_string(), ..ok_clone(&ok) };
        assert!(blank_user.validate().is_err());

        let empty_password = SignupRequest { password: String::new(), ..ok_clone(&ok) };
        assert!(empty_password.validate().is_err());
    }

    fn ok_clone(src: &SignupRequest) -> SignupRequest {
        SignupRequest {
            name: src.name.clone(),
            email: src.email.clone(),
            username: src.username.clone(),
            password: src.password.clone(),
            role: src.role,
        }
    }

    #[test]
    fn empty_batch_is_rejected() {
        let patch = GoalsProgressPatch { items: vec![] };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn one_bad_entry_rejects_the_batch() {
        let patch = GoalsProgressPatch {
            items: vec![
                GoalProgressEntry { goal_id: "g1".to_string(), rating: Some(4), comment: None },
                GoalProgressEntry { goal_id: "g2".to_string(), rating: Some(9), comment: None },
            ],
        };
        assert!(patch.validate().is_err());
    }
}
