use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An application (service) that incidents are raised against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    /// Catalog identifier
    pub id: i64,

    /// Display name
    pub name: String,
}

/// A closure code: a standard resolution category for an incident
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClosureCode {
    /// Catalog identifier
    pub id: i64,

    /// Short code (e.g. "NET-TO")
    pub code: String,

    /// Human-readable description
    pub description: String,

    /// Cause text describing when this code applies
    #[serde(default)]
    pub cause: String,

    /// Owning application, if the code is scoped to one.
    /// `None` means the code is shared across all applications.
    #[serde(default)]
    pub application_id: Option<i64>,
}

impl ClosureCode {
    pub fn new(id: i64, code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            description: description.into(),
            cause: String::new(),
            application_id: None,
        }
    }

    /// Scope the code to a single application
    pub fn with_application(mut self, application_id: i64) -> Self {
        self.application_id = Some(application_id);
        self
    }

    /// Set the cause text
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = cause.into();
        self
    }
}

/// A resolved incident, read-only training evidence for the recommender.
///
/// The four free-text fields are optional in the source system; absent
/// fields map to empty strings rather than nulls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// Unique identifier
    pub id: Uuid,

    /// Free-text incident description
    #[serde(default)]
    pub description: String,

    /// Free-text root cause
    #[serde(default)]
    pub cause: String,

    /// Free-text final solution narrative
    #[serde(default)]
    pub final_solution: String,

    /// Free-text operator observations
    #[serde(default)]
    pub observations: String,

    /// Closure code this incident was resolved with
    pub closure_code_id: i64,

    /// Opening timestamp
    pub opened_at: DateTime<Utc>,
}

impl IncidentRecord {
    /// Create a new incident record resolved with the given closure code
    pub fn new(closure_code_id: i64, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            cause: String::new(),
            final_solution: String::new(),
            observations: String::new(),
            closure_code_id,
            opened_at: Utc::now(),
        }
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = cause.into();
        self
    }

    pub fn with_final_solution(mut self, final_solution: impl Into<String>) -> Self {
        self.final_solution = final_solution.into();
        self
    }

    pub fn with_observations(mut self, observations: impl Into<String>) -> Self {
        self.observations = observations.into();
        self
    }

    pub fn with_opened_at(mut self, opened_at: DateTime<Utc>) -> Self {
        self.opened_at = opened_at;
        self
    }

    /// Concatenated free-text fields, in training-document order
    pub fn free_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.description, self.cause, self.final_solution, self.observations
        )
    }
}
