//! Core data models.
//!
//! Row types mirror the six tables one-to-one. View types are the JSON
//! shapes returned by the API; they are assembled explicitly from rows rather
//! than serialized straight out of the database.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The singleton profile row. Updates always target [`PROFILE_ID`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub education: String,
}

/// Fixed identity of the profile row.
pub const PROFILE_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Link {
    pub name: String,
    pub url: String,
}

/// A project row. `links` holds the JSON-encoded `label -> URL` map as stored.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub links: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkExperience {
    #[serde(default)]
    pub id: i64,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectSkill {
    pub project_id: i64,
    pub skill_id: i64,
}

/// A project as served: links decoded and skills attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub links: BTreeMap<String, String>,
    pub skills: Vec<String>,
}

/// The aggregated profile document returned by `GET /profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub name: String,
    pub email: String,
    pub education: String,
    pub skills: Vec<String>,
    pub links: BTreeMap<String, String>,
    pub projects: Vec<ProjectView>,
    pub work_experience: Vec<WorkExperience>,
}

/// Request body for profile writes. Every field is optional at the type level;
/// the aggregator decides which ones each write mode requires.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub education: Option<String>,
}

/// Outcome of a profile write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteStatus {
    pub status: &'static str,
    pub message: String,
}

impl WriteStatus {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}

/// Combined search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResults {
    pub projects: Vec<ProjectView>,
    pub work_experience: Vec<WorkExperience>,
}
