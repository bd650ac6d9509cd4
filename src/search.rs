//! Substring search over projects and work experience.
//!
//! Project titles/descriptions and work roles/descriptions are matched
//! independently with case-insensitive containment. No ranking, no
//! tokenization, no pagination.

use sqlx::SqliteConnection;

use crate::error::{Error, Result};
use crate::models::SearchResults;
use crate::projects;
use crate::store;

pub async fn search(conn: &mut SqliteConnection, query: Option<&str>) -> Result<SearchResults> {
    let term = query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| Error::Validation("Query parameter 'q' is required".to_string()))?;

    let pattern = store::like_pattern(term);

    let project_rows = store::search_projects(conn, &pattern).await?;
    let projects = projects::to_views(conn, project_rows).await?;
    let work_experience = store::search_work_experience(conn, &pattern).await?;

    tracing::debug!(
        query = term,
        projects = projects.len(),
        work = work_experience.len(),
        "search complete"
    );

    Ok(SearchResults {
        projects,
        work_experience,
    })
}
