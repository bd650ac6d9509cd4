//! Project listing: optional skill filter, always paginated.
//!
//! Every project is returned as a [`ProjectView`] with its stored links
//! decoded and its skill names fetched per project.

use serde::Deserialize;
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

use crate::config::PaginationConfig;
use crate::error::Result;
use crate::models::{Project, ProjectView};
use crate::pagination::{Page, Pagination};
use crate::store;

/// Query parameters accepted by the projects listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectQuery {
    /// Case-insensitive skill substring. Blank values are ignored.
    pub skill: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List one page of projects, restricted to those tagged with a matching
/// skill when `query.skill` is set. Pages past the end come back empty.
pub async fn list_projects(
    conn: &mut SqliteConnection,
    query: &ProjectQuery,
    cfg: &PaginationConfig,
) -> Result<Page<ProjectView>> {
    let pagination = Pagination::from_params(query.page, query.per_page, cfg)?;

    let skill_pattern = query
        .skill
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(store::like_pattern);

    let total = store::count_projects(conn, skill_pattern.as_deref()).await?;
    let rows = store::fetch_projects_window(
        conn,
        skill_pattern.as_deref(),
        pagination.limit(),
        pagination.offset(),
    )
    .await?;

    let items = to_views(conn, rows).await?;

    tracing::debug!(
        page = pagination.page,
        per_page = pagination.per_page,
        total,
        skill = ?query.skill,
        "listed projects"
    );

    Ok(Page::new(pagination, total.max(0) as u64, items))
}

/// Attach skills and decoded links to a batch of project rows.
pub async fn to_views(conn: &mut SqliteConnection, rows: Vec<Project>) -> Result<Vec<ProjectView>> {
    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        let skills = store::fetch_project_skill_names(conn, row.id).await?;
        let links = decode_links(row.id, &row.links);
        views.push(ProjectView {
            id: row.id,
            title: row.title,
            description: row.description,
            links,
            skills,
        });
    }
    Ok(views)
}

/// Decode the stored `label -> URL` map. Malformed JSON yields an empty map.
pub fn decode_links(project_id: i64, raw: &str) -> BTreeMap<String, String> {
    if raw.trim().is_empty() {
        return BTreeMap::new();
    }
    match serde_json::from_str(raw) {
        Ok(links) => links,
        Err(e) => {
            tracing::warn!(project_id, "ignoring malformed project links: {}", e);
            BTreeMap::new()
        }
    }
}
