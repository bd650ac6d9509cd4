//! Top skills: a fixed-size prefix of skills in insertion order.
//!
//! Insertion order stands in for importance; there is no ranking.

use sqlx::SqliteConnection;

use crate::error::Result;
use crate::store;

/// Number of skills returned by [`top_skills`].
pub const TOP_SKILLS_LIMIT: i64 = 5;

pub async fn top_skills(conn: &mut SqliteConnection) -> Result<Vec<String>> {
    let skills = store::fetch_skills(conn, Some(TOP_SKILLS_LIMIT)).await?;
    Ok(skills.into_iter().map(|s| s.name).collect())
}
