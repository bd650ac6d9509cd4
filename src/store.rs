//! Parameterized reads and writes against the schema.
//!
//! Every function borrows a single connection, so callers decide the scope:
//! a pooled connection held for one request, or a transaction spanning
//! several statements. Nothing here holds state between calls.

use sqlx::SqliteConnection;

use crate::models::{Link, Profile, Project, ProjectSkill, Skill, WorkExperience, PROFILE_ID};

type Result<T> = std::result::Result<T, sqlx::Error>;

/// Subquery selecting ids of projects with at least one skill matching a
/// LIKE pattern. Using `IN` keeps each project at most once regardless of
/// how many of its skills match.
const PROJECTS_WITH_SKILL: &str = r"
    SELECT ps.project_id
    FROM project_skills ps
    JOIN skills s ON s.id = ps.skill_id
    WHERE s.name LIKE ? ESCAPE '\'
";

/// Turn a user-supplied term into a case-insensitive containment pattern.
///
/// `%`, `_` and the escape character itself match literally.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

// ============ Profile ============

pub async fn fetch_profile(conn: &mut SqliteConnection) -> Result<Option<Profile>> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, name, email, education FROM profile ORDER BY id LIMIT 1",
    )
    .fetch_optional(&mut *conn)
    .await
}

pub async fn delete_profiles(conn: &mut SqliteConnection) -> Result<u64> {
    let done = sqlx::query("DELETE FROM profile")
        .execute(&mut *conn)
        .await?;
    Ok(done.rows_affected())
}

pub async fn insert_profile(
    conn: &mut SqliteConnection,
    name: &str,
    email: &str,
    education: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO profile (id, name, email, education) VALUES (?, ?, ?, ?)")
        .bind(PROFILE_ID)
        .bind(name)
        .bind(email)
        .bind(education)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Update the singleton row in place. `None` leaves a column untouched.
/// Returns the number of rows changed (0 when no profile exists).
pub async fn update_profile(
    conn: &mut SqliteConnection,
    name: &str,
    email: Option<&str>,
    education: Option<&str>,
) -> Result<u64> {
    let done = sqlx::query(
        "UPDATE profile \
         SET name = ?, email = COALESCE(?, email), education = COALESCE(?, education) \
         WHERE id = ?",
    )
    .bind(name)
    .bind(email)
    .bind(education)
    .bind(PROFILE_ID)
    .execute(&mut *conn)
    .await?;
    Ok(done.rows_affected())
}

// ============ Skills ============

/// Skills in insertion order, optionally capped at `limit`.
pub async fn fetch_skills(conn: &mut SqliteConnection, limit: Option<i64>) -> Result<Vec<Skill>> {
    // SQLite treats a negative LIMIT as "no limit".
    sqlx::query_as::<_, Skill>("SELECT id, name FROM skills ORDER BY id LIMIT ?")
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *conn)
        .await
}

pub async fn insert_skill(conn: &mut SqliteConnection, name: &str) -> Result<i64> {
    let done = sqlx::query("INSERT INTO skills (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;
    Ok(done.last_insert_rowid())
}

pub async fn fetch_project_skill_names(
    conn: &mut SqliteConnection,
    project_id: i64,
) -> Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT s.name FROM skills s \
         JOIN project_skills ps ON s.id = ps.skill_id \
         WHERE ps.project_id = ? \
         ORDER BY s.id",
    )
    .bind(project_id)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_project_skill(conn: &mut SqliteConnection, link: ProjectSkill) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO project_skills (project_id, skill_id) VALUES (?, ?)")
        .bind(link.project_id)
        .bind(link.skill_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ============ Links ============

pub async fn fetch_links(conn: &mut SqliteConnection) -> Result<Vec<Link>> {
    sqlx::query_as::<_, Link>("SELECT name, url FROM links ORDER BY name")
        .fetch_all(&mut *conn)
        .await
}

pub async fn insert_link(conn: &mut SqliteConnection, name: &str, url: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO links (name, url) VALUES (?, ?)")
        .bind(name)
        .bind(url)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// ============ Projects ============

pub async fn fetch_all_projects(conn: &mut SqliteConnection) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>("SELECT id, title, description, links FROM projects ORDER BY id")
        .fetch_all(&mut *conn)
        .await
}

/// Count projects, optionally restricted to those with a skill matching `skill_pattern`.
pub async fn count_projects(
    conn: &mut SqliteConnection,
    skill_pattern: Option<&str>,
) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM projects WHERE (? IS NULL OR id IN ({}))",
        PROJECTS_WITH_SKILL
    );
    sqlx::query_scalar(&sql)
        .bind(skill_pattern)
        .bind(skill_pattern)
        .fetch_one(&mut *conn)
        .await
}

/// One window of projects ordered by id, optionally skill-filtered.
pub async fn fetch_projects_window(
    conn: &mut SqliteConnection,
    skill_pattern: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Project>> {
    let sql = format!(
        "SELECT id, title, description, links FROM projects \
         WHERE (? IS NULL OR id IN ({})) \
         ORDER BY id LIMIT ? OFFSET ?",
        PROJECTS_WITH_SKILL
    );
    sqlx::query_as::<_, Project>(&sql)
        .bind(skill_pattern)
        .bind(skill_pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await
}

pub async fn search_projects(conn: &mut SqliteConnection, pattern: &str) -> Result<Vec<Project>> {
    sqlx::query_as::<_, Project>(
        r"SELECT id, title, description, links FROM projects
          WHERE title LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\'
          ORDER BY id",
    )
    .bind(pattern)
    .bind(pattern)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_project(
    conn: &mut SqliteConnection,
    title: &str,
    description: &str,
    links_json: &str,
) -> Result<i64> {
    let done = sqlx::query("INSERT INTO projects (title, description, links) VALUES (?, ?, ?)")
        .bind(title)
        .bind(description)
        .bind(links_json)
        .execute(&mut *conn)
        .await?;
    Ok(done.last_insert_rowid())
}

// ============ Work experience ============

pub async fn fetch_work_experience(conn: &mut SqliteConnection) -> Result<Vec<WorkExperience>> {
    sqlx::query_as::<_, WorkExperience>(
        "SELECT id, company, role, duration, description FROM work_experience ORDER BY id",
    )
    .fetch_all(&mut *conn)
    .await
}

pub async fn search_work_experience(
    conn: &mut SqliteConnection,
    pattern: &str,
) -> Result<Vec<WorkExperience>> {
    sqlx::query_as::<_, WorkExperience>(
        r"SELECT id, company, role, duration, description FROM work_experience
          WHERE role LIKE ? ESCAPE '\' OR description LIKE ? ESCAPE '\'
          ORDER BY id",
    )
    .bind(pattern)
    .bind(pattern)
    .fetch_all(&mut *conn)
    .await
}

pub async fn insert_work_experience(
    conn: &mut SqliteConnection,
    work: &WorkExperience,
) -> Result<i64> {
    let done = sqlx::query(
        "INSERT INTO work_experience (company, role, duration, description) VALUES (?, ?, ?, ?)",
    )
    .bind(&work.company)
    .bind(&work.role)
    .bind(&work.duration)
    .bind(&work.description)
    .execute(&mut *conn)
    .await?;
    Ok(done.last_insert_rowid())
}

// ============ Maintenance ============

/// Delete every row from all six tables and reset their id counters.
pub async fn clear_all(conn: &mut SqliteConnection) -> Result<()> {
    // Join table first so foreign keys never dangle mid-clear.
    for table in [
        "project_skills",
        "profile",
        "skills",
        "links",
        "projects",
        "work_experience",
    ] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *conn)
            .await?;
    }

    let has_sequence: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='sqlite_sequence'",
    )
    .fetch_one(&mut *conn)
    .await?;

    if has_sequence {
        sqlx::query("DELETE FROM sqlite_sequence")
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
