//! Profile aggregation and profile writes.
//!
//! The read path composes the singleton profile row with every skill, link,
//! project and work entry into one [`ProfileDocument`]. The write paths
//! either replace the profile wholesale (inside a transaction) or update the
//! fixed row in place with a single statement.

use sqlx::{Connection, SqliteConnection};
use std::collections::BTreeMap;

use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::models::{ProfileDocument, ProfileInput, WriteStatus};
use crate::projects;
use crate::store;

/// Assemble the full profile document.
pub async fn get_profile_document(conn: &mut SqliteConnection) -> Result<ProfileDocument> {
    let profile = store::fetch_profile(conn)
        .await?
        .ok_or_else(|| Error::NotFound("Profile not found".to_string()))?;

    let skills = store::fetch_skills(conn, None)
        .await?
        .into_iter()
        .map(|s| s.name)
        .collect();
    let links: BTreeMap<String, String> = store::fetch_links(conn)
        .await?
        .into_iter()
        .map(|l| (l.name, l.url))
        .collect();
    let project_rows = store::fetch_all_projects(conn).await?;
    let projects = projects::to_views(conn, project_rows).await?;
    let work_experience = store::fetch_work_experience(conn).await?;

    Ok(ProfileDocument {
        name: profile.name,
        email: profile.email,
        education: profile.education,
        skills,
        links,
        projects,
        work_experience,
    })
}

/// Replace the profile: delete whatever exists, insert the new row.
///
/// `name`, `email` and `education` are all required.
pub async fn replace_profile(
    conn: &mut SqliteConnection,
    input: &ProfileInput,
) -> Result<WriteStatus> {
    let name = present(input.name.as_deref());
    let email = present(input.email.as_deref());
    let education = present(input.education.as_deref());

    let (name, email, education) = match (name, email, education) {
        (Some(n), Some(e), Some(ed)) => (n, e, ed),
        _ => {
            let missing: Vec<&str> = [
                ("name", name),
                ("email", email),
                ("education", education),
            ]
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(field, _)| *field)
            .collect();
            return Err(Error::Validation(format!(
                "Missing required field(s): {}",
                missing.join(", ")
            )));
        }
    };

    let mut tx = conn.begin().await?;
    store::delete_profiles(&mut *tx).await?;
    store::insert_profile(&mut *tx, name, email, education).await?;
    tx.commit().await?;

    tracing::info!("profile replaced");
    Ok(WriteStatus::success("Profile created"))
}

/// Update the profile in place.
///
/// `name` is required; `email` and `education` change only when supplied.
/// Fails with `NotFound` when there is no profile row to update.
pub async fn update_profile(
    conn: &mut SqliteConnection,
    input: &ProfileInput,
) -> Result<WriteStatus> {
    let name = present(input.name.as_deref())
        .ok_or_else(|| Error::Validation("Missing 'name' in request body".to_string()))?;

    let email = optional("email", input.email.as_deref())?;
    let education = optional("education", input.education.as_deref())?;

    let changed = store::update_profile(conn, name, email, education).await?;
    if changed == 0 {
        return Err(Error::NotFound("Profile not found".to_string()));
    }

    tracing::info!("Profile name updated to '{}' by an authorized user", name);
    Ok(WriteStatus::success(format!(
        "Profile name updated to {}",
        name
    )))
}

/// A present, non-blank field value, trimmed.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// An optional field that, when supplied, must not be blank.
fn optional<'a>(field: &str, value: Option<&'a str>) -> Result<Option<&'a str>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => {
            Err(Error::Validation(format!("'{}' must not be empty", field)))
        }
        Some(v) => Ok(Some(v.trim())),
    }
}

/// CLI entry point: print the aggregated profile document as JSON.
pub async fn run_profile(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;
    let document = get_profile_document(&mut conn).await;
    drop(conn);
    pool.close().await;

    let document = match document {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
