//! Dataset seeding.
//!
//! Replaces the contents of all six tables with a [`SeedData`] set, either
//! the built-in sample or one read from a TOML file:
//!
//! ```toml
//! skills = ["Rust", "SQL"]
//!
//! [profile]
//! name = "Ada Lovelace"
//! email = "ada@example.com"
//! education = "Mathematics"
//!
//! [links]
//! github = "https://github.com/ada"
//!
//! [[projects]]
//! title = "Engine"
//! description = "Analytical engine notes"
//! skills = ["Rust"]
//! links = { github = "https://github.com/ada/engine" }
//!
//! [[work_experience]]
//! company = "Babbage & Co"
//! role = "Analyst"
//! duration = "1842 - 1843"
//! description = "Wrote the first program."
//! ```

use anyhow::Context;
use serde::Deserialize;
use sqlx::{Connection, SqliteConnection};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::error::{Error, Result};
use crate::migrate;
use crate::models::{ProjectSkill, WorkExperience};
use crate::store;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    pub profile: SeedProfile,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    #[serde(default)]
    pub projects: Vec<SeedProject>,
    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProfile {
    pub name: String,
    pub email: String,
    pub education: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedProject {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    /// Names of skills from [`SeedData::skills`] this project is tagged with.
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Row counts written by [`seed_database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub skills: usize,
    pub links: usize,
    pub projects: usize,
    pub project_skills: usize,
    pub work_experience: usize,
}

impl SeedData {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse seed file")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// The built-in sample portfolio.
    pub fn sample() -> Self {
        let links = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let names = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };

        Self {
            profile: SeedProfile {
                name: "Gaurav Kalyankar".to_string(),
                email: "gauravkalyankar844@gmail.com".to_string(),
                education: "B.Tech in Information Technology".to_string(),
            },
            skills: names(&[
                "Python",
                "JavaScript",
                "React",
                "Node.js",
                "Flask",
                "PostgreSQL",
                "MongoDB",
                "Docker",
                "AWS",
            ]),
            links: links(&[
                ("github", "https://github.com/gauravkalyankare"),
                ("linkedin", "https://www.linkedin.com/in/gaurav-k-859404253/"),
            ]),
            projects: vec![
                SeedProject {
                    title: "E-commerce Analytics Dashboard".to_string(),
                    description: "A web-based dashboard for visualizing sales data, customer \
                        behavior, and inventory metrics. Built with React for the frontend and \
                        a Node.js/Express backend."
                        .to_string(),
                    links: links(&[
                        ("github", "https://github.com/alexdoe/ecom-dashboard"),
                        ("live", "https://ecom-dash.alexdoe.com"),
                    ]),
                    skills: names(&["React", "Node.js", "MongoDB"]),
                },
                SeedProject {
                    title: "Flask API for IoT Devices".to_string(),
                    description: "A RESTful API to collect, store, and process sensor data from \
                        a network of IoT devices. Deployed on AWS using Docker containers."
                        .to_string(),
                    links: links(&[("github", "https://github.com/alexdoe/iot-api")]),
                    skills: names(&["Python", "Flask", "PostgreSQL", "Docker", "AWS"]),
                },
            ],
            work_experience: vec![
                WorkExperience {
                    id: 0,
                    company: "Tech Solutions Inc.".to_string(),
                    role: "Senior Software Engineer".to_string(),
                    duration: "2020 - Present".to_string(),
                    description: "Led the development of a cloud-native platform. Mentored \
                        junior engineers and improved CI/CD pipeline efficiency by 30%."
                        .to_string(),
                },
                WorkExperience {
                    id: 0,
                    company: "Web Crafters LLC".to_string(),
                    role: "Full-Stack Developer".to_string(),
                    duration: "2018 - 2020".to_string(),
                    description: "Developed and maintained client websites and web applications \
                        using the MERN stack. Collaborated with designers to create responsive \
                        and user-friendly interfaces."
                        .to_string(),
                },
            ],
        }
    }
}

/// Replace all data with `data` in a single transaction.
///
/// A project that names a skill missing from `data.skills` aborts the seed
/// and leaves the database untouched.
pub async fn seed_database(conn: &mut SqliteConnection, data: &SeedData) -> Result<SeedSummary> {
    let mut tx = conn.begin().await?;
    let mut summary = SeedSummary::default();

    store::clear_all(&mut *tx).await?;

    store::insert_profile(
        &mut *tx,
        &data.profile.name,
        &data.profile.email,
        &data.profile.education,
    )
    .await?;

    let mut skill_ids: HashMap<&str, i64> = HashMap::new();
    for skill in &data.skills {
        if skill_ids.contains_key(skill.as_str()) {
            continue;
        }
        let id = store::insert_skill(&mut *tx, skill).await?;
        skill_ids.insert(skill.as_str(), id);
        summary.skills += 1;
    }

    for (name, url) in &data.links {
        store::insert_link(&mut *tx, name, url).await?;
        summary.links += 1;
    }

    for project in &data.projects {
        let links_json = serde_json::to_string(&project.links)
            .map_err(|e| Error::Internal(format!("encoding project links: {}", e)))?;
        let project_id =
            store::insert_project(&mut *tx, &project.title, &project.description, &links_json)
                .await?;
        summary.projects += 1;

        for skill in &project.skills {
            let skill_id = skill_ids.get(skill.as_str()).copied().ok_or_else(|| {
                Error::Validation(format!(
                    "project '{}' references unknown skill '{}'",
                    project.title, skill
                ))
            })?;
            store::insert_project_skill(
                &mut *tx,
                ProjectSkill {
                    project_id,
                    skill_id,
                },
            )
            .await?;
            summary.project_skills += 1;
        }
    }

    for work in &data.work_experience {
        store::insert_work_experience(&mut *tx, work).await?;
        summary.work_experience += 1;
    }

    tx.commit().await?;
    Ok(summary)
}

/// CLI entry point: apply the schema, seed, and print a summary.
pub async fn run_seed(config: &Config, file: Option<&Path>) -> anyhow::Result<()> {
    let data = match file {
        Some(path) => SeedData::load(path)?,
        None => SeedData::sample(),
    };

    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;

    let mut conn = pool.acquire().await?;
    let summary = seed_database(&mut conn, &data)
        .await
        .context("Failed to seed database")?;
    drop(conn);
    pool.close().await;

    println!(
        "Database seeded with {} data.",
        if file.is_some() { "file" } else { "sample" }
    );
    println!("  profile:          {}", data.profile.name);
    println!("  skills:           {}", summary.skills);
    println!("  links:            {}", summary.links);
    println!("  projects:         {}", summary.projects);
    println!("  project skills:   {}", summary.project_skills);
    println!("  work experience:  {}", summary.work_experience);

    Ok(())
}
