//! # Portfolio API
//!
//! A personal portfolio service: one profile plus its skills, links,
//! projects and work history, stored in SQLite and served as JSON over HTTP.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────┐   ┌──────────┐
//! │   HTTP   │──▶│ profile / projects / │──▶│  store   │──▶ SQLite
//! │ (server) │   │ search / skills      │   │ (queries)│
//! └──────────┘   └──────────────────────┘   └──────────┘
//!       ▲
//!  rate_limit on every route, auth + write quota on writes
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! portfolio init                # create database
//! portfolio seed                # load the sample portfolio
//! portfolio profile             # print the aggregated profile
//! portfolio serve               # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error type and HTTP error bodies |
//! | [`models`] | Row and view types |
//! | [`pagination`] | Page parameters and envelopes |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`store`] | Parameterized queries |
//! | [`profile`] | Profile aggregation and writes |
//! | [`projects`] | Skill-filtered, paginated project listing |
//! | [`search`] | Substring search |
//! | [`skills`] | Top skills |
//! | [`seed`] | Dataset seeding |
//! | [`auth`] | HTTP Basic gate for writes |
//! | [`rate_limit`] | Per-client rate limiting |
//! | [`server`] | HTTP server |

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod migrate;
pub mod models;
pub mod pagination;
pub mod profile;
pub mod projects;
pub mod rate_limit;
pub mod search;
pub mod seed;
pub mod server;
pub mod skills;
pub mod store;
