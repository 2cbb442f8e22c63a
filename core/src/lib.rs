//! Synchronous typed client for the speedrun.com REST API.
//!
//! # Overview
//! Queries are built per resource family (`Query<Games>`, `Query<Runs>`,
//! `Query<Leaderboards>`, ...), validated before anything is sent, rendered
//! into `HttpRequest` values and executed through a pluggable `Transport`.
//! Responses are decoded into the typed records of [`schema`].
//!
//! # Design
//! - `SpeedrunClient` holds no mutable state; it is passed explicitly to
//!   every terminal call, so tests can swap the transport for a fake.
//! - Request building (`build_*`) and response parsing (`parse_envelope`)
//!   are separate from the I/O step, so both halves are testable offline.
//! - Records are defined independently from the mock-server crate;
//!   integration tests catch schema drift.
//!
//! ```no_run
//! use speedrun_core::{Leaderboards, SpeedrunClient};
//!
//! let client = SpeedrunClient::from_env()?;
//! let board = client
//!     .query::<Leaderboards>()
//!     .filter("game", "o1y9okr6")?
//!     .filter("category", "zd3xmmvd")?
//!     .filter("top", 3)?
//!     .all(&client)?;
//! println!("{} entries", board.runs.len());
//! # Ok::<(), speedrun_core::ApiError>(())
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod facade;
pub mod http;
pub mod query;
pub mod schema;
pub mod transport;

pub use client::SpeedrunClient;
pub use config::{ClientConfig, RetryPolicy};
pub use error::ApiError;
pub use facade::VerifiedRuns;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{
    Categories, Collection, Embeddable, GameCategories, GameVariables, Games, Identified,
    Leaderboards, LevelLeaderboards, ParamKind, ParamValue, PersonalBests, Query, QueryOptions,
    Resource, Response, Runs, Users, Variables,
};
pub use schema::{
    Category, Game, Leaderboard, LeaderboardEntry, NewRun, PersonalBest, Run, RunStatus, User,
    Variable,
};
pub use transport::{Transport, UreqTransport};
