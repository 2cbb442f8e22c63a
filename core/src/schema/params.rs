//! Typed parameter records, one per filterable endpoint.
//!
//! Each record serializes to the wire names the endpoint accepts; unset
//! fields are skipped. Apply one to a query with
//! [`Query::params`](crate::Query::params), which runs every field through
//! the same validation as [`Query::filter`](crate::Query::filter).

use std::collections::BTreeMap;

use serde::Serialize;

use super::common::{Direction, TimingMethod};

/// A parameter record that can be applied to a [`Query`](crate::Query).
pub trait QueryParams: Serialize {
    /// Variable filters (`variable id -> value id`), sent as `var-<id>`.
    fn variables(&self) -> Option<&BTreeMap<String, String>> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GamesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gametype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub romhack: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl QueryParams for GamesParams {}

/// `lookup` disables every other filter on the server side.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsersParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hitbox: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speedrunslive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderby: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl QueryParams for UsersParams {}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonalBestsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
}

impl QueryParams for PersonalBestsParams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatusFilter {
    New,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunOrder {
    Game,
    Category,
    Level,
    Platform,
    Region,
    Emulated,
    Date,
    Submitted,
    Status,
    VerifyDate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examiner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emulated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatusFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderby: Option<RunOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip)]
    pub variables: BTreeMap<String, String>,
}

impl QueryParams for RunsParams {
    fn variables(&self) -> Option<&BTreeMap<String, String>> {
        Some(&self.variables)
    }
}

/// Filters for full-game and level leaderboards. `game`, `category` (and
/// `level` for level boards) end up in the path, not the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LeaderboardParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emulators: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingMethod>,
    /// Show the board as it was on this date (`YYYY-MM-DD` or RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip)]
    pub variables: BTreeMap<String, String>,
}

impl QueryParams for LeaderboardParams {
    fn variables(&self) -> Option<&BTreeMap<String, String>> {
        Some(&self.variables)
    }
}
