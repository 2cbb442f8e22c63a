use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::{Embedded, Link, MaybeEmbedded, NamedEntity, TimingMethod};
use super::game::{Category, Game};
use super::lenient;
use super::run::{EmbeddedLevel, Run};
use super::user::EmbeddedPlayer;
use super::variable::Variable;

/// A ranked leaderboard for one game/category (and optionally level).
///
/// Entries that do not decode are dropped instead of failing the whole
/// board; see [`lenient`](super::lenient).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Leaderboard {
    pub weblink: String,
    pub game: MaybeEmbedded<String, Box<Game>>,
    pub category: MaybeEmbedded<String, Box<Category>>,
    #[serde(default)]
    pub level: Option<MaybeEmbedded<String, EmbeddedLevel>>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub emulators: Option<bool>,
    pub video_only: bool,
    #[serde(default)]
    pub timing: Option<TimingMethod>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(deserialize_with = "lenient::vec")]
    pub runs: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub players: Option<Embedded<Vec<EmbeddedPlayer>>>,
    #[serde(default)]
    pub regions: Option<Embedded<Vec<NamedEntity>>>,
    #[serde(default)]
    pub platforms: Option<Embedded<Vec<NamedEntity>>>,
    #[serde(default)]
    pub variables: Option<Embedded<Vec<Variable>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub place: u32,
    pub run: Run,
}

/// One of a user's personal bests; `place` is the run's leaderboard rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBest {
    pub place: u32,
    pub run: Run,
}
