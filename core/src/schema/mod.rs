//! Typed records for the speedrun.com API.
//!
//! # Design
//! Records mirror the upstream JSON and are decoded with serde. Unknown
//! fields are ignored so the upstream contract can grow without breaking
//! decoding; missing required fields and unknown discriminator values are
//! errors. Tagged unions (`RunStatus`, `PlayerRef`, `EmbeddedPlayer`,
//! `NameStyle`, `VariableScope`) use serde's internally tagged enums.

pub mod common;
pub mod envelope;
pub mod game;
pub mod leaderboard;
pub mod params;
pub mod run;
pub mod user;
pub mod variable;

pub use common::{
    Asset, Color, Direction, Embedded, Link, MaybeEmbedded, NameStyle, NamedEntity, Names,
    TimingMethod, Uri,
};
pub use envelope::{Envelope, Pagination};
pub use game::{
    Category, CategoryPlayers, CategoryType, Game, GameAssets, GameNames, Level, PlayerCount,
    Ruleset,
};
pub use leaderboard::{Leaderboard, LeaderboardEntry, PersonalBest};
pub use params::{
    GamesParams, LeaderboardParams, PersonalBestsParams, QueryParams, RunOrder, RunStatusFilter,
    RunsParams, UsersParams,
};
pub use run::{
    EmbeddedEntity, EmbeddedLevel, NewRun, NewRunPlayer, NewRunTimes, NewRunValue, Run, RunStatus,
    System, Times, Videos,
};
pub use user::{EmbeddedPlayer, Guest, Location, Place, PlayerRef, Social, User, UserAssets};
pub use variable::{ValueFlags, Variable, VariableScope, VariableValue, VariableValues};

/// Element-lenient list decoding: entries that fail to decode are dropped.
pub mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::debug;

    pub fn decode<T: DeserializeOwned>(values: Vec<Value>) -> Vec<T> {
        values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(item) => Some(item),
                Err(err) => {
                    debug!(index, error = %err, "dropping malformed list entry");
                    None
                }
            })
            .collect()
    }

    /// `deserialize_with` adapter for [`decode`].
    pub fn vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Vec::<Value>::deserialize(deserializer).map(decode)
    }
}
