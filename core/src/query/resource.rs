//! Resource families and their request contracts.
//!
//! Each resource is a zero-sized marker type. Its trait impls fix, at compile
//! time, which parameters a [`Query`](super::Query) accepts, which
//! sub-resources it may embed, where it lives, and how its payload decodes.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::schema::{
    lenient, Category, Game, Leaderboard, PersonalBest, Run, User, Variable,
};

/// Type a filter value is coerced to before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Str,
    Int,
    Bool,
}

/// A resource family with an accepted-parameter contract.
pub trait Resource {
    /// Name used in error messages.
    const NAME: &'static str;
    /// Filter names this resource accepts. Names that appear as `{name}` in a
    /// path template are substituted into the path instead of the query.
    const PARAMS: &'static [(&'static str, ParamKind)];
    /// Whether `var-<id>` variable filters are accepted.
    const ACCEPTS_VARIABLES: bool = false;

    type Record: DeserializeOwned;
}

/// A resource with a collection endpoint, fetched with `Query::all`.
pub trait Collection: Resource {
    /// Path template relative to the base URL, e.g. `users/{user}/personal-bests`.
    const PATH: &'static str;

    type Output;

    fn decode(data: Value) -> Result<Self::Output, ApiError>;
}

/// A resource addressable by id, fetched with `Query::get`.
pub trait Identified: Resource {
    /// Path the id is appended to.
    const ITEM_PATH: &'static str;
}

/// A resource that supports `embed`.
pub trait Embeddable: Resource {
    const EMBEDS: &'static [&'static str];
}

pub(crate) fn decode_record<T: DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Decode every element or fail on the first bad one.
fn decode_strict<T: DeserializeOwned>(data: Value) -> Result<Vec<T>, ApiError> {
    decode_record(data)
}

fn decode_lenient<T: DeserializeOwned>(data: Value) -> Result<Vec<T>, ApiError> {
    let values: Vec<Value> = decode_record(data)?;
    Ok(lenient::decode(values))
}

const EMBED_RUN_CONTEXT: &[&str] = &["game", "category", "level", "players", "region", "platform"];
const EMBED_LEADERBOARD: &[&str] = &[
    "game",
    "category",
    "level",
    "players",
    "regions",
    "platforms",
    "variables",
];
const PARAMS_PAGED: &[(&str, ParamKind)] = &[
    ("orderby", ParamKind::Str),
    ("direction", ParamKind::Str),
    ("max", ParamKind::Int),
    ("offset", ParamKind::Int),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Games;

impl Resource for Games {
    const NAME: &'static str = "Games";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("name", ParamKind::Str),
        ("abbreviation", ParamKind::Str),
        ("released", ParamKind::Int),
        ("gametype", ParamKind::Str),
        ("platform", ParamKind::Str),
        ("region", ParamKind::Str),
        ("genre", ParamKind::Str),
        ("engine", ParamKind::Str),
        ("developer", ParamKind::Str),
        ("publisher", ParamKind::Str),
        ("moderator", ParamKind::Str),
        ("romhack", ParamKind::Bool),
        ("bulk", ParamKind::Bool),
        PARAMS_PAGED[0],
        PARAMS_PAGED[1],
        PARAMS_PAGED[2],
        PARAMS_PAGED[3],
    ];
    type Record = Game;
}

impl Collection for Games {
    const PATH: &'static str = "games";
    type Output = Vec<Game>;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_strict(data)
    }
}

impl Identified for Games {
    const ITEM_PATH: &'static str = "games";
}

impl Embeddable for Games {
    const EMBEDS: &'static [&'static str] = &[
        "levels",
        "categories",
        "moderators",
        "gametypes",
        "platforms",
        "regions",
        "genres",
        "engines",
        "developers",
        "publishers",
        "variables",
    ];
}

/// Categories of one game: `games/{game}/categories`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameCategories;

impl Resource for GameCategories {
    const NAME: &'static str = "GameCategories";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("game", ParamKind::Str),
        ("miscellaneous", ParamKind::Bool),
        ("orderby", ParamKind::Str),
        ("direction", ParamKind::Str),
    ];
    type Record = Category;
}

impl Collection for GameCategories {
    const PATH: &'static str = "games/{game}/categories";
    type Output = Vec<Category>;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_strict(data)
    }
}

impl Embeddable for GameCategories {
    const EMBEDS: &'static [&'static str] = &["game", "variables"];
}

/// Variables of one game: `games/{game}/variables`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameVariables;

impl Resource for GameVariables {
    const NAME: &'static str = "GameVariables";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("game", ParamKind::Str),
        ("orderby", ParamKind::Str),
        ("direction", ParamKind::Str),
    ];
    type Record = Variable;
}

impl Collection for GameVariables {
    const PATH: &'static str = "games/{game}/variables";
    type Output = Vec<Variable>;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_strict(data)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Categories;

impl Resource for Categories {
    const NAME: &'static str = "Categories";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[];
    type Record = Category;
}

impl Identified for Categories {
    const ITEM_PATH: &'static str = "categories";
}

impl Embeddable for Categories {
    const EMBEDS: &'static [&'static str] = &["game", "variables"];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Variables;

impl Resource for Variables {
    const NAME: &'static str = "Variables";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[];
    type Record = Variable;
}

impl Identified for Variables {
    const ITEM_PATH: &'static str = "variables";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Users;

impl Resource for Users {
    const NAME: &'static str = "Users";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("lookup", ParamKind::Str),
        ("name", ParamKind::Str),
        ("twitch", ParamKind::Str),
        ("hitbox", ParamKind::Str),
        ("twitter", ParamKind::Str),
        ("speedrunslive", ParamKind::Str),
        PARAMS_PAGED[0],
        PARAMS_PAGED[1],
        PARAMS_PAGED[2],
        PARAMS_PAGED[3],
    ];
    type Record = User;
}

impl Collection for Users {
    const PATH: &'static str = "users";
    type Output = Vec<User>;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_strict(data)
    }
}

impl Identified for Users {
    const ITEM_PATH: &'static str = "users";
}

/// Personal bests of one user: `users/{user}/personal-bests`.
///
/// Malformed entries are dropped rather than failing the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersonalBests;

impl Resource for PersonalBests {
    const NAME: &'static str = "PersonalBests";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("user", ParamKind::Str),
        ("top", ParamKind::Int),
        ("series", ParamKind::Str),
        ("game", ParamKind::Str),
    ];
    type Record = PersonalBest;
}

impl Collection for PersonalBests {
    const PATH: &'static str = "users/{user}/personal-bests";
    type Output = Vec<PersonalBest>;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_lenient(data)
    }
}

impl Embeddable for PersonalBests {
    const EMBEDS: &'static [&'static str] = EMBED_RUN_CONTEXT;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Runs;

impl Resource for Runs {
    const NAME: &'static str = "Runs";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("user", ParamKind::Str),
        ("guest", ParamKind::Str),
        ("examiner", ParamKind::Str),
        ("game", ParamKind::Str),
        ("level", ParamKind::Str),
        ("category", ParamKind::Str),
        ("platform", ParamKind::Str),
        ("region", ParamKind::Str),
        ("emulated", ParamKind::Bool),
        ("status", ParamKind::Str),
        PARAMS_PAGED[0],
        PARAMS_PAGED[1],
        PARAMS_PAGED[2],
        PARAMS_PAGED[3],
    ];
    const ACCEPTS_VARIABLES: bool = true;
    type Record = Run;
}

impl Collection for Runs {
    const PATH: &'static str = "runs";
    type Output = Vec<Run>;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_strict(data)
    }
}

impl Identified for Runs {
    const ITEM_PATH: &'static str = "runs";
}

impl Embeddable for Runs {
    const EMBEDS: &'static [&'static str] = &[
        "game",
        "category",
        "level",
        "players",
        "region",
        "platform",
        "variables",
    ];
}

/// Full-game leaderboard: `leaderboards/{game}/category/{category}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Leaderboards;

const LEADERBOARD_FILTERS: [(&str, ParamKind); 7] = [
    ("top", ParamKind::Int),
    ("platform", ParamKind::Str),
    ("region", ParamKind::Str),
    ("emulators", ParamKind::Bool),
    ("video-only", ParamKind::Bool),
    ("timing", ParamKind::Str),
    ("date", ParamKind::Str),
];

impl Resource for Leaderboards {
    const NAME: &'static str = "Leaderboards";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("game", ParamKind::Str),
        ("category", ParamKind::Str),
        LEADERBOARD_FILTERS[0],
        LEADERBOARD_FILTERS[1],
        LEADERBOARD_FILTERS[2],
        LEADERBOARD_FILTERS[3],
        LEADERBOARD_FILTERS[4],
        LEADERBOARD_FILTERS[5],
        LEADERBOARD_FILTERS[6],
    ];
    const ACCEPTS_VARIABLES: bool = true;
    type Record = Leaderboard;
}

impl Collection for Leaderboards {
    const PATH: &'static str = "leaderboards/{game}/category/{category}";
    type Output = Leaderboard;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_record(data)
    }
}

impl Embeddable for Leaderboards {
    const EMBEDS: &'static [&'static str] = EMBED_LEADERBOARD;
}

/// Individual-level leaderboard: `leaderboards/{game}/level/{level}/{category}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelLeaderboards;

impl Resource for LevelLeaderboards {
    const NAME: &'static str = "LevelLeaderboards";
    const PARAMS: &'static [(&'static str, ParamKind)] = &[
        ("game", ParamKind::Str),
        ("level", ParamKind::Str),
        ("category", ParamKind::Str),
        LEADERBOARD_FILTERS[0],
        LEADERBOARD_FILTERS[1],
        LEADERBOARD_FILTERS[2],
        LEADERBOARD_FILTERS[3],
        LEADERBOARD_FILTERS[4],
        LEADERBOARD_FILTERS[5],
        LEADERBOARD_FILTERS[6],
    ];
    const ACCEPTS_VARIABLES: bool = true;
    type Record = Leaderboard;
}

impl Collection for LevelLeaderboards {
    const PATH: &'static str = "leaderboards/{game}/level/{level}/{category}";
    type Output = Leaderboard;

    fn decode(data: Value) -> Result<Self::Output, ApiError> {
        decode_record(data)
    }
}

impl Embeddable for LevelLeaderboards {
    const EMBEDS: &'static [&'static str] = EMBED_LEADERBOARD;
}
