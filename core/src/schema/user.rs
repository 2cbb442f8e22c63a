use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Asset, Link, NameStyle, Names};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub names: Names,
    #[serde(rename = "supporterAnimation", default)]
    pub supporter_animation: bool,
    #[serde(default)]
    pub pronouns: Option<String>,
    pub weblink: String,
    #[serde(rename = "name-style")]
    pub name_style: NameStyle,
    pub role: String,
    #[serde(default)]
    pub signup: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub twitch: Option<Social>,
    #[serde(default)]
    pub hitbox: Option<Social>,
    #[serde(default)]
    pub youtube: Option<Social>,
    #[serde(default)]
    pub twitter: Option<Social>,
    #[serde(default)]
    pub speedrunslive: Option<Social>,
    pub assets: UserAssets,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl User {
    /// Display name, falling back to `"unknown"` when the API sends an empty one.
    pub fn name(&self) -> &str {
        if self.names.international.is_empty() {
            "unknown"
        } else {
            &self.names.international
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub country: Option<Place>,
    #[serde(default)]
    pub region: Option<Place>,
}

/// A country or region, identified by its code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub code: String,
    pub names: Names,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social {
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAssets {
    #[serde(default)]
    pub icon: Asset,
    #[serde(rename = "supporterIcon", default)]
    pub supporter_icon: Option<Asset>,
    #[serde(default)]
    pub image: Asset,
}

/// An unregistered player, referenced by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub name: String,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A run participant as referenced from a run, keyed by `rel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rel", rename_all = "lowercase")]
pub enum PlayerRef {
    User { id: String, uri: String },
    Guest { name: String, uri: String },
}

/// A run participant inlined by `embed=players`, keyed by `rel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rel", rename_all = "lowercase")]
pub enum EmbeddedPlayer {
    User(Box<User>),
    Guest(Guest),
}

impl EmbeddedPlayer {
    pub fn name(&self) -> &str {
        match self {
            EmbeddedPlayer::User(user) => user.name(),
            EmbeddedPlayer::Guest(guest) => &guest.name,
        }
    }
}
