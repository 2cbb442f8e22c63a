use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Asset, Embedded, Link, MaybeEmbedded, NamedEntity, TimingMethod};
use super::user::User;
use super::variable::Variable;

/// A game as returned by `GET /games/{id}`.
///
/// Fields the API only fills when embedding (`levels`, `categories`,
/// `variables`) are `None` otherwise. Lookup lists such as `platforms` hold
/// ids unless the matching embed was requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: String,
    pub names: GameNames,
    #[serde(rename = "boostReceived", default)]
    pub boost_received: u64,
    #[serde(rename = "boostDistinctDonors", default)]
    pub boost_distinct_donors: u64,
    pub abbreviation: String,
    pub weblink: String,
    #[serde(default)]
    pub discord: Option<String>,
    pub released: i32,
    #[serde(rename = "release-date", default)]
    pub release_date: Option<NaiveDate>,
    pub ruleset: Ruleset,
    #[serde(default)]
    pub romhack: bool,
    #[serde(default)]
    pub gametypes: MaybeEmbedded<Vec<String>, Vec<NamedEntity>>,
    #[serde(default)]
    pub platforms: MaybeEmbedded<Vec<String>, Vec<NamedEntity>>,
    #[serde(default)]
    pub regions: MaybeEmbedded<Vec<String>, Vec<NamedEntity>>,
    #[serde(default)]
    pub genres: MaybeEmbedded<Vec<String>, Vec<NamedEntity>>,
    #[serde(default)]
    pub engines: MaybeEmbedded<Vec<String>, Vec<NamedEntity>>,
    #[serde(default)]
    pub developers: MaybeEmbedded<Vec<String>, Vec<NamedEntity>>,
    #[serde(default)]
    pub publishers: MaybeEmbedded<Vec<String>, Vec<NamedEntity>>,
    /// User id to moderator role, or the moderators themselves when embedded.
    #[serde(default)]
    pub moderators: MaybeEmbedded<BTreeMap<String, String>, Vec<User>>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    pub assets: GameAssets,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub levels: Option<Embedded<Vec<Level>>>,
    #[serde(default)]
    pub categories: Option<Embedded<Vec<Category>>>,
    #[serde(default)]
    pub variables: Option<Embedded<Vec<Variable>>>,
}

impl Game {
    pub fn icon_url(&self) -> Option<&str> {
        self.assets.icon.as_ref().and_then(|icon| icon.uri.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameNames {
    pub international: String,
    #[serde(default)]
    pub japanese: Option<String>,
    #[serde(default)]
    pub twitch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ruleset {
    pub show_milliseconds: bool,
    pub require_verification: bool,
    pub require_video: bool,
    pub run_times: Vec<TimingMethod>,
    pub default_time: TimingMethod,
    pub emulators_allowed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GameAssets {
    pub logo: Option<Asset>,
    pub cover_tiny: Option<Asset>,
    pub cover_small: Option<Asset>,
    pub cover_medium: Option<Asset>,
    pub cover_large: Option<Asset>,
    pub icon: Option<Asset>,
    #[serde(rename = "trophy-1st")]
    pub trophy_1st: Option<Asset>,
    #[serde(rename = "trophy-2nd")]
    pub trophy_2nd: Option<Asset>,
    #[serde(rename = "trophy-3rd")]
    pub trophy_3rd: Option<Asset>,
    #[serde(rename = "trophy-4th")]
    pub trophy_4th: Option<Asset>,
    pub background: Option<Asset>,
    pub foreground: Option<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub weblink: String,
    #[serde(rename = "type")]
    pub kind: CategoryType,
    #[serde(default)]
    pub rules: Option<String>,
    pub players: CategoryPlayers,
    #[serde(default)]
    pub miscellaneous: bool,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub game: Option<Embedded<Box<Game>>>,
    #[serde(default)]
    pub variables: Option<Embedded<Vec<Variable>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryType {
    PerGame,
    PerLevel,
}

/// How many players a run in a category has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPlayers {
    #[serde(rename = "type")]
    pub kind: PlayerCount,
    pub value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerCount {
    Exactly,
    UpTo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: String,
    pub name: String,
    pub weblink: String,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;

    use super::*;

    pub(crate) fn game_json() -> serde_json::Value {
        json!({
            "id": "o1y9okr6",
            "names": {"international": "Mock Odyssey", "japanese": null, "twitch": "Mock Odyssey"},
            "boostReceived": 0,
            "boostDistinctDonors": 0,
            "abbreviation": "mockodyssey",
            "weblink": "https://www.speedrun.com/mockodyssey",
            "discord": "",
            "released": 2017,
            "release-date": "2017-10-27",
            "ruleset": {
                "show-milliseconds": true,
                "require-verification": true,
                "require-video": true,
                "run-times": ["realtime", "ingame"],
                "default-time": "realtime",
                "emulators-allowed": false
            },
            "romhack": false,
            "gametypes": [],
            "platforms": ["7m6ylw9p"],
            "regions": [],
            "genres": [],
            "engines": [],
            "developers": [],
            "publishers": [],
            "moderators": {"816w31rx": "super-moderator"},
            "created": "2017-10-27T08:00:00Z",
            "assets": {
                "icon": {"uri": "https://www.speedrun.com/static/game/o1y9okr6/icon.png"},
                "cover-large": {"uri": "https://www.speedrun.com/static/game/o1y9okr6/cover.png"}
            },
            "links": [{"rel": "self", "uri": "https://www.speedrun.com/api/v1/games/o1y9okr6"}]
        })
    }

    #[test]
    fn game_decodes_with_references() {
        let game: Game = serde_json::from_value(game_json()).unwrap();
        assert_eq!(game.weblink, "https://www.speedrun.com/mockodyssey");
        assert_eq!(game.release_date, NaiveDate::from_ymd_opt(2017, 10, 27));
        assert_eq!(game.ruleset.default_time, TimingMethod::Realtime);
        assert_eq!(
            game.platforms.reference().map(Vec::len),
            Some(1),
            "platform ids are kept as references"
        );
        assert_eq!(
            game.icon_url(),
            Some("https://www.speedrun.com/static/game/o1y9okr6/icon.png")
        );
        assert!(game.categories.is_none());
    }

    #[test]
    fn game_decodes_embedded_categories_and_platforms() {
        let mut value = game_json();
        value["platforms"] = json!({"data": [{"id": "7m6ylw9p", "name": "Switch"}]});
        value["categories"] = json!({"data": [{
            "id": "zd3xmmvd",
            "name": "Any%",
            "weblink": "https://www.speedrun.com/mockodyssey#Any",
            "type": "per-game",
            "rules": null,
            "players": {"type": "exactly", "value": 1},
            "miscellaneous": false,
            "links": []
        }]});

        let game: Game = serde_json::from_value(value).unwrap();
        let platforms = game.platforms.embedded().unwrap();
        assert_eq!(platforms[0].name, "Switch");
        let categories = &game.categories.unwrap().data;
        assert_eq!(categories[0].kind, CategoryType::PerGame);
        assert_eq!(categories[0].players.kind, PlayerCount::Exactly);
    }

    #[test]
    fn game_without_ruleset_is_rejected() {
        let mut value = game_json();
        value.as_object_mut().unwrap().remove("ruleset");
        assert!(serde_json::from_value::<Game>(value).is_err());
    }

    #[test]
    fn game_without_icon_has_no_icon_url() {
        let mut value = game_json();
        value["assets"] = json!({"icon": {"uri": null}});
        let game: Game = serde_json::from_value(value).unwrap();
        assert_eq!(game.icon_url(), None);
    }
}
