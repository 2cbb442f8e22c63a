use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Link, MaybeEmbedded, NamedEntity, Uri};
use super::game::{Category, Game, Level};
use super::user::{EmbeddedPlayer, PlayerRef};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub weblink: String,
    pub game: MaybeEmbedded<String, Box<Game>>,
    #[serde(default)]
    pub level: Option<MaybeEmbedded<String, EmbeddedLevel>>,
    pub category: MaybeEmbedded<String, Box<Category>>,
    #[serde(default)]
    pub videos: Option<Videos>,
    #[serde(default)]
    pub comment: Option<String>,
    pub status: RunStatus,
    pub players: MaybeEmbedded<Vec<PlayerRef>, Vec<EmbeddedPlayer>>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub submitted: Option<DateTime<Utc>>,
    pub times: Times,
    pub system: System,
    #[serde(default)]
    pub splits: Option<Link>,
    /// Variable id to value id.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
    #[serde(default)]
    pub region: Option<MaybeEmbedded<String, EmbeddedEntity>>,
    #[serde(default)]
    pub platform: Option<MaybeEmbedded<String, EmbeddedEntity>>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Run {
    pub fn game_id(&self) -> &str {
        match &self.game {
            MaybeEmbedded::Reference(id) => id,
            MaybeEmbedded::Embedded { data } => &data.id,
        }
    }

    pub fn category_id(&self) -> &str {
        match &self.category {
            MaybeEmbedded::Reference(id) => id,
            MaybeEmbedded::Embedded { data } => &data.id,
        }
    }

    /// When the run was verified; `None` unless the run is verified and the
    /// API recorded a date.
    pub fn verify_date(&self) -> Option<DateTime<Utc>> {
        match &self.status {
            RunStatus::Verified { verify_date, .. } => *verify_date,
            _ => None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.status, RunStatus::Verified { .. })
    }
}

/// Review state of a run, keyed by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunStatus {
    #[serde(rename = "new", alias = "pending")]
    Pending,
    Verified {
        #[serde(default)]
        examiner: Option<String>,
        #[serde(rename = "verify-date", default)]
        verify_date: Option<DateTime<Utc>>,
    },
    Rejected {
        examiner: String,
        #[serde(default)]
        reason: Option<String>,
    },
}

/// An embedded level is `{"data": []}` on full-game runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddedLevel {
    Level(Level),
    Absent(Vec<serde_json::Value>),
}

/// Same shape quirk as [`EmbeddedLevel`] for region and platform embeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddedEntity {
    Entity(NamedEntity),
    Absent(Vec<serde_json::Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Times {
    pub primary: String,
    pub primary_t: f64,
    #[serde(default)]
    pub realtime: Option<String>,
    #[serde(default)]
    pub realtime_t: Option<f64>,
    #[serde(default)]
    pub realtime_noloads: Option<String>,
    #[serde(default)]
    pub realtime_noloads_t: Option<f64>,
    #[serde(default)]
    pub ingame: Option<String>,
    #[serde(default)]
    pub ingame_t: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    #[serde(default)]
    pub platform: Option<String>,
    pub emulated: bool,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Videos {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub links: Option<Vec<Uri>>,
}

/// Body of `POST /runs`. Submitting requires an API key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewRun {
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Moderators may submit pre-verified runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    pub times: NewRunTimes,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<NewRunPlayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emulated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, NewRunValue>,
}

/// Times in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewRunTimes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_noloads: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingame: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rel", rename_all = "lowercase")]
pub enum NewRunPlayer {
    User { id: String },
    Guest { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NewRunValue {
    PreDefined { value: String },
    UserDefined { value: String },
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::{json, Value};

    use super::*;

    pub(crate) fn run_json(id: &str, verify_date: &str) -> Value {
        json!({
            "id": id,
            "weblink": format!("https://www.speedrun.com/run/{id}"),
            "game": "o1y9okr6",
            "level": null,
            "category": "zd3xmmvd",
            "videos": {"links": [{"uri": "https://youtu.be/example"}]},
            "comment": null,
            "status": {
                "status": "verified",
                "examiner": "8georwrj",
                "verify-date": verify_date
            },
            "players": [{"rel": "user", "id": "816w31rx", "uri": "https://www.speedrun.com/api/v1/users/816w31rx"}],
            "date": "2023-01-01",
            "submitted": "2023-01-01T10:00:00Z",
            "times": {
                "primary": "PT1H2M3S",
                "primary_t": 3723.0,
                "realtime": "PT1H2M3S",
                "realtime_t": 3723.0,
                "realtime_noloads": null,
                "realtime_noloads_t": 0,
                "ingame": null,
                "ingame_t": 0
            },
            "system": {"platform": "7m6ylw9p", "emulated": false, "region": null},
            "splits": null,
            "values": {"68km3w4l": "zqoyz021"},
            "links": []
        })
    }

    #[test]
    fn verified_run_exposes_verify_date() {
        let run: Run = serde_json::from_value(run_json("abc", "2023-02-03T04:05:06Z")).unwrap();
        assert!(run.is_verified());
        assert_eq!(
            run.verify_date().unwrap().to_rfc3339(),
            "2023-02-03T04:05:06+00:00"
        );
        assert_eq!(run.game_id(), "o1y9okr6");
        assert_eq!(run.category_id(), "zd3xmmvd");
        assert_eq!(run.values.get("68km3w4l").map(String::as_str), Some("zqoyz021"));
    }

    #[test]
    fn pending_and_rejected_statuses_decode() {
        let mut value = run_json("abc", "2023-02-03T04:05:06Z");
        value["status"] = json!({"status": "new"});
        let run: Run = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(run.verify_date(), None);

        value["status"] = json!({"status": "rejected", "examiner": "8georwrj", "reason": "no video"});
        let run: Run = serde_json::from_value(value).unwrap();
        assert!(matches!(run.status, RunStatus::Rejected { ref examiner, .. } if examiner == "8georwrj"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut value = run_json("abc", "2023-02-03T04:05:06Z");
        value["status"] = json!({"status": "archived"});
        assert!(serde_json::from_value::<Run>(value).is_err());
    }

    #[test]
    fn rejected_without_examiner_is_rejected() {
        let mut value = run_json("abc", "2023-02-03T04:05:06Z");
        value["status"] = json!({"status": "rejected"});
        assert!(serde_json::from_value::<Run>(value).is_err());
    }

    #[test]
    fn embedded_game_category_and_empty_level() {
        let mut value = run_json("abc", "2023-02-03T04:05:06Z");
        value["level"] = json!({"data": []});
        value["category"] = json!({"data": {
            "id": "zd3xmmvd",
            "name": "Any%",
            "weblink": "https://www.speedrun.com/mockodyssey#Any",
            "type": "per-game",
            "players": {"type": "up-to", "value": 2},
            "miscellaneous": false
        }});
        value["players"] = json!({"data": [{"rel": "guest", "name": "anon"}]});

        let run: Run = serde_json::from_value(value).unwrap();
        assert_eq!(run.category_id(), "zd3xmmvd");
        assert!(matches!(
            run.level,
            Some(MaybeEmbedded::Embedded {
                data: EmbeddedLevel::Absent(_)
            })
        ));
        let players = run.players.embedded().unwrap();
        assert_eq!(players[0].name(), "anon");
    }

    #[test]
    fn new_run_serializes_only_what_is_set() {
        let mut run = NewRun {
            category: "zd3xmmvd".into(),
            times: NewRunTimes {
                realtime: Some(3723.0),
                ..Default::default()
            },
            ..Default::default()
        };
        run.variables.insert(
            "68km3w4l".into(),
            NewRunValue::PreDefined {
                value: "zqoyz021".into(),
            },
        );
        assert_eq!(
            serde_json::to_value(&run).unwrap(),
            json!({
                "category": "zd3xmmvd",
                "times": {"realtime": 3723.0},
                "variables": {"68km3w4l": {"type": "pre-defined", "value": "zqoyz021"}}
            })
        );
    }
}
