//! Seed data shaped like the upstream API's JSON.
//!
//! Records are plain `serde_json::Value`s so the server stays independent of
//! the client's record types; drift between the two shows up in the
//! integration tests.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};

pub const API_ROOT: &str = "https://www.speedrun.com/api/v1";

pub const GAME_ID: &str = "o1y9okr6";
pub const GAME_ABBREVIATION: &str = "mockodyssey";
pub const OTHER_GAME_ID: &str = "3dxy5vv6";
pub const CATEGORY_ID: &str = "zd3xmmvd";
pub const HUNDRED_PERCENT_ID: &str = "n2y3r8do";
pub const OTHER_CATEGORY_ID: &str = "wkpm7x2r";
pub const DIFFICULTY_VARIABLE_ID: &str = "68km3w4l";
pub const NORMAL_VALUE_ID: &str = "zqoyz021";
pub const HARD_VALUE_ID: &str = "013v5vx1";
pub const PLATFORM_ID: &str = "7m6ylw9p";
/// Individual level of `OTHER_GAME_ID` and its per-level category.
pub const LEVEL_ID: &str = "29vjx8r9";
pub const LEVEL_CATEGORY_ID: &str = "q25oowgk";

pub const RUNNER_ID: &str = "816w31rx";
pub const EXAMINER_ID: &str = "8georwrj";
pub const RIVAL_ID: &str = "8e9k1yoj";
/// Unregistered player holding the level record.
pub const GUEST_NAME: &str = "Ghost";

/// Verified runs seeded for `GAME_ID`/`CATEGORY_ID`, one verified per hour.
pub const VERIFIED_RUNS: usize = 450;

pub fn first_verify_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `PT1H2M3S`-style duration as the API renders run times.
pub fn iso_duration(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, seconds / 60 % 60, seconds % 60);
    let mut out = String::from("PT");
    if h > 0 {
        out.push_str(&format!("{h}H"));
    }
    if m > 0 {
        out.push_str(&format!("{m}M"));
    }
    if s > 0 || out.len() == 2 {
        out.push_str(&format!("{s}S"));
    }
    out
}

pub fn game(id: &str, name: &str, abbreviation: &str) -> Value {
    json!({
        "id": id,
        "names": {"international": name, "japanese": null, "twitch": name},
        "boostReceived": 0,
        "boostDistinctDonors": 0,
        "abbreviation": abbreviation,
        "weblink": format!("https://www.speedrun.com/{abbreviation}"),
        "discord": "",
        "released": 2017,
        "release-date": "2017-10-27",
        "ruleset": {
            "show-milliseconds": false,
            "require-verification": true,
            "require-video": true,
            "run-times": ["realtime", "ingame"],
            "default-time": "realtime",
            "emulators-allowed": false
        },
        "romhack": false,
        "gametypes": [],
        "platforms": [PLATFORM_ID],
        "regions": [],
        "genres": [],
        "engines": [],
        "developers": [],
        "publishers": [],
        "moderators": {EXAMINER_ID: "super-moderator"},
        "created": "2017-10-27T08:00:00Z",
        "assets": {
            "logo": {"uri": format!("https://www.speedrun.com/static/game/{id}/logo.png")},
            "cover-large": {"uri": format!("https://www.speedrun.com/static/game/{id}/cover.png")},
            "icon": {"uri": format!("https://www.speedrun.com/static/game/{id}/icon.png")},
            "trophy-1st": {"uri": format!("https://www.speedrun.com/static/game/{id}/1st.png")}
        },
        "links": [
            {"rel": "self", "uri": format!("{API_ROOT}/games/{id}")},
            {"rel": "runs", "uri": format!("{API_ROOT}/runs?game={id}")},
            {"rel": "categories", "uri": format!("{API_ROOT}/games/{id}/categories")},
            {"rel": "variables", "uri": format!("{API_ROOT}/games/{id}/variables")}
        ]
    })
}

pub fn category(id: &str, game: &str, name: &str, miscellaneous: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "weblink": format!("https://www.speedrun.com/{game}#{}", name.replace(' ', "_")),
        "type": "per-game",
        "rules": format!("{name} rules."),
        "players": {"type": "exactly", "value": 1},
        "miscellaneous": miscellaneous,
        "links": [
            {"rel": "self", "uri": format!("{API_ROOT}/categories/{id}")},
            {"rel": "game", "uri": format!("{API_ROOT}/games/{game}")},
            {"rel": "leaderboard", "uri": format!("{API_ROOT}/leaderboards/{game}/category/{id}")}
        ]
    })
}

pub fn level_category(id: &str, game: &str, name: &str) -> Value {
    let mut category = category(id, game, name, false);
    category["type"] = json!("per-level");
    category
}

pub fn level(id: &str, game: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "weblink": format!("https://www.speedrun.com/{game}/{}", name.replace(' ', "_")),
        "rules": null,
        "links": [
            {"rel": "self", "uri": format!("{API_ROOT}/levels/{id}")},
            {"rel": "game", "uri": format!("{API_ROOT}/games/{game}")}
        ]
    })
}

/// Player reference of a guest, as it appears inside a run.
pub fn guest_ref(name: &str) -> Value {
    json!({"rel": "guest", "name": name, "uri": format!("{API_ROOT}/guests/{name}")})
}

/// A guest as inlined by `embed=players`.
pub fn guest(name: &str) -> Value {
    json!({
        "rel": "guest",
        "name": name,
        "links": [{"rel": "self", "uri": format!("{API_ROOT}/guests/{name}")}]
    })
}

pub fn difficulty_variable() -> Value {
    json!({
        "id": DIFFICULTY_VARIABLE_ID,
        "name": "Difficulty",
        "category": CATEGORY_ID,
        "scope": {"type": "full-game"},
        "mandatory": true,
        "user-defined": false,
        "obsoletes": true,
        "values": {
            "_note": "`choices` is deprecated, please use `values` instead",
            "choices": {NORMAL_VALUE_ID: "Normal", HARD_VALUE_ID: "Hard"},
            "values": {
                NORMAL_VALUE_ID: {"label": "Normal", "rules": null, "flags": {"miscellaneous": false}},
                HARD_VALUE_ID: {"label": "Hard", "rules": "No damage boosts.", "flags": {"miscellaneous": false}}
            },
            "default": NORMAL_VALUE_ID
        },
        "is-subcategory": true,
        "links": [
            {"rel": "self", "uri": format!("{API_ROOT}/variables/{DIFFICULTY_VARIABLE_ID}")},
            {"rel": "game", "uri": format!("{API_ROOT}/games/{GAME_ID}")}
        ]
    })
}

pub fn user(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "names": {"international": name, "japanese": null},
        "supporterAnimation": false,
        "pronouns": null,
        "weblink": format!("https://www.speedrun.com/user/{name}"),
        "name-style": {
            "style": "gradient",
            "color-from": {"light": "#E44141", "dark": "#E44141"},
            "color-to": {"light": "#8A2BE2", "dark": "#8A2BE2"}
        },
        "role": "user",
        "signup": "2016-05-01T12:00:00Z",
        "location": {"country": {"code": "se", "names": {"international": "Sweden", "japanese": null}}},
        "twitch": {"uri": format!("https://www.twitch.tv/{}", name.to_lowercase())},
        "hitbox": null,
        "youtube": null,
        "twitter": null,
        "speedrunslive": null,
        "assets": {
            "icon": {"uri": null},
            "supporterIcon": null,
            "image": {"uri": format!("https://www.speedrun.com/static/user/{id}/image.png")}
        },
        "links": [
            {"rel": "self", "uri": format!("{API_ROOT}/users/{id}")},
            {"rel": "runs", "uri": format!("{API_ROOT}/runs?user={id}")},
            {"rel": "personal-bests", "uri": format!("{API_ROOT}/users/{id}/personal-bests")}
        ]
    })
}

/// Everything a seeded run needs besides its id.
pub struct RunSeed<'a> {
    pub game: &'a str,
    pub category: &'a str,
    pub player: &'a str,
    pub status: Value,
    pub submitted: DateTime<Utc>,
    pub seconds: u64,
    pub difficulty: &'a str,
}

pub fn run(id: &str, seed: RunSeed<'_>) -> Value {
    json!({
        "id": id,
        "weblink": format!("https://www.speedrun.com/run/{id}"),
        "game": seed.game,
        "level": null,
        "category": seed.category,
        "videos": {"links": [{"uri": format!("https://youtu.be/{id}")}]},
        "comment": null,
        "status": seed.status,
        "players": [{
            "rel": "user",
            "id": seed.player,
            "uri": format!("{API_ROOT}/users/{}", seed.player)
        }],
        "date": seed.submitted.date_naive().to_string(),
        "submitted": timestamp(seed.submitted),
        "times": {
            "primary": iso_duration(seed.seconds),
            "primary_t": seed.seconds,
            "realtime": iso_duration(seed.seconds),
            "realtime_t": seed.seconds,
            "realtime_noloads": null,
            "realtime_noloads_t": 0,
            "ingame": null,
            "ingame_t": 0
        },
        "system": {"platform": PLATFORM_ID, "emulated": false, "region": null},
        "splits": null,
        "values": {DIFFICULTY_VARIABLE_ID: seed.difficulty},
        "links": [
            {"rel": "self", "uri": format!("{API_ROOT}/runs/{id}")},
            {"rel": "game", "uri": format!("{API_ROOT}/games/{}", seed.game)},
            {"rel": "category", "uri": format!("{API_ROOT}/categories/{}", seed.category)},
            {"rel": "examiner", "uri": format!("{API_ROOT}/users/{EXAMINER_ID}")}
        ]
    })
}

pub fn verified(at: DateTime<Utc>) -> Value {
    json!({"status": "verified", "examiner": EXAMINER_ID, "verify-date": timestamp(at)})
}

pub fn pending() -> Value {
    json!({"status": "new"})
}

pub fn rejected(reason: &str) -> Value {
    json!({"status": "rejected", "examiner": EXAMINER_ID, "reason": reason})
}

/// Run history of the seeded games: `VERIFIED_RUNS` verified runs of the main
/// category verified an hour apart, a few on other boards, and some runs
/// still pending or rejected.
pub fn runs() -> Vec<Value> {
    let players = [RUNNER_ID, RIVAL_ID, EXAMINER_ID];
    let start = first_verify_date();
    let mut runs = Vec::new();

    for i in 0..VERIFIED_RUNS {
        let verified_at = start + Duration::hours(i as i64);
        runs.push(run(
            &format!("r{i:07}"),
            RunSeed {
                game: GAME_ID,
                category: CATEGORY_ID,
                player: players[i % players.len()],
                status: verified(verified_at),
                submitted: verified_at - Duration::minutes(30),
                seconds: 3600 + (i as u64 * 37) % 900,
                difficulty: if i % 4 == 0 { HARD_VALUE_ID } else { NORMAL_VALUE_ID },
            },
        ));
    }

    let late = start + Duration::hours(VERIFIED_RUNS as i64);
    for (i, player) in players.iter().enumerate() {
        runs.push(run(
            &format!("h{i:07}"),
            RunSeed {
                game: GAME_ID,
                category: HUNDRED_PERCENT_ID,
                player,
                status: verified(start + Duration::minutes(10 * i as i64 + 5)),
                submitted: start,
                seconds: 7200 + 60 * i as u64,
                difficulty: NORMAL_VALUE_ID,
            },
        ));
        runs.push(run(
            &format!("k{i:07}"),
            RunSeed {
                game: OTHER_GAME_ID,
                category: OTHER_CATEGORY_ID,
                player,
                status: verified(start + Duration::minutes(10 * i as i64 + 7)),
                submitted: start,
                seconds: 300 + 10 * i as u64,
                difficulty: NORMAL_VALUE_ID,
            },
        ));
        runs.push(run(
            &format!("p{i:07}"),
            RunSeed {
                game: GAME_ID,
                category: CATEGORY_ID,
                player,
                status: pending(),
                submitted: late + Duration::hours(i as i64),
                seconds: 3000,
                difficulty: NORMAL_VALUE_ID,
            },
        ));
    }
    // Level board: a guest ahead of a registered runner.
    for (i, (player, seconds)) in [(RIVAL_ID, 110), (GUEST_NAME, 100)].into_iter().enumerate() {
        let mut level_run = run(
            &format!("l{i:07}"),
            RunSeed {
                game: OTHER_GAME_ID,
                category: LEVEL_CATEGORY_ID,
                player,
                status: verified(start + Duration::minutes(20 * i as i64 + 9)),
                submitted: start,
                seconds,
                difficulty: NORMAL_VALUE_ID,
            },
        );
        level_run["level"] = json!(LEVEL_ID);
        if player == GUEST_NAME {
            level_run["players"] = json!([guest_ref(GUEST_NAME)]);
        }
        runs.push(level_run);
    }
    runs.push(run(
        "x0000000",
        RunSeed {
            game: GAME_ID,
            category: CATEGORY_ID,
            player: RIVAL_ID,
            status: rejected("Missing video."),
            submitted: late,
            seconds: 1200,
            difficulty: NORMAL_VALUE_ID,
        },
    ));
    runs
}

/// Leaderboard entry whose run is truncated, as real boards occasionally
/// contain. Clients are expected to skip it.
pub fn malformed_entry(place: u64) -> Value {
    json!({"place": place, "run": {"id": "corrupt0", "game": GAME_ID}})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_render_like_the_api() {
        assert_eq!(iso_duration(3723), "PT1H2M3S");
        assert_eq!(iso_duration(3600), "PT1H");
        assert_eq!(iso_duration(61), "PT1M1S");
        assert_eq!(iso_duration(0), "PT0S");
    }

    #[test]
    fn seeded_runs_have_unique_ids() {
        let runs = runs();
        let mut ids: Vec<&str> = runs.iter().filter_map(|r| r["id"].as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert!(ids.iter().all(|id| id.len() == 8));
    }

    #[test]
    fn level_runs_carry_their_level() {
        let runs = runs();
        let level_runs: Vec<&Value> = runs.iter().filter(|r| r["level"] == LEVEL_ID).collect();
        assert_eq!(level_runs.len(), 2);
        assert!(level_runs.iter().all(|r| r["category"] == LEVEL_CATEGORY_ID));
        assert!(level_runs
            .iter()
            .any(|r| r["players"][0]["rel"] == "guest" && r["players"][0]["name"] == GUEST_NAME));
    }

    #[test]
    fn main_board_is_verified_an_hour_apart() {
        let runs = runs();
        assert_eq!(runs[0]["status"]["verify-date"], "2023-01-01T00:00:00Z");
        assert_eq!(runs[1]["status"]["verify-date"], "2023-01-01T01:00:00Z");
        assert_eq!(runs[0]["players"][0]["id"], RUNNER_ID);
    }
}
