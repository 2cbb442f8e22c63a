//! In-process imitation of the speedrun.com v1 API over fixture data.
//!
//! Serves the subset of endpoints the client uses: games with their
//! categories and variables, users and personal bests, paginated runs with
//! run submission, and full-game and level leaderboards. Responses carry the upstream
//! `{"data": ..., "pagination": ...}` envelope and errors the upstream
//! `{"status", "message"}` body.

pub mod fixtures;

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use url::Url;

use fixtures::{
    API_ROOT, CATEGORY_ID, GAME_ABBREVIATION, GAME_ID, HUNDRED_PERCENT_ID, LEVEL_CATEGORY_ID,
    LEVEL_ID, OTHER_CATEGORY_ID, OTHER_GAME_ID,
};

pub const DEFAULT_API_KEY: &str = "mock-key";
pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 200;

/// Everything the server knows. Runs are appended by `POST /runs`.
#[derive(Debug, Clone)]
pub struct Store {
    pub api_key: String,
    pub games: Vec<Value>,
    /// `(game id, category)`
    pub categories: Vec<(String, Value)>,
    /// `(game id, level)`
    pub levels: Vec<(String, Value)>,
    /// `(game id, variable)`
    pub variables: Vec<(String, Value)>,
    pub users: Vec<Value>,
    pub runs: Vec<Value>,
}

impl Store {
    pub fn seeded(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            games: vec![
                fixtures::game(GAME_ID, "Mock Odyssey", GAME_ABBREVIATION),
                fixtures::game(OTHER_GAME_ID, "Mock Kart", "mockkart"),
            ],
            categories: vec![
                (GAME_ID.into(), fixtures::category(CATEGORY_ID, GAME_ID, "Any%", false)),
                (
                    GAME_ID.into(),
                    fixtures::category(HUNDRED_PERCENT_ID, GAME_ID, "100%", true),
                ),
                (
                    OTHER_GAME_ID.into(),
                    fixtures::category(OTHER_CATEGORY_ID, OTHER_GAME_ID, "150cc", false),
                ),
                (
                    OTHER_GAME_ID.into(),
                    fixtures::level_category(LEVEL_CATEGORY_ID, OTHER_GAME_ID, "Time Trial"),
                ),
            ],
            levels: vec![(
                OTHER_GAME_ID.into(),
                fixtures::level(LEVEL_ID, "mockkart", "Mushroom Gorge"),
            )],
            variables: vec![(GAME_ID.into(), fixtures::difficulty_variable())],
            users: vec![
                fixtures::user(fixtures::RUNNER_ID, "Runner"),
                fixtures::user(fixtures::EXAMINER_ID, "Verifier"),
                fixtures::user(fixtures::RIVAL_ID, "Rival"),
            ],
            runs: fixtures::runs(),
        }
    }

    fn game(&self, id_or_abbreviation: &str) -> Option<&Value> {
        self.games
            .iter()
            .find(|g| g["id"] == id_or_abbreviation || g["abbreviation"] == id_or_abbreviation)
    }

    fn category(&self, id: &str) -> Option<&(String, Value)> {
        self.categories.iter().find(|(_, c)| c["id"] == id)
    }

    fn level(&self, id: &str) -> Option<&(String, Value)> {
        self.levels.iter().find(|(_, l)| l["id"] == id)
    }

    /// Levels a category is ranked on: one board per level for per-level
    /// categories, a single full-game board otherwise.
    fn boards_of(&self, game: &str, category: &Value) -> Vec<Option<&str>> {
        if category["type"] != "per-level" {
            return vec![None];
        }
        self.levels
            .iter()
            .filter(|(g, _)| g == game)
            .map(|(_, l)| l["id"].as_str())
            .collect()
    }

    fn user(&self, id: &str) -> Option<&Value> {
        self.users
            .iter()
            .find(|u| u["id"] == id || u["names"]["international"] == id)
    }

    fn game_variables(&self, game: &str) -> Vec<Value> {
        self.variables
            .iter()
            .filter(|(g, _)| g == game)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Inline run participants: users become their record, guests keep
    /// their name.
    fn embed_players(&self, players: &Value) -> Vec<Value> {
        players
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|p| match p["rel"].as_str() {
                Some("guest") => p["name"].as_str().map(fixtures::guest),
                _ => p["id"].as_str().and_then(|id| self.user(id)).map(|u| {
                    let mut u = u.clone();
                    u["rel"] = json!("user");
                    u
                }),
            })
            .collect()
    }

    fn embed_run(&self, run: &Value, embeds: &[&str]) -> Value {
        let mut run = run.clone();
        for embed in embeds {
            match *embed {
                "game" => {
                    let game = run["game"].as_str().and_then(|id| self.game(id)).cloned();
                    run["game"] = json!({"data": game});
                }
                "category" => {
                    let category = run["category"]
                        .as_str()
                        .and_then(|id| self.category(id))
                        .map(|(_, c)| c.clone());
                    run["category"] = json!({"data": category});
                }
                "players" => {
                    let players = self.embed_players(&run["players"]);
                    run["players"] = json!({"data": players});
                }
                "level" => {
                    let level = run["level"].as_str().and_then(|id| self.level(id));
                    run["level"] = match level {
                        Some((_, level)) => json!({"data": level}),
                        None => json!({"data": []}),
                    };
                }
                _ => {}
            }
        }
        run
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Upstream-style error body.
#[derive(Debug)]
pub struct ApiProblem {
    status: StatusCode,
    message: String,
}

impl ApiProblem {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} could not be found."))
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        let body = json!({"status": self.status.as_u16(), "message": self.message});
        (self.status, Json(body)).into_response()
    }
}

type Params = Query<HashMap<String, String>>;

pub fn app() -> Router {
    router(Store::seeded(DEFAULT_API_KEY))
}

pub fn router(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/games", get(list_games))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/categories", get(game_categories))
        .route("/games/{id}/variables", get(game_variables))
        .route("/categories/{id}", get(get_category))
        .route("/variables/{id}", get(get_variable))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/personal-bests", get(personal_bests))
        .route("/runs", get(list_runs).post(submit_run))
        .route("/runs/{id}", get(get_run))
        .route("/leaderboards/{game}/category/{category}", get(leaderboard))
        .route(
            "/leaderboards/{game}/level/{level}/{category}",
            get(level_leaderboard),
        )
        .fallback(|| async { ApiProblem::not_found("The requested resource") })
        .with_state(db)
}

pub async fn serve(listener: TcpListener, store: Store) -> Result<(), std::io::Error> {
    axum::serve(listener, router(store)).await
}

fn data(value: Value) -> Json<Value> {
    Json(json!({ "data": value }))
}

fn embeds(params: &HashMap<String, String>) -> Vec<&str> {
    params
        .get("embed")
        .map(|e| e.split(',').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn parse_count(params: &HashMap<String, String>, key: &str) -> Result<Option<usize>, ApiProblem> {
    params
        .get(key)
        .map(|v| {
            v.parse()
                .map_err(|_| ApiProblem::bad_request(format!("`{key}` must be a number.")))
        })
        .transpose()
}

/// Slice `items` by `offset`/`max` and build the pagination block. Links
/// point back at `path` with the request's other parameters preserved.
fn paginate(
    headers: &HeaderMap,
    path: &str,
    params: &HashMap<String, String>,
    items: Vec<Value>,
) -> Result<Json<Value>, ApiProblem> {
    let max = parse_count(params, "max")?
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = parse_count(params, "offset")?.unwrap_or(0);
    let total = items.len();
    let page: Vec<Value> = items.into_iter().skip(offset).take(max).collect();

    let mut links = Vec::new();
    if offset > 0 {
        let prev = page_link(headers, path, params, offset.saturating_sub(max))?;
        links.push(json!({"rel": "prev", "uri": prev}));
    }
    if offset + max < total {
        let next = page_link(headers, path, params, offset + max)?;
        links.push(json!({"rel": "next", "uri": next}));
    }
    Ok(Json(json!({
        "data": page,
        "pagination": {"offset": offset, "max": max, "size": page.len(), "links": links}
    })))
}

fn page_link(
    headers: &HeaderMap,
    path: &str,
    params: &HashMap<String, String>,
    offset: usize,
) -> Result<String, ApiProblem> {
    let host = headers
        .get("host")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let mut url = Url::parse(&format!("http://{host}{path}"))
        .map_err(|e| ApiProblem::bad_request(format!("bad host header: {e}")))?;
    let mut pairs: Vec<(&String, &String)> =
        params.iter().filter(|(k, _)| *k != "offset").collect();
    pairs.sort();
    url.query_pairs_mut()
        .extend_pairs(pairs)
        .append_pair("offset", &offset.to_string());
    Ok(url.into())
}

async fn list_games(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let name = params.get("name").map(|n| n.to_lowercase());
    let games: Vec<Value> = store
        .games
        .iter()
        .filter(|g| {
            name.as_ref().map_or(true, |n| {
                g["names"]["international"]
                    .as_str()
                    .is_some_and(|i| i.to_lowercase().contains(n.as_str()))
            })
        })
        .filter(|g| {
            params
                .get("abbreviation")
                .map_or(true, |a| g["abbreviation"] == a.as_str())
        })
        .cloned()
        .collect();
    paginate(&headers, "/games", &params, games)
}

async fn get_game(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let mut game = store
        .game(&id)
        .cloned()
        .ok_or_else(|| ApiProblem::not_found("Game"))?;
    let game_id = game["id"].as_str().unwrap_or_default().to_string();
    for embed in embeds(&params) {
        match embed {
            "categories" => {
                let categories: Vec<Value> = store
                    .categories
                    .iter()
                    .filter(|(g, _)| *g == game_id)
                    .map(|(_, c)| c.clone())
                    .collect();
                game["categories"] = json!({"data": categories});
            }
            "variables" => game["variables"] = json!({"data": store.game_variables(&game_id)}),
            "levels" => {
                let levels: Vec<&Value> = store
                    .levels
                    .iter()
                    .filter(|(g, _)| *g == game_id)
                    .map(|(_, l)| l)
                    .collect();
                game["levels"] = json!({"data": levels});
            }
            _ => {}
        }
    }
    Ok(data(game))
}

async fn game_categories(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let game = store.game(&id).ok_or_else(|| ApiProblem::not_found("Game"))?;
    let miscellaneous = params.get("miscellaneous").map(|m| m == "true");
    let categories: Vec<Value> = store
        .categories
        .iter()
        .filter(|(g, _)| game["id"] == g.as_str())
        .map(|(_, c)| c)
        .filter(|c| miscellaneous.map_or(true, |m| m || c["miscellaneous"] == false))
        .cloned()
        .collect();
    Ok(data(json!(categories)))
}

async fn game_variables(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let game = store.game(&id).ok_or_else(|| ApiProblem::not_found("Game"))?;
    let game_id = game["id"].as_str().unwrap_or_default();
    Ok(data(json!(store.game_variables(game_id))))
}

async fn get_category(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let (game_id, category) = store
        .category(&id)
        .cloned()
        .ok_or_else(|| ApiProblem::not_found("Category"))?;
    let mut category = category;
    for embed in embeds(&params) {
        match embed {
            "game" => category["game"] = json!({"data": store.game(&game_id)}),
            "variables" => category["variables"] = json!({"data": store.game_variables(&game_id)}),
            _ => {}
        }
    }
    Ok(data(category))
}

async fn get_variable(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    store
        .variables
        .iter()
        .find(|(_, v)| v["id"] == id.as_str())
        .map(|(_, v)| data(v.clone()))
        .ok_or_else(|| ApiProblem::not_found("Variable"))
}

async fn list_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let users: Vec<Value> = match (params.get("lookup"), params.get("name")) {
        (Some(lookup), _) => store
            .users
            .iter()
            .filter(|u| {
                u["names"]["international"]
                    .as_str()
                    .is_some_and(|n| n.eq_ignore_ascii_case(lookup))
            })
            .cloned()
            .collect(),
        (None, Some(name)) => store
            .users
            .iter()
            .filter(|u| {
                u["names"]["international"]
                    .as_str()
                    .is_some_and(|n| n.to_lowercase().contains(&name.to_lowercase()))
            })
            .cloned()
            .collect(),
        (None, None) => store.users.clone(),
    };
    paginate(&headers, "/users", &params, users)
}

async fn get_user(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    store
        .user(&id)
        .cloned()
        .map(data)
        .ok_or_else(|| ApiProblem::not_found("User"))
}

fn is_verified(run: &Value) -> bool {
    run["status"]["status"] == "verified"
}

fn plays(run: &Value, user: &str) -> bool {
    run["players"]
        .as_array()
        .is_some_and(|players| players.iter().any(|p| p["id"] == user))
}

fn by_time(a: &&Value, b: &&Value) -> Ordering {
    let time = |r: &Value| r["times"]["primary_t"].as_f64().unwrap_or(f64::MAX);
    time(*a).total_cmp(&time(*b))
}

/// Verified runs of one board, best run per player, fastest first, with
/// places assigned. `level` is `None` for full-game boards.
fn ranked<'a>(
    store: &'a Store,
    game: &str,
    category: &str,
    level: Option<&str>,
    accept: impl Fn(&Value) -> bool,
) -> Vec<(u64, &'a Value)> {
    let mut runs: Vec<&Value> = store
        .runs
        .iter()
        .filter(|r| is_verified(r) && r["game"] == game && r["category"] == category)
        .filter(|r| r["level"].as_str() == level)
        .filter(|r| accept(*r))
        .collect();
    runs.sort_by(by_time);

    let mut seen = Vec::new();
    let mut ranked = Vec::new();
    for run in runs {
        // Whole reference, so guests are told apart by name.
        let player = run["players"][0].clone();
        if seen.contains(&player) {
            continue;
        }
        seen.push(player);
        ranked.push((ranked.len() as u64 + 1, run));
    }
    ranked
}

async fn personal_bests(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let user = store.user(&id).ok_or_else(|| ApiProblem::not_found("User"))?;
    let user_id = user["id"].as_str().unwrap_or_default();
    let top = parse_count(&params, "top")?;
    let game_filter = params.get("game").and_then(|g| store.game(g)).map(|g| g["id"].clone());
    if params.contains_key("game") && game_filter.is_none() {
        return Err(ApiProblem::not_found("Game"));
    }

    let embeds = embeds(&params);
    let mut bests = Vec::new();
    for (game_id, category) in &store.categories {
        if game_filter.as_ref().is_some_and(|g| g != game_id.as_str()) {
            continue;
        }
        let category_id = category["id"].as_str().unwrap_or_default();
        for level in store.boards_of(game_id, category) {
            let board = ranked(&store, game_id, category_id, level, |_| true);
            if let Some((place, run)) = board.into_iter().find(|(_, run)| plays(run, user_id)) {
                if top.map_or(true, |top| place <= top as u64) {
                    bests.push(json!({"place": place, "run": store.embed_run(run, &embeds)}));
                }
            }
        }
    }
    Ok(data(json!(bests)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunOrder {
    Submitted,
    VerifyDate,
    Date,
    Unordered,
}

fn run_order(params: &HashMap<String, String>) -> Result<RunOrder, ApiProblem> {
    match params.get("orderby").map(String::as_str) {
        None | Some("game") => Ok(RunOrder::Unordered),
        Some("submitted") => Ok(RunOrder::Submitted),
        Some("verify-date") => Ok(RunOrder::VerifyDate),
        Some("date") => Ok(RunOrder::Date),
        Some(other) => Err(ApiProblem::bad_request(format!("Unsupported orderby `{other}`."))),
    }
}

async fn list_runs(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let order = run_order(&params)?;
    let descending = match params.get("direction").map(String::as_str) {
        None | Some("asc") => false,
        Some("desc") => true,
        Some(other) => {
            return Err(ApiProblem::bad_request(format!("Unsupported direction `{other}`.")))
        }
    };
    let game = match params.get("game") {
        Some(g) => Some(
            store
                .game(g)
                .and_then(|g| g["id"].as_str())
                .ok_or_else(|| ApiProblem::not_found("Game"))?
                .to_string(),
        ),
        None => None,
    };
    let variables: Vec<(&str, &String)> = params
        .iter()
        .filter_map(|(k, v)| k.strip_prefix("var-").map(|id| (id, v)))
        .collect();

    let mut runs: Vec<&Value> = store
        .runs
        .iter()
        .filter(|r| game.as_ref().map_or(true, |g| r["game"] == g.as_str()))
        .filter(|r| params.get("category").map_or(true, |c| r["category"] == c.as_str()))
        .filter(|r| params.get("status").map_or(true, |s| r["status"]["status"] == s.as_str()))
        .filter(|r| params.get("user").map_or(true, |u| plays(r, u)))
        .filter(|r| {
            params
                .get("examiner")
                .map_or(true, |e| r["status"]["examiner"] == e.as_str())
        })
        .filter(|r| variables.iter().all(|(id, v)| r["values"][*id] == v.as_str()))
        .collect();

    let key = |r: &Value| -> String {
        let field = match order {
            RunOrder::Submitted => &r["submitted"],
            RunOrder::VerifyDate => &r["status"]["verify-date"],
            RunOrder::Date => &r["date"],
            RunOrder::Unordered => return String::new(),
        };
        field.as_str().unwrap_or_default().to_string()
    };
    runs.sort_by_key(|r| key(*r));
    if descending {
        runs.reverse();
    }

    let embeds = embeds(&params);
    let runs: Vec<Value> = runs.into_iter().map(|r| store.embed_run(r, &embeds)).collect();
    debug!(matched = runs.len(), "listing runs");
    paginate(&headers, "/runs", &params, runs)
}

async fn get_run(
    State(db): State<Db>,
    Path(id): Path<String>,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    let embeds = embeds(&params);
    store
        .runs
        .iter()
        .find(|r| r["id"] == id.as_str())
        .map(|r| data(store.embed_run(r, &embeds)))
        .ok_or_else(|| ApiProblem::not_found("Run"))
}

#[derive(Debug, Deserialize)]
pub struct Submission {
    pub run: SubmittedRun,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedRun {
    pub category: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub times: SubmittedTimes,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub variables: BTreeMap<String, SubmittedValue>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedTimes {
    #[serde(default)]
    pub realtime: Option<f64>,
    #[serde(default)]
    pub realtime_noloads: Option<f64>,
    #[serde(default)]
    pub ingame: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmittedValue {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

async fn submit_run(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(submission): Json<Submission>,
) -> Result<(StatusCode, Json<Value>), ApiProblem> {
    let mut store = db.write().await;
    let authorized = headers
        .get("x-api-key")
        .and_then(|k| k.to_str().ok())
        .is_some_and(|k| k == store.api_key);
    if !authorized {
        return Err(ApiProblem::new(
            StatusCode::FORBIDDEN,
            "You must provide a valid API key to submit runs.",
        ));
    }

    let input = submission.run;
    let game_id = store
        .category(&input.category)
        .map(|(g, _)| g.clone())
        .ok_or_else(|| ApiProblem::not_found("Category"))?;
    let seconds = input
        .times
        .realtime
        .or(input.times.realtime_noloads)
        .or(input.times.ingame)
        .ok_or_else(|| ApiProblem::bad_request("At least one time must be given."))?;

    let now: DateTime<Utc> = Utc::now();
    let difficulty = input
        .variables
        .get(fixtures::DIFFICULTY_VARIABLE_ID)
        .map(|v| v.value.as_str())
        .unwrap_or(fixtures::NORMAL_VALUE_ID);
    let id = format!("n{:07}", store.runs.len());
    let mut run = fixtures::run(
        &id,
        fixtures::RunSeed {
            game: &game_id,
            category: &input.category,
            player: fixtures::RUNNER_ID,
            status: fixtures::pending(),
            submitted: now,
            seconds: seconds.round() as u64,
            difficulty,
        },
    );
    if let Some(date) = input.date {
        run["date"] = json!(date.to_string());
    }
    run["comment"] = json!(input.comment);
    if let Some(video) = input.video {
        run["videos"] = json!({"links": [{"uri": video}]});
    }
    info!(run = %id, category = %input.category, "run submitted");
    store.runs.push(run.clone());
    Ok((StatusCode::CREATED, data(run)))
}

fn parse_as_of(date: &str) -> Result<String, ApiProblem> {
    if let Ok(at) = DateTime::parse_from_rfc3339(date) {
        return Ok(fixtures::timestamp(at.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(23, 59, 59))
        .map(|d| fixtures::timestamp(d.and_utc()))
        .ok_or_else(|| ApiProblem::bad_request(format!("Invalid date `{date}`.")))
}

async fn leaderboard(
    State(db): State<Db>,
    Path((game, category)): Path<(String, String)>,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    board(&store, &game, &category, None, &params).map(data)
}

async fn level_leaderboard(
    State(db): State<Db>,
    Path((game, level, category)): Path<(String, String, String)>,
    Query(params): Params,
) -> Result<Json<Value>, ApiProblem> {
    let store = db.read().await;
    board(&store, &game, &category, Some(&level), &params).map(data)
}

/// Leaderboard body of a full-game board, or of one level when `level` is
/// given. The category must belong to the game and match the board kind.
fn board(
    store: &Store,
    game: &str,
    category: &str,
    level: Option<&str>,
    params: &HashMap<String, String>,
) -> Result<Value, ApiProblem> {
    let game = store.game(game).ok_or_else(|| ApiProblem::not_found("Game"))?;
    let game_id = game["id"].as_str().unwrap_or_default();
    let (category_game, category) = store
        .category(category)
        .ok_or_else(|| ApiProblem::not_found("Category"))?;
    if category_game != game_id {
        return Err(ApiProblem::not_found("Category"));
    }
    let category_id = category["id"].as_str().unwrap_or_default();
    let level = level
        .map(|id| {
            store
                .level(id)
                .filter(|(level_game, _)| level_game == game_id)
                .map(|(_, l)| l)
                .ok_or_else(|| ApiProblem::not_found("Level"))
        })
        .transpose()?;
    let per_level = category["type"] == "per-level";
    match (level, per_level) {
        (None, true) => {
            return Err(ApiProblem::bad_request("This category is for individual levels."))
        }
        (Some(_), false) => {
            return Err(ApiProblem::bad_request("This category is for full-game runs."))
        }
        _ => {}
    }
    let level_id = level.and_then(|l| l["id"].as_str());

    let top = parse_count(params, "top")?;
    let as_of = params.get("date").map(|d| parse_as_of(d)).transpose()?;
    let values: BTreeMap<&str, &String> = params
        .iter()
        .filter_map(|(k, v)| k.strip_prefix("var-").map(|id| (id, v)))
        .collect();

    let ranking = ranked(store, game_id, category_id, level_id, |run| {
        values.iter().all(|(id, v)| run["values"][*id] == v.as_str())
            && as_of.as_ref().map_or(true, |at| {
                run["status"]["verify-date"]
                    .as_str()
                    .is_some_and(|d| d <= at.as_str())
            })
    });
    let mut entries: Vec<Value> = ranking
        .iter()
        .filter(|(place, _)| top.map_or(true, |top| *place <= top as u64))
        .map(|(place, run)| json!({"place": place, "run": run}))
        .collect();
    entries.push(fixtures::malformed_entry(entries.len() as u64 + 1));

    let weblink = format!(
        "{}#{}",
        level.unwrap_or(game)["weblink"].as_str().unwrap_or_default(),
        category["name"].as_str().unwrap_or_default()
    );
    let mut links = vec![
        json!({"rel": "game", "uri": format!("{API_ROOT}/games/{game_id}")}),
        json!({"rel": "category", "uri": format!("{API_ROOT}/categories/{category_id}")}),
    ];
    if let Some(level_id) = level_id {
        links.push(json!({"rel": "level", "uri": format!("{API_ROOT}/levels/{level_id}")}));
    }
    let mut body = json!({
        "weblink": weblink,
        "game": game_id,
        "category": category_id,
        "level": level_id,
        "platform": params.get("platform"),
        "region": params.get("region"),
        "emulators": params.get("emulators").map(|e| e == "true"),
        "video-only": params.get("video-only").is_some_and(|v| v == "true"),
        "timing": params.get("timing").map(String::as_str).unwrap_or("realtime"),
        "values": values,
        "runs": entries,
        "links": links
    });
    if embeds(params).contains(&"players") {
        let players: Vec<Value> = ranking
            .iter()
            .flat_map(|(_, run)| store.embed_players(&run["players"]))
            .collect();
        body["players"] = json!({"data": players});
    }
    Ok(body)
}
