//! Typed query builder.
//!
//! # Design
//! A [`Query<R>`] is an immutable value: every builder call consumes it and
//! returns a new one, so a partially built query can be cloned and reused.
//! Validation happens in the builder calls themselves, before any request
//! exists: unknown parameters, bad values and non-whitelisted embeds fail
//! right away and name the resource they were rejected by.
//!
//! Terminal calls take the client explicitly. They render the path template
//! of the resource (substituting path parameters from the filter map), turn
//! the remaining filters and the embed list into query pairs, and hand the
//! result to [`SpeedrunClient`].

pub mod resource;

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use crate::client::SpeedrunClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::schema::QueryParams;
use crate::transport::Transport;

pub use resource::{
    Categories, Collection, Embeddable, GameCategories, GameVariables, Games, Identified,
    Leaderboards, LevelLeaderboards, ParamKind, PersonalBests, Resource, Runs, Users, Variables,
};

const VARIABLE_PREFIX: &str = "var-";
const VARIABLE_ID_LEN: usize = 8;

/// A filter value before it is rendered into the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// Rendered comma-joined.
    List(Vec<String>),
}

impl ParamValue {
    pub fn render(&self) -> String {
        match self {
            ParamValue::Str(s) => s.clone(),
            ParamValue::Int(i) => i.to_string(),
            ParamValue::Bool(b) => b.to_string(),
            ParamValue::List(items) => items.join(","),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            ParamValue::Str(_) => "a string",
            ParamValue::Int(_) => "an integer",
            ParamValue::Bool(_) => "a boolean",
            ParamValue::List(_) => "a list",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        ParamValue::Str(value.clone())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        ParamValue::List(value)
    }
}

impl From<&[&str]> for ParamValue {
    fn from(value: &[&str]) -> Self {
        ParamValue::List(value.iter().map(|s| s.to_string()).collect())
    }
}

impl TryFrom<Value> for ParamValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(ParamValue::Str(s)),
            Value::Bool(b) => Ok(ParamValue::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(ParamValue::Int)
                .ok_or_else(|| format!("{n} is not an integer")),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    Value::Number(n) => Ok(n.to_string()),
                    other => Err(format!("list element {other} is not a string")),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::List),
            other => Err(format!("{other} cannot be sent as a query parameter")),
        }
    }
}

/// Per-query response handling, both on by default. Honored by the
/// `fetch*` terminal calls only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Decode the payload into typed records.
    pub validate: bool,
    /// Strip the `data` envelope.
    pub unwrap: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            validate: true,
            unwrap: true,
        }
    }
}

/// Result of an option-honoring fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Response<T> {
    /// Decoded payload (`validate` on).
    Typed(T),
    /// Raw JSON, with or without the envelope depending on `unwrap`.
    Raw(Value),
}

impl<T> Response<T> {
    pub fn typed(self) -> Option<T> {
        match self {
            Response::Typed(value) => Some(value),
            Response::Raw(_) => None,
        }
    }

    pub fn raw(self) -> Option<Value> {
        match self {
            Response::Raw(value) => Some(value),
            Response::Typed(_) => None,
        }
    }
}

/// An in-progress request against resource family `R`.
pub struct Query<R> {
    params: BTreeMap<String, ParamValue>,
    embeds: Vec<String>,
    options: QueryOptions,
    resource: PhantomData<R>,
}

impl<R> Clone for Query<R> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            embeds: self.embeds.clone(),
            options: self.options,
            resource: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for Query<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("resource", &R::NAME)
            .field("params", &self.params)
            .field("embeds", &self.embeds)
            .field("options", &self.options)
            .finish()
    }
}

impl<R: Resource> Default for Query<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Query<R> {
    pub fn new() -> Self {
        Self {
            params: BTreeMap::new(),
            embeds: Vec::new(),
            options: QueryOptions::default(),
            resource: PhantomData,
        }
    }

    /// Add or replace one filter.
    ///
    /// `key` must be an accepted parameter of `R`. For resources that take
    /// variable filters, an 8-character alphanumeric key that is not an
    /// accepted name is sent as `var-<key>`, and explicit `var-<id>` keys
    /// pass through. The value is coerced to the parameter's type.
    pub fn filter(mut self, key: &str, value: impl Into<ParamValue>) -> Result<Self, ApiError> {
        let (name, kind) = resolve_key::<R>(key)?;
        let value = coerce::<R>(&name, kind, value.into())?;
        self.params.insert(name, value);
        Ok(self)
    }

    pub fn filters<I, K, V>(self, filters: I) -> Result<Self, ApiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        filters
            .into_iter()
            .try_fold(self, |query, (key, value)| query.filter(key.as_ref(), value))
    }

    /// Apply every set field of a typed parameter record, then its variables.
    pub fn params<P: QueryParams>(self, params: &P) -> Result<Self, ApiError> {
        let fields = match serde_json::to_value(params)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?
        {
            Value::Object(fields) => fields,
            other => {
                return Err(ApiError::SerializationError(format!(
                    "parameters must serialize to an object, got {other}"
                )))
            }
        };

        let mut query = self;
        for (key, value) in fields {
            if value.is_null() {
                continue;
            }
            let value =
                ParamValue::try_from(value).map_err(|reason| ApiError::InvalidParameterValue {
                    resource: R::NAME,
                    param: key.clone(),
                    reason,
                })?;
            query = query.filter(&key, value)?;
        }
        for (id, value) in params.variables().into_iter().flatten() {
            query = query.variable(id, value.as_str())?;
        }
        Ok(query)
    }

    /// Filter on variable `id` having value `value`, sent as `var-<id>`.
    pub fn variable(mut self, id: &str, value: &str) -> Result<Self, ApiError> {
        let name = format!("{VARIABLE_PREFIX}{id}");
        if !R::ACCEPTS_VARIABLES || id.is_empty() {
            return Err(ApiError::InvalidParameter {
                resource: R::NAME,
                param: name,
            });
        }
        self.params.insert(name, ParamValue::Str(value.to_string()));
        Ok(self)
    }

    /// Set how responses are handled. Only [`fetch`](Query::fetch) and
    /// [`fetch_all`](Query::fetch_all) read these; `get` and `all` always
    /// validate and unwrap.
    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    pub fn embeds(&self) -> &[String] {
        &self.embeds
    }

    /// Substitute `{name}` segments of `template` from the filter map.
    /// Returns the path segments and the names consumed by the path.
    fn render_path(
        &self,
        template: &'static str,
    ) -> Result<(Vec<String>, Vec<&'static str>), ApiError> {
        let mut segments = Vec::new();
        let mut consumed = Vec::new();
        for part in template.split('/') {
            match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(param) => {
                    let value = self
                        .params
                        .get(param)
                        .ok_or(ApiError::IncompletePath {
                            resource: R::NAME,
                            param,
                        })?;
                    segments.push(value.render());
                    consumed.push(param);
                }
                None => segments.push(part.to_string()),
            }
        }
        Ok((segments, consumed))
    }

    fn query_pairs(&self, consumed: &[&str]) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .params
            .iter()
            .filter(|(key, _)| !consumed.iter().any(|name| *name == key.as_str()))
            .map(|(key, value)| (key.clone(), value.render()))
            .collect();
        pairs.extend(self.embed_pair());
        pairs
    }

    fn embed_pair(&self) -> Option<(String, String)> {
        (!self.embeds.is_empty()).then(|| ("embed".to_string(), self.embeds.join(",")))
    }

    /// Turn a fetched value into a `Response` according to the options.
    fn respond<T>(
        &self,
        value: Value,
        decode: impl FnOnce(Value) -> Result<T, ApiError>,
    ) -> Result<Response<T>, ApiError> {
        if !self.options.validate {
            return Ok(Response::Raw(value));
        }
        let data = if self.options.unwrap {
            value
        } else {
            strip_envelope(value)
        };
        decode(data).map(Response::Typed)
    }
}

impl<R: Embeddable> Query<R> {
    /// Ask the API to inline related sub-resources. Accumulates across calls;
    /// repeated names are kept once.
    pub fn embed<I, S>(mut self, names: I) -> Result<Self, ApiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if !R::EMBEDS.iter().any(|allowed| *allowed == name) {
                return Err(ApiError::InvalidEmbed {
                    resource: R::NAME,
                    embed: name.to_string(),
                });
            }
            if !self.embeds.iter().any(|e| e == name) {
                self.embeds.push(name.to_string());
            }
        }
        Ok(self)
    }
}

impl<R: Collection> Query<R> {
    fn collection_target(&self) -> Result<(Vec<String>, Vec<(String, String)>), ApiError> {
        let (segments, consumed) = self.render_path(R::PATH)?;
        Ok((segments, self.query_pairs(&consumed)))
    }

    /// Render the collection request without sending it.
    pub fn build_all<T: Transport>(
        &self,
        client: &SpeedrunClient<T>,
    ) -> Result<HttpRequest, ApiError> {
        let (segments, query) = self.collection_target()?;
        client.build_get(&segments, query)
    }

    /// Fetch and decode the collection.
    pub fn all<T: Transport>(&self, client: &SpeedrunClient<T>) -> Result<R::Output, ApiError> {
        let (segments, query) = self.collection_target()?;
        R::decode(client.get(&segments, query, true)?)
    }

    /// Fetch the collection, honoring the query's options.
    pub fn fetch_all<T: Transport>(
        &self,
        client: &SpeedrunClient<T>,
    ) -> Result<Response<R::Output>, ApiError> {
        let (segments, query) = self.collection_target()?;
        let value = client.get(&segments, query, self.options.unwrap)?;
        self.respond(value, R::decode)
    }
}

impl<R: Identified> Query<R> {
    /// Only the embed list travels with a single-record request.
    fn item_target(&self, id: &str) -> (Vec<String>, Vec<(String, String)>) {
        let mut segments: Vec<String> = R::ITEM_PATH.split('/').map(str::to_string).collect();
        segments.push(id.to_string());
        (segments, self.embed_pair().into_iter().collect())
    }

    pub fn build_get<T: Transport>(
        &self,
        client: &SpeedrunClient<T>,
        id: &str,
    ) -> Result<HttpRequest, ApiError> {
        let (segments, query) = self.item_target(id);
        client.build_get(&segments, query)
    }

    /// Fetch and decode the record with identifier `id`.
    pub fn get<T: Transport>(
        &self,
        client: &SpeedrunClient<T>,
        id: &str,
    ) -> Result<R::Record, ApiError> {
        let (segments, query) = self.item_target(id);
        resource::decode_record(client.get(&segments, query, true)?)
    }

    pub fn fetch<T: Transport>(
        &self,
        client: &SpeedrunClient<T>,
        id: &str,
    ) -> Result<Response<R::Record>, ApiError> {
        let (segments, query) = self.item_target(id);
        let value = client.get(&segments, query, self.options.unwrap)?;
        self.respond(value, resource::decode_record)
    }
}

fn strip_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut fields) if fields.contains_key("data") => {
            fields.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_variable_id(key: &str) -> bool {
    key.len() == VARIABLE_ID_LEN && key.bytes().all(|b| b.is_ascii_alphanumeric())
}

fn resolve_key<R: Resource>(key: &str) -> Result<(String, ParamKind), ApiError> {
    if let Some((name, kind)) = R::PARAMS.iter().find(|(name, _)| *name == key) {
        return Ok((name.to_string(), *kind));
    }
    if R::ACCEPTS_VARIABLES {
        if key.len() > VARIABLE_PREFIX.len() && key.starts_with(VARIABLE_PREFIX) {
            return Ok((key.to_string(), ParamKind::Str));
        }
        if is_variable_id(key) {
            return Ok((format!("{VARIABLE_PREFIX}{key}"), ParamKind::Str));
        }
    }
    Err(ApiError::InvalidParameter {
        resource: R::NAME,
        param: key.to_string(),
    })
}

fn coerce<R: Resource>(
    param: &str,
    kind: ParamKind,
    value: ParamValue,
) -> Result<ParamValue, ApiError> {
    let invalid = |reason: String| ApiError::InvalidParameterValue {
        resource: R::NAME,
        param: param.to_string(),
        reason,
    };
    match (kind, value) {
        (ParamKind::Str, value @ (ParamValue::Str(_) | ParamValue::List(_))) => Ok(value),
        (ParamKind::Str, ParamValue::Int(i)) => Ok(ParamValue::Str(i.to_string())),
        (ParamKind::Int, value @ ParamValue::Int(_)) => Ok(value),
        (ParamKind::Int, ParamValue::Str(s)) => s
            .trim()
            .parse()
            .map(ParamValue::Int)
            .map_err(|_| invalid(format!("expected an integer, got `{s}`"))),
        (ParamKind::Bool, value @ ParamValue::Bool(_)) => Ok(value),
        (ParamKind::Bool, ParamValue::Str(s)) => match s.as_str() {
            "true" => Ok(ParamValue::Bool(true)),
            "false" => Ok(ParamValue::Bool(false)),
            _ => Err(invalid(format!("expected `true` or `false`, got `{s}`"))),
        },
        (kind, value) => Err(invalid(format!(
            "expected {}, got {}",
            match kind {
                ParamKind::Str => "a string",
                ParamKind::Int => "an integer",
                ParamKind::Bool => "a boolean",
            },
            value.describe()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::tests::{client, FakeTransport};
    use crate::schema::{
        Direction, GamesParams, LeaderboardParams, PersonalBestsParams, RunStatusFilter,
        RunsParams, TimingMethod, UsersParams,
    };

    fn leaderboard_json() -> Value {
        json!({
            "weblink": "https://www.speedrun.com/mockodyssey#Any",
            "game": "o1y9okr6",
            "category": "zd3xmmvd",
            "video-only": false,
            "runs": [
                {"place": 1, "run": crate::schema::run::tests::run_json("aaa", "2023-01-01T00:00:00Z")}
            ],
            "links": []
        })
    }

    #[test]
    fn unknown_parameter_is_rejected_before_any_request() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        let err = client.query::<Games>().filter("speed", "fast").unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidParameter { resource: "Games", ref param } if param == "speed"
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn variable_shaped_keys_are_rejected_where_variables_are_not_accepted() {
        assert!(matches!(
            Query::<Games>::new().filter("68km3w4l", "zqoyz021"),
            Err(ApiError::InvalidParameter { .. })
        ));
        assert!(matches!(
            Query::<Users>::new().variable("68km3w4l", "zqoyz021"),
            Err(ApiError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn eight_character_keys_become_variable_filters() {
        let query = Query::<Runs>::new().filter("68km3w4l", "zqoyz021").unwrap();
        assert_eq!(
            query.parameters().get("var-68km3w4l"),
            Some(&ParamValue::Str("zqoyz021".into()))
        );
        assert!(!query.parameters().contains_key("68km3w4l"));

        let query = Query::<Leaderboards>::new()
            .filter("var-68km3w4l", "zqoyz021")
            .unwrap()
            .variable("wl33kewl", "4qye4731")
            .unwrap();
        assert!(query.parameters().contains_key("var-68km3w4l"));
        assert!(query.parameters().contains_key("var-wl33kewl"));
    }

    #[test]
    fn accepted_names_win_over_the_variable_rewrite() {
        let query = Query::<Runs>::new()
            .filter("category", "zd3xmmvd")
            .unwrap()
            .filter("platform", "8gej2n93")
            .unwrap()
            .filter("examiner", "8georwrj")
            .unwrap();
        assert_eq!(
            query.parameters().keys().collect::<Vec<_>>(),
            vec!["category", "examiner", "platform"]
        );
    }

    #[test]
    fn values_are_coerced_to_the_parameter_type() {
        let query = Query::<Runs>::new()
            .filter("max", "20")
            .unwrap()
            .filter("emulated", "false")
            .unwrap()
            .filter("game", 42)
            .unwrap();
        assert_eq!(query.parameters()["max"], ParamValue::Int(20));
        assert_eq!(query.parameters()["emulated"], ParamValue::Bool(false));
        assert_eq!(query.parameters()["game"], ParamValue::Str("42".into()));
    }

    #[test]
    fn uncoercible_values_are_rejected() {
        assert!(matches!(
            Query::<Runs>::new().filter("max", "lots"),
            Err(ApiError::InvalidParameterValue { resource: "Runs", .. })
        ));
        assert!(matches!(
            Query::<Runs>::new().filter("emulated", "yes"),
            Err(ApiError::InvalidParameterValue { .. })
        ));
        assert!(matches!(
            Query::<Runs>::new().filter("game", true),
            Err(ApiError::InvalidParameterValue { .. })
        ));
    }

    #[test]
    fn disjoint_filters_commute() {
        let a = Query::<Runs>::new()
            .filter("game", "o1y9okr6")
            .unwrap()
            .filter("status", "verified")
            .unwrap();
        let b = Query::<Runs>::new()
            .filter("status", "verified")
            .unwrap()
            .filter("game", "o1y9okr6")
            .unwrap();
        assert_eq!(a.parameters(), b.parameters());
    }

    #[test]
    fn later_filters_replace_earlier_ones() {
        let query = Query::<Runs>::new()
            .filters([("game", "o1y9okr6"), ("game", "3dxy5vv6")])
            .unwrap();
        assert_eq!(query.parameters()["game"], ParamValue::Str("3dxy5vv6".into()));
    }

    #[test]
    fn builder_calls_leave_the_original_untouched() {
        let base = Query::<Runs>::new().filter("game", "o1y9okr6").unwrap();
        let narrowed = base.clone().filter("status", "verified").unwrap();
        assert_eq!(base.parameters().len(), 1);
        assert_eq!(narrowed.parameters().len(), 2);
    }

    #[test]
    fn invalid_embed_is_rejected() {
        let err = Query::<Runs>::new().embed(["players", "moderators"]).unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidEmbed { resource: "Runs", ref embed } if embed == "moderators"
        ));
    }

    #[test]
    fn repeated_embeds_are_sent_once() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        let request = client
            .query::<Runs>()
            .embed(["game", "players"])
            .unwrap()
            .embed(["players", "category"])
            .unwrap()
            .build_all(&client)
            .unwrap();
        assert_eq!(request.query_value("embed"), Some("game,players,category"));
    }

    #[test]
    fn leaderboard_without_category_is_incomplete() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        let err = client
            .query::<Leaderboards>()
            .filter("game", "o1y9okr6")
            .unwrap()
            .all(&client)
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::IncompletePath {
                resource: "Leaderboards",
                param: "category"
            }
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn path_parameters_are_not_sent_as_query_pairs() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        let request = client
            .query::<Leaderboards>()
            .filter("game", "o1y9okr6")
            .unwrap()
            .filter("category", "zd3xmmvd")
            .unwrap()
            .filter("top", 3)
            .unwrap()
            .filter("68km3w4l", "zqoyz021")
            .unwrap()
            .build_all(&client)
            .unwrap();
        assert_eq!(
            request.url,
            "https://www.speedrun.com/api/v1/leaderboards/o1y9okr6/category/zd3xmmvd"
        );
        assert_eq!(
            request.query,
            vec![
                ("top".to_string(), "3".to_string()),
                ("var-68km3w4l".to_string(), "zqoyz021".to_string()),
            ]
        );
    }

    #[test]
    fn level_leaderboards_render_all_three_path_parameters() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        let request = client
            .query::<LevelLeaderboards>()
            .filters([("game", "o1y9okr6"), ("level", "xd1rxxrw"), ("category", "n2y3r8do")])
            .unwrap()
            .build_all(&client)
            .unwrap();
        assert_eq!(
            request.url,
            "https://www.speedrun.com/api/v1/leaderboards/o1y9okr6/level/xd1rxxrw/n2y3r8do"
        );
        assert!(request.query.is_empty());
    }

    #[test]
    fn list_values_are_comma_joined() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        let request = client
            .query::<Games>()
            .filter("platform", &["8gej2n93", "nzelreqp"][..])
            .unwrap()
            .filter("romhack", false)
            .unwrap()
            .build_all(&client)
            .unwrap();
        assert_eq!(request.query_value("platform"), Some("8gej2n93,nzelreqp"));
        assert_eq!(request.query_value("romhack"), Some("false"));
    }

    #[test]
    fn typed_params_go_through_the_same_validation() {
        let mut params = RunsParams {
            game: Some("o1y9okr6".into()),
            status: Some(RunStatusFilter::Verified),
            max: Some(50),
            ..Default::default()
        };
        params.variables.insert("68km3w4l".into(), "zqoyz021".into());
        let query = Query::<Runs>::new().params(&params).unwrap();
        assert_eq!(query.parameters()["status"], ParamValue::Str("verified".into()));
        assert_eq!(query.parameters()["max"], ParamValue::Int(50));
        assert!(query.parameters().contains_key("var-68km3w4l"));

        let params = LeaderboardParams {
            level: Some("xd1rxxrw".into()),
            timing: Some(TimingMethod::Ingame),
            ..Default::default()
        };
        assert!(matches!(
            Query::<Leaderboards>::new().params(&params),
            Err(ApiError::InvalidParameter { ref param, .. }) if param == "level"
        ));
        assert!(Query::<LevelLeaderboards>::new().params(&params).is_ok());
    }

    #[test]
    fn games_params_apply_every_field() {
        let params = GamesParams {
            name: Some("Mock".into()),
            abbreviation: Some("mockodyssey".into()),
            released: Some(2017),
            gametype: Some("rj1dy1o8".into()),
            platform: Some("8gej2n93".into()),
            region: Some("pr184lqn".into()),
            genre: Some("qdnqkn8k".into()),
            engine: Some("p85eo0y1".into()),
            developer: Some("8gej4v9n".into()),
            publisher: Some("ynpyl05n".into()),
            moderator: Some("8georwrj".into()),
            romhack: Some(false),
            bulk: Some(true),
            orderby: Some("released".into()),
            direction: Some(Direction::Desc),
            max: Some(100),
            offset: Some(200),
        };
        let query = Query::<Games>::new().params(&params).unwrap();
        assert_eq!(query.parameters().len(), 17);
        assert_eq!(query.parameters()["released"], ParamValue::Int(2017));
        assert_eq!(query.parameters()["bulk"], ParamValue::Bool(true));
        assert_eq!(query.parameters()["direction"], ParamValue::Str("desc".into()));
        assert_eq!(query.parameters()["offset"], ParamValue::Int(200));
    }

    #[test]
    fn users_params_apply_every_field() {
        let params = UsersParams {
            lookup: Some("runner".into()),
            name: Some("run".into()),
            twitch: Some("runner_tv".into()),
            hitbox: Some("runner_hb".into()),
            twitter: Some("runner_tw".into()),
            speedrunslive: Some("runner_srl".into()),
            orderby: Some("signup".into()),
            direction: Some(Direction::Asc),
            max: Some(10),
            offset: Some(0),
        };
        let transport = FakeTransport::default();
        let client = client(&transport);
        let request = client
            .query::<Users>()
            .params(&params)
            .unwrap()
            .build_all(&client)
            .unwrap();
        assert_eq!(request.url, "https://www.speedrun.com/api/v1/users");
        assert_eq!(request.query.len(), 10);
        assert_eq!(request.query_value("lookup"), Some("runner"));
        assert_eq!(request.query_value("speedrunslive"), Some("runner_srl"));
        assert_eq!(request.query_value("max"), Some("10"));
    }

    #[test]
    fn personal_bests_params_fill_the_path() {
        let params = PersonalBestsParams {
            user: Some("816w31rx".into()),
            top: Some(3),
            series: Some("rv7emz49".into()),
            game: Some("o1y9okr6".into()),
        };
        let transport = FakeTransport::default();
        let client = client(&transport);
        let request = client
            .query::<PersonalBests>()
            .params(&params)
            .unwrap()
            .build_all(&client)
            .unwrap();
        assert_eq!(
            request.url,
            "https://www.speedrun.com/api/v1/users/816w31rx/personal-bests"
        );
        assert_eq!(
            request.query,
            vec![
                ("game".to_string(), "o1y9okr6".to_string()),
                ("series".to_string(), "rv7emz49".to_string()),
                ("top".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn get_sends_only_the_embed_list() {
        let transport = FakeTransport::default();
        let client = client(&transport);
        let request = client
            .query::<Games>()
            .filter("name", "Mock Odyssey")
            .unwrap()
            .embed(["categories"])
            .unwrap()
            .build_get(&client, "o1y9okr6")
            .unwrap();
        assert_eq!(request.url, "https://www.speedrun.com/api/v1/games/o1y9okr6");
        assert_eq!(
            request.query,
            vec![("embed".to_string(), "categories".to_string())]
        );
    }

    #[test]
    fn all_decodes_the_collection() {
        let transport = FakeTransport::default();
        transport.respond_json(json!({"data": leaderboard_json()}));
        let client = client(&transport);
        let board = client
            .query::<Leaderboards>()
            .filters([("game", "o1y9okr6"), ("category", "zd3xmmvd")])
            .unwrap()
            .all(&client)
            .unwrap();
        assert_eq!(board.runs.len(), 1);
        assert_eq!(board.game.reference().map(String::as_str), Some("o1y9okr6"));
    }

    #[test]
    fn fetch_all_honors_options() {
        let transport = FakeTransport::default();
        let envelope = json!({"data": [], "pagination": {"offset": 0, "max": 20, "size": 0, "links": []}});
        transport
            .respond_json(envelope.clone())
            .respond_json(envelope.clone())
            .respond_json(envelope.clone());
        let client = client(&transport);
        let query = client.query::<Runs>();

        let raw = query
            .clone()
            .options(QueryOptions {
                validate: false,
                unwrap: false,
            })
            .fetch_all(&client)
            .unwrap();
        assert_eq!(raw, Response::Raw(envelope));

        let unwrapped = query
            .clone()
            .options(QueryOptions {
                validate: false,
                unwrap: true,
            })
            .fetch_all(&client)
            .unwrap();
        assert_eq!(unwrapped.raw(), Some(json!([])));

        let typed = query
            .options(QueryOptions {
                validate: true,
                unwrap: false,
            })
            .fetch_all(&client)
            .unwrap();
        assert_eq!(typed.typed().map(|runs| runs.len()), Some(0));
    }

    #[test]
    fn get_surfaces_not_found() {
        let transport = FakeTransport::default();
        transport.respond(404, r#"{"status":404,"message":"not found"}"#);
        let client = client(&transport);
        let err = client.query::<Users>().get(&client, "nobody").unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }
}
