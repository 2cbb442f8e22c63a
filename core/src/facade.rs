//! Convenience accessors built on the query builder.
//!
//! These are inherent methods on [`SpeedrunClient`] covering the common
//! lookups: the newest verified run of a game, every run verified since a
//! point in time, a leaderboard snapshot, a game's icon and its variables.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::SpeedrunClient;
use crate::error::ApiError;
use crate::query::{
    resource, GameVariables, Games, Leaderboards, Query, QueryOptions, Response, Runs,
};
use crate::schema::{
    Direction, Envelope, LeaderboardEntry, LeaderboardParams, NewRun, Run, RunOrder,
    RunStatusFilter, RunsParams, Variable,
};
use crate::transport::Transport;

/// Page size used when walking verified runs.
pub const RUNS_PAGE_SIZE: u32 = 200;

impl<T: Transport> SpeedrunClient<T> {
    /// The most recently verified run of `game`.
    pub fn latest_run(&self, game: &str) -> Result<Run, ApiError> {
        let params = RunsParams {
            game: Some(game.to_string()),
            status: Some(RunStatusFilter::Verified),
            orderby: Some(RunOrder::VerifyDate),
            direction: Some(Direction::Desc),
            max: Some(1),
            ..Default::default()
        };
        self.query::<Runs>()
            .params(&params)?
            .embed(["game", "category", "variables", "players", "level"])?
            .all(self)?
            .into_iter()
            .next()
            .ok_or(ApiError::NotFound)
    }

    /// Verified runs of `game`, oldest first.
    ///
    /// With `since`, only runs verified strictly after it are yielded; pages
    /// are read newest-first until an older run shows up, so the whole
    /// result is fetched on the first call to `next`. Without `since`, every
    /// verified run is streamed page by page in ascending verify order.
    pub fn verified_runs_since(
        &self,
        game: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<VerifiedRuns<'_, T>, ApiError> {
        let params = RunsParams {
            game: Some(game.to_string()),
            status: Some(RunStatusFilter::Verified),
            orderby: Some(RunOrder::VerifyDate),
            direction: Some(if since.is_some() {
                Direction::Desc
            } else {
                Direction::Asc
            }),
            max: Some(RUNS_PAGE_SIZE),
            ..Default::default()
        };
        let query = self
            .query::<Runs>()
            .params(&params)?
            .embed(["game", "category", "players", "level"])?
            .options(QueryOptions {
                validate: false,
                unwrap: false,
            });
        Ok(VerifiedRuns {
            client: self,
            query,
            since,
            cursor: Cursor::Start,
            buffer: VecDeque::new(),
        })
    }

    /// Entries of the full-game leaderboard of `game`/`category`.
    ///
    /// `subcategories` maps variable ids to value ids; `as_of` shows the
    /// board as it was at that moment.
    pub fn leaderboard(
        &self,
        game: &str,
        category: &str,
        subcategories: &BTreeMap<String, String>,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let params = LeaderboardParams {
            game: Some(game.to_string()),
            category: Some(category.to_string()),
            date: as_of.map(|date| date.to_rfc3339_opts(SecondsFormat::Secs, true)),
            variables: subcategories.clone(),
            ..Default::default()
        };
        Ok(self.query::<Leaderboards>().params(&params)?.all(self)?.runs)
    }

    pub fn game_icon_url(&self, game: &str) -> Result<Option<String>, ApiError> {
        let game = self.query::<Games>().get(self, game)?;
        Ok(game.icon_url().map(str::to_string))
    }

    /// Variables of `game` keyed by id. Failures are logged and yield an
    /// empty map.
    pub fn game_variables(&self, game: &str) -> BTreeMap<String, Variable> {
        let result = self
            .query::<GameVariables>()
            .filter("game", game)
            .and_then(|query| query.all(self));
        match result {
            Ok(variables) => variables
                .into_iter()
                .map(|variable| (variable.id.clone(), variable))
                .collect(),
            Err(err) => {
                warn!(game, error = %err, "could not fetch game variables");
                BTreeMap::new()
            }
        }
    }

    /// Submit a run. The client must be configured with an API key.
    pub fn submit_run(&self, run: &NewRun) -> Result<Run, ApiError> {
        #[derive(Serialize)]
        struct Submission<'a> {
            run: &'a NewRun,
        }

        let created = self.post(&["runs".to_string()], &Submission { run }, true)?;
        resource::decode_record(created)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Start,
    Offset(u64),
    Done,
}

/// Lazy iterator returned by [`SpeedrunClient::verified_runs_since`].
///
/// Nothing is fetched before the first call to `next`. The first error is
/// yielded once, after which the iterator is exhausted.
pub struct VerifiedRuns<'a, T> {
    client: &'a SpeedrunClient<T>,
    query: Query<Runs>,
    since: Option<DateTime<Utc>>,
    cursor: Cursor,
    buffer: VecDeque<Run>,
}

impl<T: Transport> VerifiedRuns<'_, T> {
    fn page(&self, offset: Option<u64>) -> Result<Envelope<Vec<Run>>, ApiError> {
        let query = match offset {
            Some(offset) => self.query.clone().filter("offset", offset.to_string())?,
            None => self.query.clone(),
        };
        debug!(?offset, "fetching page of verified runs");
        let value = match query.fetch_all(self.client)? {
            Response::Raw(value) => value,
            Response::Typed(runs) => return Ok(Envelope { data: runs, pagination: None }),
        };
        serde_json::from_value(value).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// Collect every run newer than `since`, newest page first.
    fn fill_since(&mut self, since: DateTime<Utc>) -> Result<(), ApiError> {
        let mut collected = Vec::new();
        let mut offset = None;
        'pages: loop {
            let mut page = self.page(offset)?;
            for run in std::mem::take(&mut page.data) {
                if !run.verify_date().is_some_and(|date| date > since) {
                    break 'pages;
                }
                collected.push(run);
            }
            match page.next_offset()? {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        debug!(runs = collected.len(), %since, "collected runs verified since");
        self.buffer.extend(collected.into_iter().rev());
        self.cursor = Cursor::Done;
        Ok(())
    }

    fn fill_next_page(&mut self, offset: Option<u64>) -> Result<(), ApiError> {
        let page = self.page(offset)?;
        self.cursor = match page.next_offset()? {
            Some(next) => Cursor::Offset(next),
            None => Cursor::Done,
        };
        self.buffer.extend(page.data);
        Ok(())
    }

    fn fill(&mut self) -> Result<(), ApiError> {
        match (self.cursor, self.since) {
            (Cursor::Done, _) => Ok(()),
            (Cursor::Start, Some(since)) => self.fill_since(since),
            (Cursor::Start, None) => self.fill_next_page(None),
            (Cursor::Offset(offset), _) => self.fill_next_page(Some(offset)),
        }
    }
}

impl<T: Transport> Iterator for VerifiedRuns<'_, T> {
    type Item = Result<Run, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(run) = self.buffer.pop_front() {
                return Some(Ok(run));
            }
            if self.cursor == Cursor::Done {
                return None;
            }
            if let Err(err) = self.fill() {
                self.cursor = Cursor::Done;
                self.buffer.clear();
                return Some(Err(err));
            }
        }
    }
}
