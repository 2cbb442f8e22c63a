use serde::{Deserialize, Serialize};
use url::Url;

use super::common::Link;
use crate::error::ApiError;

/// The `{"data": ..., "pagination": ...}` wrapper around every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    /// Offset of the next page, or `None` on the last page.
    pub fn next_offset(&self) -> Result<Option<u64>, ApiError> {
        match &self.pagination {
            Some(pagination) => pagination.next_offset(),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub offset: u64,
    pub max: u64,
    pub size: u64,
    pub links: Vec<Link>,
}

impl Pagination {
    pub fn next_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == "next")
    }

    /// Reads `offset` from the query string of the `next` link.
    pub fn next_offset(&self) -> Result<Option<u64>, ApiError> {
        let Some(link) = self.next_link() else {
            return Ok(None);
        };
        let uri = Url::parse(&link.uri).map_err(|e| {
            ApiError::DeserializationError(format!("bad next link {}: {e}", link.uri))
        })?;
        uri.query_pairs()
            .find(|(key, _)| key == "offset")
            .and_then(|(_, value)| value.parse().ok())
            .map(Some)
            .ok_or_else(|| {
                ApiError::DeserializationError(format!("next link {} has no offset", link.uri))
            })
    }
}
