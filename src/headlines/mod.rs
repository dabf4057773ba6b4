mod guardian;
mod nyt;

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;

use crate::error::{IngestError, IngestResult};
use crate::model::{Headline, Period};

use guardian::GUARDIAN_ALIAS;
use nyt::NYT_ALIAS;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsSource {
    NewYorkTimes,
    Guardian,
}

impl NewsSource {
    pub fn alias(self) -> &'static str {
        match self {
            Self::NewYorkTimes => NYT_ALIAS,
            Self::Guardian => GUARDIAN_ALIAS,
        }
    }
}

pub struct HeadlineClient {
    http: Client,
}

impl HeadlineClient {
    pub fn new() -> IngestResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("nuada/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| IngestError::Configuration(format!("failed to build http client: {err}")))?;
        Ok(Self { http })
    }

    pub fn fetch_headlines(
        &self,
        source: NewsSource,
        period: Period,
        api_key: &str,
    ) -> IngestResult<Vec<Headline>> {
        if api_key.trim().is_empty() {
            return Err(IngestError::Configuration(format!(
                "missing API key for {}",
                source.alias()
            )));
        }

        match source {
            NewsSource::NewYorkTimes => nyt::fetch(&self.http, period, api_key),
            NewsSource::Guardian => guardian::fetch(&self.http, period, api_key),
        }
    }
}

fn get_json(
    http: &Client,
    alias: &str,
    url: &str,
    query: &[(&str, String)],
) -> IngestResult<serde_json::Value> {
    let upstream = |reason: String| IngestError::UpstreamFetch {
        source_alias: alias.to_string(),
        reason,
    };

    let response = http
        .get(url)
        .query(query)
        .send()
        .map_err(|err| upstream(err.without_url().to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(upstream(format!("HTTP {status}")));
    }

    response
        .json::<serde_json::Value>()
        .map_err(|err| upstream(format!("invalid json body: {}", err.without_url())))
}

fn parse_publication_date(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}
