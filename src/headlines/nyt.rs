use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{IngestError, IngestResult};
use crate::model::{Headline, Period};

use super::{get_json, parse_publication_date};

pub const NYT_ALIAS: &str = "New York Times";

const ARCHIVE_URL: &str = "https://api.nytimes.com/svc/archive/v1";

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    response: ArchiveBody,
}

#[derive(Debug, Deserialize)]
struct ArchiveBody {
    #[serde(default)]
    docs: Vec<ArchiveDoc>,
}

#[derive(Debug, Deserialize)]
struct ArchiveDoc {
    pub_date: Option<String>,
    headline: Option<ArchiveHeadline>,
}

#[derive(Debug, Deserialize)]
struct ArchiveHeadline {
    main: Option<String>,
}

pub(super) fn fetch(http: &Client, period: Period, api_key: &str) -> IngestResult<Vec<Headline>> {
    let url = format!("{ARCHIVE_URL}/{}/{}.json", period.year, period.month);
    let body = get_json(http, NYT_ALIAS, &url, &[("api-key", api_key.to_string())])?;
    let headlines = parse_nyt_archive(body)?;

    info!(source = NYT_ALIAS, period = %period, headlines = headlines.len(), "fetched headlines");
    Ok(headlines)
}

pub fn parse_nyt_archive(body: serde_json::Value) -> IngestResult<Vec<Headline>> {
    let archive: ArchiveResponse =
        serde_json::from_value(body).map_err(|err| IngestError::UpstreamFetch {
            source_alias: NYT_ALIAS.to_string(),
            reason: format!("unexpected archive payload: {err}"),
        })?;

    let total = archive.response.docs.len();
    let headlines: Vec<Headline> = archive
        .response
        .docs
        .into_iter()
        .filter_map(|doc| {
            let publication_date = parse_publication_date(doc.pub_date.as_deref()?)?;
            let headline = doc.headline?.main?.trim().to_string();
            (!headline.is_empty()).then_some(Headline {
                publication_date,
                headline,
            })
        })
        .collect();

    if headlines.len() < total {
        warn!(
            source = NYT_ALIAS,
            skipped = total - headlines.len(),
            "skipped archive documents without date or headline"
        );
    }

    Ok(headlines)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_nyt_archive_reads_main_headlines() {
        let body = json!({
            "copyright": "Copyright (c) 2022 The New York Times Company. All Rights Reserved.",
            "response": {
                "meta": { "hits": 3 },
                "docs": [
                    {
                        "abstract": "Test abstract",
                        "pub_date": "2022-09-01T04:00:07+0000",
                        "headline": { "main": "Test Headline", "kicker": null }
                    },
                    { "pub_date": "2022-09-02T04:00:07+0000", "headline": { "main": "  " } },
                    { "headline": { "main": "Undated" } }
                ]
            }
        });

        let headlines = parse_nyt_archive(body).expect("parse archive");
        assert_eq!(
            headlines,
            vec![Headline {
                publication_date: NaiveDate::from_ymd_opt(2022, 9, 1).expect("date"),
                headline: "Test Headline".to_string(),
            }]
        );
    }

    #[test]
    fn parse_nyt_archive_rejects_unexpected_shape() {
        let err = parse_nyt_archive(json!({ "fault": "invalid key" })).expect_err("bad payload");
        assert!(matches!(err, IngestError::UpstreamFetch { .. }));
    }
}
