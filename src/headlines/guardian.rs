use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{IngestError, IngestResult};
use crate::model::{Headline, Period};

use super::{get_json, parse_publication_date};

pub const GUARDIAN_ALIAS: &str = "Guardian";

const SEARCH_URL: &str = "https://content.guardianapis.com/search";
const PAGE_SIZE: u32 = 200;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    status: Option<String>,
    #[serde(default)]
    pages: u32,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(rename = "webPublicationDate")]
    web_publication_date: Option<String>,
    #[serde(rename = "webTitle")]
    web_title: Option<String>,
}

pub(super) fn fetch(http: &Client, period: Period, api_key: &str) -> IngestResult<Vec<Headline>> {
    let headlines = collect_pages(|page| {
        let query = [
            ("from-date", period.first_day().to_string()),
            ("to-date", period.last_day().to_string()),
            ("order-by", "oldest".to_string()),
            ("page-size", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("api-key", api_key.to_string()),
        ];
        parse_guardian_page(get_json(http, GUARDIAN_ALIAS, SEARCH_URL, &query)?)
    })?;

    info!(source = GUARDIAN_ALIAS, period = %period, headlines = headlines.len(), "fetched headlines");
    Ok(headlines)
}

fn collect_pages<F>(mut fetch_page: F) -> IngestResult<Vec<Headline>>
where
    F: FnMut(u32) -> IngestResult<(Vec<Headline>, u32)>,
{
    let mut headlines = Vec::new();
    let mut page = 1_u32;

    loop {
        let (mut batch, pages) = fetch_page(page)?;
        debug!(page, pages, results = batch.len(), "fetched guardian page");
        headlines.append(&mut batch);

        if page >= pages {
            break;
        }
        page += 1;
    }

    Ok(headlines)
}

pub fn parse_guardian_page(body: serde_json::Value) -> IngestResult<(Vec<Headline>, u32)> {
    let upstream = |reason: String| IngestError::UpstreamFetch {
        source_alias: GUARDIAN_ALIAS.to_string(),
        reason,
    };

    let search: SearchResponse = serde_json::from_value(body)
        .map_err(|err| upstream(format!("unexpected search payload: {err}")))?;

    if let Some(status) = search.response.status.as_deref().filter(|status| *status != "ok") {
        return Err(upstream(format!("search returned status {status:?}")));
    }

    let headlines = search
        .response
        .results
        .into_iter()
        .filter_map(|result| {
            let publication_date =
                parse_publication_date(result.web_publication_date.as_deref()?)?;
            let headline = result.web_title?.trim().to_string();
            (!headline.is_empty()).then_some(Headline {
                publication_date,
                headline,
            })
        })
        .collect();

    Ok((headlines, search.response.pages))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn page_of(page: u32) -> Vec<Headline> {
        vec![Headline {
            publication_date: NaiveDate::from_ymd_opt(2022, 9, page).expect("date"),
            headline: format!("headline {page}"),
        }]
    }

    #[test]
    fn collect_pages_stops_at_reported_page_count() {
        for (pages, expected_calls) in [(0, 1), (1, 1), (3, 3)] {
            let mut requested = Vec::new();
            let headlines = collect_pages(|page| {
                requested.push(page);
                Ok((page_of(page), pages))
            })
            .expect("collect pages");

            let expected: Vec<u32> = (1..=expected_calls).collect();
            assert_eq!(requested, expected, "pages = {pages}");
            assert_eq!(headlines.len(), expected_calls as usize);
        }
    }

    #[test]
    fn collect_pages_propagates_page_failure() {
        let err = collect_pages(|page| {
            if page == 2 {
                Err(IngestError::UpstreamFetch {
                    source_alias: GUARDIAN_ALIAS.to_string(),
                    reason: "HTTP 500".to_string(),
                })
            } else {
                Ok((page_of(page), 3))
            }
        })
        .expect_err("second page fails");
        assert!(matches!(err, IngestError::UpstreamFetch { .. }));
    }

    #[test]
    fn parse_guardian_page_reads_titles_and_page_count() {
        let body = json!({
            "response": {
                "status": "ok",
                "total": 401,
                "currentPage": 1,
                "pages": 3,
                "results": [
                    {
                        "webPublicationDate": "2022-09-01T05:00:12Z",
                        "webTitle": "Banana shortage looms"
                    },
                    { "webTitle": "No date" }
                ]
            }
        });

        let (headlines, pages) = parse_guardian_page(body).expect("parse page");
        assert_eq!(pages, 3);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].headline, "Banana shortage looms");
    }

    #[test]
    fn parse_guardian_page_rejects_error_status() {
        let body = json!({ "response": { "status": "error", "message": "Invalid API key" } });
        let err = parse_guardian_page(body).expect_err("error status");
        assert!(matches!(err, IngestError::UpstreamFetch { .. }));
    }
}
