use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::http::{self, RetryPolicy};

use super::{ResultSet, SearchProvider, SearchResult};

const SERVICE: &str = "web search";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Bing Web Search v7 style client: `GET <endpoint>?q=<query>`.
#[derive(Debug, Clone)]
pub struct BingClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BingAnswer {
    web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPages {
    web_search_url: Option<String>,
    total_estimated_matches: Option<u64>,
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPage {
    id: Option<String>,
    name: String,
    url: String,
    display_url: Option<String>,
    #[serde(default)]
    snippet: String,
    date_last_crawled: Option<String>,
    is_family_friendly: Option<bool>,
}

impl From<WebPage> for SearchResult {
    fn from(page: WebPage) -> Self {
        SearchResult {
            date_last_crawled: page.date_last_crawled.as_deref().and_then(parse_crawl_date),
            title: page.name,
            url: page.url,
            snippet: page.snippet,
            id: page.id,
            display_url: page.display_url,
            is_family_friendly: page.is_family_friendly,
        }
    }
}

// Crawl dates arrive with seven fractional digits and sometimes without an offset.
fn parse_crawl_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

impl BingClient {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self> {
        let client = http::build_client(timeout)
            .map_err(|e| Error::ConfigInvalid(format!("building HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            timeout,
            retry,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        http::transport_error(err, SERVICE, self.timeout, Error::SearchUnavailable)
    }
}

#[async_trait]
impl SearchProvider for BingClient {
    async fn search(&self, query: &str) -> Result<ResultSet> {
        let builder = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key);

        let response = http::send_with_retry(builder, &self.retry, SERVICE)
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::SearchUnavailable(format!("bad status: {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        let answer: BingAnswer = serde_json::from_str(&body)
            .map_err(|e| Error::SearchMalformed(format!("unmarshaling response: {e}")))?;

        let result_set = match answer.web_pages {
            Some(pages) => ResultSet {
                results: pages.value.into_iter().map(SearchResult::from).collect(),
                total_estimated_matches: pages.total_estimated_matches,
                web_search_url: pages.web_search_url,
            },
            None => ResultSet::default(),
        };

        tracing::debug!(
            results = result_set.len(),
            total_estimated_matches = ?result_set.total_estimated_matches,
            "search complete"
        );

        Ok(result_set)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer, retry: RetryPolicy) -> BingClient {
        BingClient::new(
            &format!("{}/v7.0/search", server.uri()),
            "sub-key",
            Duration::from_secs(5),
            retry,
        )
        .unwrap()
    }

    fn page(n: usize) -> serde_json::Value {
        json!({
            "id": format!("https://api.bing.microsoft.com/api/v7/#WebPages.{n}"),
            "name": format!("Result {n}"),
            "url": format!("https://example.com/{n}"),
            "displayUrl": format!("example.com/{n}"),
            "isFamilyFriendly": true,
            "snippet": format!("Snippet {n}"),
            "dateLastCrawled": "2024-05-10T08:03:00.0000000Z"
        })
    }

    #[tokio::test]
    async fn returns_every_entry_in_provider_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v7.0/search"))
            .and(query_param("q", "after:2023 (Bajaj Auto AND EBITDA)"))
            .and(header(SUBSCRIPTION_KEY_HEADER, "sub-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_type": "SearchResponse",
                "queryContext": {"originalQuery": "after:2023 (Bajaj Auto AND EBITDA)"},
                "webPages": {
                    "webSearchUrl": "https://www.bing.com/search?q=bajaj",
                    "totalEstimatedMatches": 1234,
                    "value": [page(0), page(1), page(2)]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = client(&server, RetryPolicy::none())
            .search("after:2023 (Bajaj Auto AND EBITDA)")
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        let titles: Vec<&str> = results.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Result 0", "Result 1", "Result 2"]);
        assert_eq!(results.results[2].url, "https://example.com/2");
        assert_eq!(results.results[1].snippet, "Snippet 1");
        assert_eq!(results.total_estimated_matches, Some(1234));
        assert!(results.results[0].date_last_crawled.is_some());
    }

    #[tokio::test]
    async fn missing_web_pages_is_an_empty_result_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"_type": "SearchResponse"})),
            )
            .mount(&server)
            .await;

        let results = client(&server, RetryPolicy::none()).search("nothing").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn server_error_is_search_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, RetryPolicy::none())
            .search("tata motors")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SearchUnavailable(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn server_error_is_retried_up_to_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let err = client(&server, retry).search("tata motors").await.unwrap_err();
        assert!(matches!(err, Error::SearchUnavailable(_)));
    }

    #[tokio::test]
    async fn unparseable_body_is_search_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "webPages": {"value": [{"snippet": "no name or url"}]}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = client(&server, RetryPolicy::none());
        let missing_fields = client.search("q").await.unwrap_err();
        assert!(matches!(missing_fields, Error::SearchMalformed(_)));

        let not_json = client.search("q").await.unwrap_err();
        assert!(matches!(not_json, Error::SearchMalformed(_)));
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let err = client(&server, retry).search("q").await.unwrap_err();
        assert!(matches!(err, Error::SearchUnavailable(msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn non_ok_success_status_is_search_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(203).set_body_json(json!({
                "webPages": {"value": [page(0)]}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client(&server, RetryPolicy::none());
        let partial = client.search("q").await.unwrap_err();
        assert!(matches!(partial, Error::SearchUnavailable(msg) if msg.contains("203")));

        let no_content = client.search("q").await.unwrap_err();
        assert!(matches!(no_content, Error::SearchUnavailable(msg) if msg.contains("204")));
    }

    #[tokio::test]
    async fn slow_search_reports_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"webPages": {"value": []}})),
            )
            .mount(&server)
            .await;

        let client = BingClient::new(
            &server.uri(),
            "sub-key",
            Duration::from_millis(50),
            RetryPolicy::none(),
        )
        .unwrap();

        let err = client.search("q").await.unwrap_err();
        assert!(matches!(err, Error::Timeout { service: SERVICE, .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_search_unavailable_after_retries() {
        let server = MockServer::start().await;
        let endpoint = server.uri();
        drop(server);

        let retry = RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        };
        let client = BingClient::new(&endpoint, "sub-key", Duration::from_secs(2), retry).unwrap();

        let err = client.search("q").await.unwrap_err();
        assert!(matches!(err, Error::SearchUnavailable(msg) if msg.contains("sending request")));
    }

    #[test]
    fn crawl_dates_parse_with_and_without_offset() {
        assert!(parse_crawl_date("2024-05-10T08:03:00.0000000Z").is_some());
        assert!(parse_crawl_date("2024-05-10T08:03:00.0000000").is_some());
        assert!(parse_crawl_date("yesterday").is_none());
    }
}
