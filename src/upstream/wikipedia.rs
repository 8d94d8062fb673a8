use reqwest::{Url, header};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{UpstreamError, excerpt};
use crate::metrics::UPSTREAM_LATENCY;

const USER_AGENT: &str = "WikiImageApp/1.0 (https://wimage.pages.dev; educational project)";
const PREVIEW_LINES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCheck {
    pub exists: bool,
    pub page_id: Option<u64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleText {
    pub title: Option<String>,
    pub text: String,
    pub preview: String,
}

#[derive(Deserialize)]
struct QueryEnvelope {
    query: Option<QueryBody>,
}

#[derive(Deserialize)]
struct QueryBody {
    pages: Option<Map<String, Value>>,
}

#[derive(Deserialize, Default)]
struct Page {
    pageid: Option<u64>,
    title: Option<String>,
    // present (as "" in the legacy format) when the title has no article
    missing: Option<Value>,
    extract: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: reqwest::Client,
    base_url: String,
}

impl WikipediaClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn article_url(&self, title: &str) -> String {
        format!(
            "{}/wiki/{}",
            self.base_url,
            urlencoding::encode(&title.replace(' ', "_"))
        )
    }

    /// Does an article with exactly this title exist?
    pub async fn check_term(&self, term: &str) -> Result<TermCheck, UpstreamError> {
        let _timer = UPSTREAM_LATENCY.with_label_values(&["wikipedia"]).start_timer();
        let response = self
            .client
            .get(format!("{}/w/api.php", self.base_url))
            .query(&[
                ("action", "query"),
                ("titles", term),
                ("format", "json"),
                ("origin", "*"),
            ])
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(term, status = status.as_u16(), body = excerpt(&text, 200), "Wikipedia API error");
            return Err(UpstreamError::Malformed(format!(
                "Wikipedia API error: {}",
                status.as_u16()
            )));
        }

        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        if !is_json {
            let text = response.text().await.unwrap_or_default();
            error!(term, body = excerpt(&text, 200), "non-JSON Wikipedia response");
            return Err(UpstreamError::Malformed(
                "Wikipedia API returned non-JSON response".to_string(),
            ));
        }

        let envelope: QueryEnvelope = response.json().await?;
        let (page_key, page) = first_page(envelope)
            .ok_or_else(|| UpstreamError::Malformed("Invalid Wikipedia API response".to_string()))?;

        let exists = page_key != "-1" && page.missing.is_none();
        debug!(term, exists, "Wikipedia lookup");

        Ok(TermCheck {
            exists,
            page_id: page.pageid.filter(|_| exists),
            url: exists.then(|| self.article_url(page.title.as_deref().unwrap_or(term))),
        })
    }

    // Any language edition of Wikipedia, or the configured wiki itself
    fn is_known_wiki(&self, url: &Url) -> bool {
        let wikipedia = matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|host| host == "wikipedia.org" || host.ends_with(".wikipedia.org"));
        wikipedia
            || Url::parse(&self.base_url).is_ok_and(|base| base.origin() == url.origin())
    }

    /// Plain-text extract for an article url such as `https://en.wikipedia.org/wiki/Paris`.
    /// The API of the url's own wiki is queried.
    pub async fn fetch_text(&self, article_url: &str) -> Result<ArticleText, UpstreamError> {
        let (api_url, title) = extract_api_target(article_url)
            .ok_or_else(|| UpstreamError::Malformed("Invalid Wikipedia URL format".to_string()))?;
        if !self.is_known_wiki(&api_url) {
            return Err(UpstreamError::Malformed("Not a Wikipedia URL".to_string()));
        }

        let _timer = UPSTREAM_LATENCY.with_label_values(&["wikipedia"]).start_timer();
        let response = self
            .client
            .get(api_url)
            .query(&[
                ("action", "query"),
                ("prop", "extracts"),
                ("titles", title.as_str()),
                ("format", "json"),
                ("explaintext", "true"),
                ("origin", "*"),
            ])
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status("Wikipedia", status, &text));
        }

        let envelope: QueryEnvelope = response.json().await?;
        let page = first_page(envelope).map(|(_, page)| page).unwrap_or_default();
        let text = page.extract.unwrap_or_default();

        Ok(ArticleText {
            title: page.title,
            preview: preview(&text),
            text,
        })
    }
}

fn first_page(envelope: QueryEnvelope) -> Option<(String, Page)> {
    let (key, value) = envelope.query?.pages?.into_iter().next()?;
    let page = serde_json::from_value(value).ok()?;
    Some((key, page))
}

// "<origin>/wiki/<title>" -> ("<origin>/w/api.php", decoded title)
fn extract_api_target(article_url: &str) -> Option<(Url, String)> {
    let url = Url::parse(article_url).ok()?;
    let raw_title = url.path().strip_prefix("/wiki/")?;
    if raw_title.is_empty() {
        return None;
    }
    let title = urlencoding::decode(raw_title).ok()?.into_owned();
    let api = url.join("/w/api.php").ok()?;
    Some((api, title))
}

fn preview(text: &str) -> String {
    text.split('\n').take(PREVIEW_LINES).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[test]
    fn api_target_from_article_url() {
        let (api, title) = extract_api_target("https://de.wikipedia.org/wiki/Caf%C3%A9_Central").unwrap();
        assert_eq!(api.as_str(), "https://de.wikipedia.org/w/api.php");
        assert_eq!(title, "Café_Central");
    }

    #[test]
    fn non_article_urls_are_rejected() {
        assert!(extract_api_target("https://en.wikipedia.org/w/index.php?title=Paris").is_none());
        assert!(extract_api_target("https://en.wikipedia.org/wiki/").is_none());
        assert!(extract_api_target("not a url").is_none());
    }

    #[test]
    fn preview_keeps_first_five_lines() {
        let text = "1\n2\n3\n4\n5\n6\n7";
        assert_eq!(preview(text), "1\n2\n3\n4\n5");
        assert_eq!(preview("only"), "only");
    }

    #[tokio::test]
    async fn existing_term_yields_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Eiffel Tower"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "batchcomplete": "",
                "query": { "pages": { "9232": { "pageid": 9232, "ns": 0, "title": "Eiffel Tower" } } }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), server.uri());
        let check = client.check_term("Eiffel Tower").await.unwrap();

        assert!(check.exists);
        assert_eq!(check.page_id, Some(9232));
        assert_eq!(check.url, Some(format!("{}/wiki/Eiffel_Tower", server.uri())));
    }

    #[tokio::test]
    async fn missing_term_has_no_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": { "-1": { "ns": 0, "title": "Zzzxxqq", "missing": "" } } }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), server.uri());
        let check = client.check_term("Zzzxxqq").await.unwrap();

        assert_eq!(
            check,
            TermCheck {
                exists: false,
                page_id: None,
                url: None
            }
        );
    }

    #[tokio::test]
    async fn html_reply_is_reported_as_non_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), server.uri());
        let err = client.check_term("Paris").await.unwrap_err();
        assert_eq!(err.to_string(), "Wikipedia API returned non-JSON response");
    }

    #[tokio::test]
    async fn server_error_is_reported_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), server.uri());
        let err = client.check_term("Paris").await.unwrap_err();
        assert_eq!(err.to_string(), "Wikipedia API error: 503");
    }

    #[tokio::test]
    async fn fetch_text_queries_the_article_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("prop", "extracts"))
            .and(query_param("titles", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": { "22989": {
                    "pageid": 22989,
                    "title": "Paris",
                    "extract": "Paris is the capital of France.\nLine 2"
                } } }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), server.uri());
        let article = client
            .fetch_text(&format!("{}/wiki/Paris", server.uri()))
            .await
            .unwrap();

        assert_eq!(article.title.as_deref(), Some("Paris"));
        assert_eq!(article.text, "Paris is the capital of France.\nLine 2");
        assert_eq!(article.preview, article.text);
    }

    #[tokio::test]
    async fn fetch_text_refuses_hosts_outside_wikipedia() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), "https://en.wikipedia.org");
        let err = client
            .fetch_text(&format!("{}/wiki/Paris", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Not a Wikipedia URL");
    }

    #[test]
    fn any_wikipedia_edition_is_known() {
        let client = WikipediaClient::new(reqwest::Client::new(), "https://en.wikipedia.org");
        let known = |raw: &str| client.is_known_wiki(&Url::parse(raw).unwrap());

        assert!(known("https://de.wikipedia.org/w/api.php"));
        assert!(known("https://en.m.wikipedia.org/w/api.php"));
        assert!(!known("https://wikipedia.org.evil.example/w/api.php"));
        assert!(!known("http://169.254.169.254/w/api.php"));
        assert!(!known("file:///etc/wikipedia.org"));
    }

    #[tokio::test]
    async fn empty_extract_keeps_the_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "query": { "pages": { "77": { "pageid": 77, "title": "Stub", "extract": "" } } }
            })))
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), server.uri());
        let article = client
            .fetch_text(&format!("{}/wiki/Stub", server.uri()))
            .await
            .unwrap();

        assert_eq!(article.title.as_deref(), Some("Stub"));
        assert!(article.text.is_empty());
    }

    #[tokio::test]
    async fn reply_without_pages_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "batchcomplete": "" })),
            )
            .mount(&server)
            .await;

        let client = WikipediaClient::new(reqwest::Client::new(), server.uri());
        let err = client.check_term("Paris").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid Wikipedia API response");
    }
}
