use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use scraper::Selector;
use spider_client::shapes::request::{RequestType, ReturnFormat, ReturnFormatHandling};
use spider_client::{RequestParams, Spider};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::parser;

const BASE_BACKOFF_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("no rows matching `{selector}` after {waited:?}")]
    RowWaitTimeout { selector: String, waited: Duration },

    #[error("renderer unavailable: {0}")]
    Unavailable(String),
}

/// A browser-like session that can load a page and hand back its DOM.
///
/// One session is shared across all leagues, so calls are strictly
/// sequential: `navigate`, then `wait_for_rows`, then `content`.
#[async_trait]
pub trait Renderer: Send {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    async fn wait_for_rows(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Serialized HTML of the current document.
    async fn content(&mut self) -> Result<String, RenderError>;

    async fn close(&mut self) -> Result<(), RenderError> {
        Ok(())
    }
}

fn row_selector(selector: &str) -> Result<Selector, RenderError> {
    Selector::parse(selector)
        .map_err(|e| RenderError::Unavailable(format!("bad row selector `{}`: {}", selector, e)))
}

// ── Live rendering via spider.cloud ──

/// Desktop Chrome identity sent with every live render.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Remote headless Chrome through the spider.cloud API. Each navigation is a
/// full render; the returned raw HTML is the post-script DOM.
pub struct SpiderRenderer {
    spider: Spider,
    user_agent: String,
    current: Option<(String, String)>, // (url, html)
    renders: usize,
}

impl SpiderRenderer {
    pub fn connect(user_agent: impl Into<String>) -> Result<Self, RenderError> {
        let api_key = std::env::var("SPIDER_API_KEY")
            .map_err(|_| RenderError::Unavailable("SPIDER_API_KEY environment variable must be set".into()))?;
        let spider = Spider::new(Some(api_key))
            .map_err(|e| RenderError::Unavailable(format!("Failed to create Spider client: {}", e)))?;
        Ok(Self {
            spider,
            user_agent: user_agent.into(),
            current: None,
            renders: 0,
        })
    }

    async fn render(&mut self, url: &str, timeout: Duration) -> Result<String, RenderError> {
        let params = RequestParams {
            request: Some(RequestType::Chrome),
            return_format: Some(ReturnFormatHandling::Single(ReturnFormat::Raw)),
            user_agent: Some(self.user_agent.clone()),
            ..Default::default()
        };

        let start = Instant::now();
        let response = tokio::time::timeout(
            timeout,
            self.spider.scrape_url(url, Some(params), "application/json"),
        )
        .await
        .map_err(|_| navigation(url, format!("timed out after {:?}", timeout)))?
        .map_err(|e| navigation(url, e.to_string()))?;
        self.renders += 1;

        let html = page_html(url, response)?;
        debug!(
            "Rendered {} ({} bytes, {} ms)",
            url,
            html.len(),
            start.elapsed().as_millis()
        );
        Ok(html)
    }
}

/// Pull the rendered page out of a spider response. The payload is an array
/// of page objects, sometimes delivered as a JSON string.
fn page_html(url: &str, response: serde_json::Value) -> Result<String, RenderError> {
    let parsed: serde_json::Value = match response.as_str() {
        Some(s) => serde_json::from_str(s).unwrap_or(response.clone()),
        None => response,
    };
    let first = parsed.as_array().and_then(|arr| arr.first());

    let status = first
        .and_then(|obj| obj.get("status"))
        .and_then(|s| s.as_i64());
    if let Some(code) = status.filter(|c| *c >= 400) {
        return Err(navigation(url, format!("HTTP {}", code)));
    }

    first
        .and_then(|obj| obj.get("content"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| navigation(url, "no content in spider response".into()))
}

/// Sleep before re-render number `attempt + 1`, or `None` once that sleep
/// would run past `budget`.
fn next_backoff(attempt: u32, elapsed: Duration, budget: Duration) -> Option<Duration> {
    let backoff = Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(2u64.saturating_pow(attempt)));
    elapsed
        .checked_add(backoff)
        .is_some_and(|end| end < budget)
        .then_some(backoff)
}

fn navigation(url: &str, message: String) -> RenderError {
    RenderError::Navigation {
        url: url.to_string(),
        message,
    }
}

#[async_trait]
impl Renderer for SpiderRenderer {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        self.current = None;
        let html = self.render(url, timeout).await?;
        self.current = Some((url.to_string(), html));
        Ok(())
    }

    /// Rows can arrive late on script-heavy listings, so an empty snapshot
    /// is re-rendered with backoff until the budget runs out.
    async fn wait_for_rows(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError> {
        let sel = row_selector(selector)?;
        let Some((url, html)) = self.current.take() else {
            return Err(RenderError::Unavailable("wait_for_rows before navigate".into()));
        };

        let start = Instant::now();
        let mut html = html;
        let mut attempt = 0u32;
        loop {
            if parser::has_rows(&html, &sel) {
                self.current = Some((url, html));
                return Ok(());
            }

            let elapsed = start.elapsed();
            let Some(backoff) = next_backoff(attempt, elapsed, timeout) else {
                self.current = Some((url, html));
                return Err(RenderError::RowWaitTimeout {
                    selector: selector.to_string(),
                    waited: elapsed,
                });
            };

            debug!("No rows yet on {}, re-rendering in {:.1}s", url, backoff.as_secs_f64());
            tokio::time::sleep(backoff).await;
            attempt += 1;

            let remaining = timeout.saturating_sub(start.elapsed());
            match self.render(&url, remaining).await {
                Ok(fresh) => html = fresh,
                Err(e) => warn!("Re-render of {} failed: {}", url, e),
            }
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.current
            .as_ref()
            .map(|(_, html)| html.clone())
            .ok_or_else(|| RenderError::Unavailable("no page loaded".into()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        info!("Renderer session closed after {} renders", self.renders);
        self.current = None;
        Ok(())
    }
}

// ── Offline rendering from saved snapshots ──

/// Serves `<dir>/<slug>.html` files, where the slug is the last path segments
/// of the listing URL before `fixtures/` joined with `-`.
pub struct SnapshotRenderer {
    dir: PathBuf,
    current: Option<String>,
}

impl SnapshotRenderer {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, RenderError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(RenderError::Unavailable(format!(
                "snapshot directory {} does not exist",
                dir.display()
            )));
        }
        Ok(Self { dir, current: None })
    }

    pub fn snapshot_path(dir: &Path, url: &str) -> PathBuf {
        dir.join(format!("{}.html", url_slug(url)))
    }
}

/// "https://host/football/england/premier-league/fixtures/" -> "england-premier-league"
pub fn url_slug(url: &str) -> String {
    let path = url.split("//").nth(1).unwrap_or(url);
    let segments: Vec<&str> = path
        .split('/')
        .skip(1)
        .filter(|s| !s.is_empty() && *s != "fixtures")
        .collect();
    let tail = if segments.len() > 2 {
        &segments[segments.len() - 2..]
    } else {
        &segments[..]
    };
    tail.join("-")
}

#[async_trait]
impl Renderer for SnapshotRenderer {
    async fn navigate(&mut self, url: &str, _timeout: Duration) -> Result<(), RenderError> {
        let path = Self::snapshot_path(&self.dir, url);
        let html = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| navigation(url, format!("{}: {}", path.display(), e)))?;
        self.current = Some(html);
        Ok(())
    }

    async fn wait_for_rows(&mut self, selector: &str, timeout: Duration) -> Result<(), RenderError> {
        let sel = row_selector(selector)?;
        match &self.current {
            Some(html) if parser::has_rows(html, &sel) => Ok(()),
            Some(_) => Err(RenderError::RowWaitTimeout {
                selector: selector.to_string(),
                waited: timeout,
            }),
            None => Err(RenderError::Unavailable("wait_for_rows before navigate".into())),
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.current
            .clone()
            .ok_or_else(|| RenderError::Unavailable("no page loaded".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_slug_matches_league_slug() {
        for league in crate::leagues::LEAGUES {
            let url = league.listing_url(crate::leagues::BASE_URL);
            assert_eq!(url_slug(&url), league.slug());
        }
    }

    #[tokio::test]
    async fn snapshot_renderer_serves_saved_pages() {
        let mut r = SnapshotRenderer::open("tests/fixtures").unwrap();
        let url = "https://www.betexplorer.com/football/tests/premier_league/fixtures/";
        // slug "tests-premier_league" is not a saved file
        assert!(matches!(
            r.navigate(url, Duration::from_secs(1)).await,
            Err(RenderError::Navigation { .. })
        ));

        let url = "https://example.com/premier_league/";
        r.navigate(url, Duration::from_secs(1)).await.unwrap();
        r.wait_for_rows("tr", Duration::from_secs(1)).await.unwrap();
        let html = r.content().await.unwrap();
        assert!(html.contains("Bournemouth"));
    }

    #[tokio::test]
    async fn snapshot_without_rows_times_out() {
        let mut r = SnapshotRenderer::open("tests/fixtures").unwrap();
        r.navigate("https://example.com/empty_league/", Duration::from_secs(1))
            .await
            .unwrap();
        let err = r
            .wait_for_rows("tbody.fixtures tr", Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::RowWaitTimeout { .. }));
    }

    #[test]
    fn page_html_reads_first_page_content() {
        let url = "https://example.com/a/";
        let response = serde_json::json!([{ "status": 200, "content": "<table><tr></tr></table>" }]);
        assert_eq!(page_html(url, response).unwrap(), "<table><tr></tr></table>");

        // payload delivered as a JSON-encoded string
        let wrapped = serde_json::Value::String(r#"[{"status":200,"content":"<p>ok</p>"}]"#.into());
        assert_eq!(page_html(url, wrapped).unwrap(), "<p>ok</p>");
    }

    #[test]
    fn page_html_rejects_error_status_and_empty_body() {
        let url = "https://example.com/a/";
        let blocked = serde_json::json!([{ "status": 403, "content": "<p>denied</p>" }]);
        match page_html(url, blocked) {
            Err(RenderError::Navigation { message, .. }) => assert_eq!(message, "HTTP 403"),
            other => panic!("expected navigation error, got {:?}", other),
        }

        for response in [
            serde_json::json!([{ "status": 200, "content": "  \n " }]),
            serde_json::json!([{ "status": 200 }]),
            serde_json::json!([]),
            serde_json::Value::String("not json".into()),
        ] {
            assert!(matches!(
                page_html(url, response),
                Err(RenderError::Navigation { .. })
            ));
        }
    }

    #[test]
    fn backoff_doubles_within_row_wait_budget() {
        let budget = Duration::from_millis(crate::scrape::ROW_WAIT_TIMEOUT_MS);
        let zero = Duration::ZERO;
        assert_eq!(next_backoff(0, zero, budget), Some(Duration::from_secs(2)));
        assert_eq!(next_backoff(1, zero, budget), Some(Duration::from_secs(4)));
        assert_eq!(next_backoff(2, zero, budget), Some(Duration::from_secs(8)));
        // 2s + 4s already spent, an 8s sleep would overrun 10s
        assert_eq!(next_backoff(2, Duration::from_secs(6), budget), None);
        // landing exactly on the budget is too late
        assert_eq!(next_backoff(0, Duration::from_secs(8), budget), None);
        assert_eq!(next_backoff(0, zero, Duration::from_secs(1)), None);
        assert_eq!(next_backoff(u32::MAX, zero, budget), None);
    }

    #[test]
    fn missing_snapshot_dir_is_unavailable() {
        assert!(matches!(
            SnapshotRenderer::open("tests/no_such_dir"),
            Err(RenderError::Unavailable(_))
        ));
    }
}
