pub mod html;
pub mod row;

use std::sync::LazyLock;

use regex::Regex;
use scraper::Selector;
use tracing::debug;

use crate::fixture::Fixture;
use html::HtmlDocument;
use row::RowNode;

static TABLE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<table[\s>]").unwrap());
static ROW_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<tr[\s>]").unwrap());

/// Walk rows in document order, carrying the last seen datetime forward.
/// The carry starts empty on every call.
pub fn parse_document<R, I>(rows: I) -> Vec<Fixture>
where
    R: RowNode,
    I: IntoIterator<Item = R>,
{
    let mut carried: Option<String> = None;
    let mut fixtures = Vec::new();
    let mut seen = 0usize;

    for row in rows {
        seen += 1;
        let Some(fixture) = row::extract(&row, carried.as_deref()) else {
            continue;
        };
        if fixture.datetime.is_some() {
            carried = fixture.datetime.clone();
        }
        fixtures.push(fixture);
    }

    debug!("{} rows, {} fixtures", seen, fixtures.len());
    fixtures
}

/// Fixtures from a saved HTML string.
///
/// Accepts whole documents, loose `<tr>` fragments, and bracketed element
/// dumps like `[<tr>..</tr>, <tr>..</tr>]`.
pub fn parse_html(html: &str) -> Vec<Fixture> {
    let doc = HtmlDocument::parse(&normalize_snapshot(html));
    parse_document(doc.rows())
}

/// Same as [`parse_html`] but with a caller-chosen row selector.
pub fn parse_html_with(html: &str, row_selector: &Selector) -> Vec<Fixture> {
    let doc = HtmlDocument::parse(&normalize_snapshot(html));
    parse_document(doc.rows_matching(row_selector))
}

/// Whether the snapshot has at least one element matching `row_selector`.
pub fn has_rows(html: &str, row_selector: &Selector) -> bool {
    let doc = HtmlDocument::parse(&normalize_snapshot(html));
    let found = doc.rows_matching(row_selector).next().is_some();
    found
}

/// HTML parsing drops `<tr>` outside a table, so loose rows get wrapped.
fn normalize_snapshot(html: &str) -> String {
    let trimmed = html.trim();
    if TABLE_TAG_RE.is_match(trimmed) || !ROW_TAG_RE.is_match(trimmed) {
        return trimmed.to_string();
    }
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    format!("<table>{}</table>", inner)
}
