use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::row::RowNode;

pub const ROW_SELECTOR: &str = "tr";

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse(ROW_SELECTOR).unwrap());
static MATCH_LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a.in-match").unwrap());
static TEAM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static DATETIME_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.table-main__datetime").unwrap());
static ODDS_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.table-main__odds").unwrap());
static ODDS_CONTROL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button").unwrap());

const ODDS_ATTR: &str = "data-odd";

/// A parsed HTML snapshot.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All `tr` rows in document order.
    pub fn rows(&self) -> impl Iterator<Item = HtmlRow<'_>> {
        self.rows_matching(&ROW)
    }

    pub fn rows_matching<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = HtmlRow<'a>> {
        self.html.select(selector).map(HtmlRow)
    }
}

/// One row element of an [`HtmlDocument`].
#[derive(Clone, Copy)]
pub struct HtmlRow<'a>(ElementRef<'a>);

impl RowNode for HtmlRow<'_> {
    fn team_names(&self) -> Option<Vec<String>> {
        let link = self.0.select(&MATCH_LINK).next()?;
        Some(link.select(&TEAM).map(trimmed_text).collect())
    }

    fn datetime_text(&self) -> Option<String> {
        self.0.select(&DATETIME_CELL).next().map(trimmed_text)
    }

    fn odds_cells(&self) -> Vec<Option<String>> {
        self.0
            .select(&ODDS_CELL)
            .map(|cell| {
                cell.select(&ODDS_CONTROL)
                    .next()
                    .and_then(|button| button.value().attr(ODDS_ATTR))
                    .map(str::to_string)
            })
            .collect()
    }
}

fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
