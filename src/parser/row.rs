use crate::fixture::{Fixture, Odds};

/// Read-only view over one table row, independent of where the row came from.
pub trait RowNode {
    /// Trimmed text of each team element inside the row's match link, in
    /// document order. `None` when the row has no match link at all.
    fn team_names(&self) -> Option<Vec<String>>;

    /// Trimmed text of the row's datetime cell, if the cell exists.
    fn datetime_text(&self) -> Option<String>;

    /// One entry per odds cell, in column order. Each entry holds the raw
    /// numeric attribute of the cell's control, or `None` when the cell has
    /// no control or the control has no attribute.
    fn odds_cells(&self) -> Vec<Option<String>>;
}

/// Turn one row into a fixture, or `None` when the row is not a match row.
///
/// `carried` is the datetime inherited from earlier rows. The returned
/// fixture's own datetime is what later rows should inherit.
pub fn extract<R: RowNode + ?Sized>(row: &R, carried: Option<&str>) -> Option<Fixture> {
    let teams = row.team_names()?;
    let mut teams = teams.into_iter();
    let (home_team, away_team) = (teams.next()?, teams.next()?);

    let datetime = row
        .datetime_text()
        .filter(|t| !t.is_empty())
        .or_else(|| carried.map(str::to_string));

    Some(Fixture {
        datetime,
        home_team,
        away_team,
        odds: extract_odds(&row.odds_cells()),
    })
}

/// Odds from the first three cells (home, draw, away). Fewer than three
/// cells means no odds at all.
fn extract_odds(cells: &[Option<String>]) -> Odds {
    if cells.len() < 3 {
        return Odds::default();
    }
    let parse = |cell: &Option<String>| cell.as_deref().and_then(parse_odd);
    Odds {
        home_win: parse(&cells[0]),
        draw: parse(&cells[1]),
        away_win: parse(&cells[2]),
    }
}

pub fn parse_odd(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
