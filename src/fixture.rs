use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Match-result odds. A field is `None` when its cell, control or attribute
/// was missing or unparseable; absent fields are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Odds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_win: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draw: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_win: Option<f64>,
}

impl Odds {
    pub fn is_empty(&self) -> bool {
        self.home_win.is_none() && self.draw.is_none() && self.away_win.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixture {
    pub datetime: Option<String>,
    pub home_team: String,
    pub away_team: String,
    pub odds: Odds,
}

/// Fixtures for one league, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct LeagueFixtures {
    pub league: String,
    pub fixtures: Vec<Fixture>,
}

/// League name -> fixtures, iterated (and serialized) in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeagueResults {
    entries: Vec<LeagueFixtures>,
}

impl LeagueResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a league. A repeated name replaces the earlier entry in place.
    pub fn insert(&mut self, league: &str, fixtures: Vec<Fixture>) {
        match self.entries.iter_mut().find(|e| e.league == league) {
            Some(existing) => existing.fixtures = fixtures,
            None => self.entries.push(LeagueFixtures {
                league: league.to_string(),
                fixtures,
            }),
        }
    }

    #[cfg(test)]
    pub fn get(&self, league: &str) -> Option<&[Fixture]> {
        self.entries
            .iter()
            .find(|e| e.league == league)
            .map(|e| e.fixtures.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeagueFixtures> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn total_fixtures(&self) -> usize {
        self.entries.iter().map(|e| e.fixtures.len()).sum()
    }
}

impl Serialize for LeagueResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.league, &entry.fixtures)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(home: &str, away: &str) -> Fixture {
        Fixture {
            datetime: None,
            home_team: home.into(),
            away_team: away.into(),
            odds: Odds::default(),
        }
    }

    #[test]
    fn absent_odds_are_omitted_not_null() {
        let odds = Odds {
            home_win: Some(1.5),
            draw: None,
            away_win: Some(2.1),
        };
        let json = serde_json::to_value(&odds).unwrap();
        assert_eq!(json, serde_json::json!({ "home_win": 1.5, "away_win": 2.1 }));
        assert!(json.get("draw").is_none());
    }

    #[test]
    fn zero_odd_is_kept() {
        let odds = Odds {
            draw: Some(0.0),
            ..Default::default()
        };
        assert!(!odds.is_empty());
        let json = serde_json::to_string(&odds).unwrap();
        assert_eq!(json, r#"{"draw":0.0}"#);
    }

    #[test]
    fn missing_datetime_serializes_as_null() {
        let json = serde_json::to_value(fixture("Ajax", "PSV")).unwrap();
        assert!(json["datetime"].is_null());
        assert_eq!(json["home_team"], "Ajax");
        assert_eq!(json["odds"], serde_json::json!({}));
    }

    #[test]
    fn results_keep_insertion_order() {
        let mut results = LeagueResults::new();
        results.insert("Serie A", vec![fixture("Inter", "Milan")]);
        results.insert("Bundesliga", vec![]);
        results.insert("Eredivisie", vec![fixture("Ajax", "PSV")]);

        let json = serde_json::to_string(&results).unwrap();
        let serie = json.find("Serie A").unwrap();
        let bundes = json.find("Bundesliga").unwrap();
        let ere = json.find("Eredivisie").unwrap();
        assert!(serie < bundes && bundes < ere);
        assert_eq!(results.total_fixtures(), 2);
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut results = LeagueResults::new();
        results.insert("A", vec![]);
        results.insert("B", vec![]);
        results.insert("A", vec![fixture("x", "y")]);
        let names: Vec<_> = results.iter().map(|e| e.league.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(results.get("A").unwrap().len(), 1);
    }
}
