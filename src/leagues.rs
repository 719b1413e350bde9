pub const BASE_URL: &str = "https://www.betexplorer.com/football/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct League {
    pub name: &'static str,
    pub path: &'static str,
}

pub const LEAGUES: &[League] = &[
    League { name: "Champions League", path: "europe/champions-league/fixtures/" },
    League { name: "Premier League", path: "england/premier-league/fixtures/" },
    League { name: "La Liga", path: "spain/laliga/fixtures/" },
    League { name: "Ligue 1", path: "france/ligue-1/fixtures/" },
    League { name: "Bundesliga", path: "germany/bundesliga/fixtures/" },
    League { name: "Serie A", path: "italy/serie-a/fixtures/" },
    League { name: "Eredivisie", path: "netherlands/eredivisie/fixtures/" },
    League { name: "Liga Portugal", path: "portugal/liga-portugal/fixtures/" },
    League { name: "Super Lig", path: "turkey/super-lig/fixtures/" },
];

impl League {
    /// Full listing URL; tolerates a base with or without trailing slash.
    pub fn listing_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.path)
    }

    /// File-safe identifier, e.g. "england-premier-league".
    pub fn slug(&self) -> String {
        self.path
            .trim_matches('/')
            .trim_end_matches("fixtures")
            .trim_matches('/')
            .replace('/', "-")
    }
}

/// Find a league by display name (case-insensitive) or slug.
pub fn find(key: &str) -> Option<&'static League> {
    let key = key.trim();
    LEAGUES
        .iter()
        .find(|l| l.name.eq_ignore_ascii_case(key) || l.slug() == key.to_lowercase())
}

/// Resolve a filter list into catalog entries, keeping catalog order.
/// An empty filter selects the whole catalog.
pub fn select(filters: &[String]) -> anyhow::Result<Vec<League>> {
    if filters.is_empty() {
        return Ok(LEAGUES.to_vec());
    }
    let mut wanted = Vec::new();
    for f in filters {
        let league = find(f).ok_or_else(|| {
            let known: Vec<_> = LEAGUES.iter().map(|l| l.name).collect();
            anyhow::anyhow!("Unknown league '{}' (known: {})", f, known.join(", "))
        })?;
        wanted.push(league.name);
    }
    Ok(LEAGUES
        .iter()
        .filter(|l| wanted.contains(&l.name))
        .copied()
        .collect())
}
