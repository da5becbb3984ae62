use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::train::Train;

/// Route search as entered on the search form.
///
/// `date` travels with the query so it can be shown and handed to the booking
/// step, but it never filters trains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainQuery {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date: Option<NaiveDate>,
}

impl TrainQuery {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn from_fragment(&self) -> Option<&str> {
        fragment(self.from.as_deref())
    }

    pub fn to_fragment(&self) -> Option<&str> {
        fragment(self.to.as_deref())
    }

    pub fn matches(&self, train: &Train) -> bool {
        self.from_fragment()
            .map_or(true, |f| contains_ignore_case(&train.from_station, f))
            && self
                .to_fragment()
                .map_or(true, |t| contains_ignore_case(&train.to_station, t))
    }
}

/// Search outcome plus the context the results page echoes back.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub from: String,
    pub to: String,
    pub date: Option<NaiveDate>,
    pub trains: Vec<Train>,
}

impl SearchResults {
    pub fn new(query: &TrainQuery, trains: Vec<Train>) -> Self {
        Self {
            from: query.from_fragment().unwrap_or_default().to_string(),
            to: query.to_fragment().unwrap_or_default().to_string(),
            date: query.date,
            trains,
        }
    }
}

/// `ILIKE` pattern for a fragment; wildcards typed by the user match literally.
pub fn like_pattern(fragment: Option<&str>) -> String {
    match fragment {
        None => "%".to_string(),
        Some(f) => {
            let mut pattern = String::with_capacity(f.len() + 2);
            pattern.push('%');
            for c in f.chars() {
                if matches!(c, '\\' | '%' | '_') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        }
    }
}

/// Listing order shared by every store: departure time, then train number.
pub fn sort_for_listing(trains: &mut [Train]) {
    trains.sort_by(|a, b| {
        a.departure_time
            .cmp(&b.departure_time)
            .then_with(|| a.train_number.cmp(&b.train_number))
    });
}

fn fragment(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
