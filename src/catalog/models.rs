use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_COUNTRY: &str = "China";
pub const DEFAULT_STATUS: &str = "Ongoing";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
#[serde(default)]
pub struct Episode {
    pub number: i64,
    pub title: String,
    pub stream_url: String,
    pub subtitle_url: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Drama {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub poster_url: String,
    #[serde(default)]
    pub banner_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cast: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_owned()
}

fn default_status() -> String {
    DEFAULT_STATUS.to_owned()
}

impl Drama {
    /// Moves `updated_at` to the current instant, or 1ms past its previous
    /// value when the clock hasn't advanced at millisecond resolution.
    pub fn touch(&mut self) {
        let now = now_millis();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
    }
}

/// The full persisted catalog, most recently created record first.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub dramas: Vec<Drama>,
}

impl Snapshot {
    pub fn find(&self, id: &str) -> Option<&Drama> {
        self.dramas.iter().find(|d| d.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Drama> {
        self.dramas.iter_mut().find(|d| d.id == id)
    }

    /// Removes the record with the given id, returning how many were removed.
    pub fn remove(&mut self, id: &str) -> usize {
        let before = self.dramas.len();
        self.dramas.retain(|d| d.id != id);
        before - self.dramas.len()
    }

    pub fn prepend(&mut self, dramas: Vec<Drama>) {
        self.dramas.splice(0..0, dramas);
    }
}

/// Current time truncated to what survives a round trip through the store.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
