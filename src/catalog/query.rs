//! List queries over a snapshot: search, filters, sort and pagination.

use super::models::Drama;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_LIMIT: usize = 24;
pub const DEFAULT_SORT: &str = "updated_at:desc";

/// Year used for records without one when checking `max_year`.
const MISSING_YEAR_CEILING: f64 = 9999.0;

/// Raw list parameters, exactly as they came in the query string.
///
/// Everything is kept as text so that a malformed number disables a filter
/// or falls back to a default instead of failing the request.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct QueryParams {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub status: Option<String>,
    pub min_year: Option<String>,
    pub max_year: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl QueryParams {
    /// Builds the parameters out of raw query pairs. When a key is repeated
    /// the first occurrence wins, the others are ignored.
    pub fn from_pairs<I>(pairs: I) -> QueryParams
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = QueryParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "search" => &mut params.search,
                "genre" => &mut params.genre,
                "status" => &mut params.status,
                "min_year" => &mut params.min_year,
                "max_year" => &mut params.max_year,
                "sort" => &mut params.sort,
                "page" => &mut params.page,
                "limit" => &mut params.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Lowers the requested page size to `max` when it asks for more.
    pub fn cap_limit(&mut self, max: usize) {
        if parse_limit(&self.limit) > max {
            self.limit = Some(max.to_string());
        }
    }
}

#[derive(Serialize, Debug)]
pub struct PagedResult {
    pub items: Vec<Drama>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub pages: usize,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, PartialEq)]
struct SortSpec {
    field: String,
    direction: SortDirection,
}

impl SortSpec {
    fn parse(raw: Option<&str>) -> SortSpec {
        let raw = match raw.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => DEFAULT_SORT,
        };
        let (field, direction) = match raw.split_once(':') {
            Some((field, direction)) => (field, direction),
            None => (raw, ""),
        };
        SortSpec {
            field: field.trim().to_owned(),
            direction: if direction.trim().eq_ignore_ascii_case("desc") {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn parse_number(value: &Option<String>) -> Option<f64> {
    non_empty(value)
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn parse_page(value: &Option<String>) -> usize {
    match non_empty(value).and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(n) if n >= 1 => n as usize,
        _ => 1,
    }
}

fn parse_limit(value: &Option<String>) -> usize {
    match non_empty(value).and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(n) if n >= 1 => n as usize,
        _ => DEFAULT_PAGE_LIMIT,
    }
}

/// Value used to order a record by `field`. Missing fields order as `0`.
fn sort_key(drama: &Drama, field: &str) -> Value {
    let value = match serde_json::to_value(drama) {
        Ok(Value::Object(mut fields)) => fields.remove(field),
        _ => None,
    };
    value.unwrap_or_else(|| Value::from(0))
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}

/// Runs a list query over `dramas`.
///
/// Filters apply in order: search, genre, status, min_year, max_year; then
/// the result is sorted and cut to the requested page. Pages past the end
/// come back empty.
pub fn query(dramas: &[Drama], params: &QueryParams) -> PagedResult {
    let search = non_empty(&params.search).map(str::to_lowercase);
    let genre = non_empty(&params.genre).map(str::to_lowercase);
    let status = non_empty(&params.status).map(str::to_lowercase);
    let min_year = parse_number(&params.min_year);
    let max_year = parse_number(&params.max_year);

    let matching = dramas
        .iter()
        .filter(|d| match &search {
            Some(q) => {
                d.title.to_lowercase().contains(q.as_str())
                    || d.description.to_lowercase().contains(q.as_str())
            }
            None => true,
        })
        .filter(|d| match &genre {
            Some(g) => d.genres.iter().any(|x| x.to_lowercase() == *g),
            None => true,
        })
        .filter(|d| match &status {
            Some(s) => d.status.to_lowercase() == *s,
            None => true,
        })
        .filter(|d| match (min_year, d.year) {
            (Some(min), Some(year)) => year as f64 >= min,
            _ => true,
        })
        .filter(|d| match max_year {
            Some(max) => d.year.map_or(MISSING_YEAR_CEILING, |y| y as f64) <= max,
            None => true,
        });

    let sort = SortSpec::parse(params.sort.as_deref());
    let mut keyed: Vec<(Value, &Drama)> = matching
        .map(|d| (sort_key(d, &sort.field), d))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| match sort.direction {
        SortDirection::Asc => compare_values(a, b),
        SortDirection::Desc => compare_values(b, a),
    });

    let page = parse_page(&params.page);
    let limit = parse_limit(&params.limit);
    let total = keyed.len();
    let items = keyed
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .map(|(_, d)| d.clone())
        .collect();

    PagedResult {
        items,
        page,
        limit,
        total,
        pages: total.div_ceil(limit),
    }
}
