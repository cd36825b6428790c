use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_json::{Map, Value};

use crate::error::{ReportError, Result};
use crate::report_context::ReportContext;

// One row of the source before typing: normalized column name -> raw value.
pub type RawRow = Map<String, Value>;

pub const REQUIRED_COLUMNS: [&str; 4] = ["team", "opp_team", "date", "total"];

// Layouts seen in exported game logs, tried in order before falling back to RFC 3339.
const DATE_FORMATS: [DateLayout; 5] = [
    DateLayout::Date("%Y-%m-%d"),
    DateLayout::DateTime("%Y-%m-%d %H:%M:%S"),
    DateLayout::DateTime("%Y-%m-%dT%H:%M:%S"),
    DateLayout::Date("%m/%d/%Y"),
    DateLayout::Date("%Y%m%d"),
];

enum DateLayout {
    Date(&'static str),
    DateTime(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub team: String,
    pub opp_team: String,
    pub date: NaiveDate,
    pub total: u32,
    // Columns the report doesn't use, carried along untouched
    pub extras: BTreeMap<String, Value>,
}

impl GameRecord {
    pub fn involves(&self, team: &str) -> bool {
        self.team == team || self.opp_team == team
    }

    // The side that isn't `team`. Only meaningful for games involving `team`.
    pub fn opponent_of(&self, team: &str) -> &str {
        debug_assert!(self.involves(team));

        if self.team == team { &self.opp_team } else { &self.team }
    }
}

// Picks the file for this run. An explicit path wins over the named source from the config.
pub fn resolve_source<'a>(
    ctx: &'a ReportContext,
    source: Option<&'a str>,
    data_path: Option<&'a Path>,
) -> Result<&'a Path> {
    if let Some(path) = data_path {
        return Ok(path);
    }

    ctx.source_path(source.unwrap_or(&ctx.source))
}

// Loads and normalizes every game in the file. Missing files and empty datasets are both
// DataUnavailable, which the caller turns into the warning page.
pub fn load_games(path: &Path, ctx: &ReportContext) -> Result<Vec<GameRecord>> {
    if !path.is_file() {
        return Err(ReportError::DataUnavailable(format!("{} does not exist", path.display())));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let file = File::open(path)?;
    let rows = match extension.as_str() {
        "csv" => read_csv_rows(file)?,
        "json" => read_json_rows(file)?,
        other => return Err(ReportError::UnsupportedFormat(other.to_string())),
    };

    log::info!("Loaded {} rows from {}", rows.len(), path.display());

    games_from_rows(rows, &ctx.column_renames)
}

// Only headers are trimmed. Cell values reach the report as written.
pub fn read_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;

        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();

        rows.push(row);
    }

    Ok(rows)
}

// JSON sources are an array of row objects, the shape a dataframe export produces
// A blank file holds no rows, same as a CSV with only a header.
pub fn read_json_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let body = std::io::read_to_string(reader)?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_str(&body)?)
}

// Canonical column name: trimmed, lowercase, then any configured rename applied.
pub fn normalize_column(name: &str, renames: &BTreeMap<String, String>) -> String {
    let name = name.trim().to_lowercase();

    match renames.get(&name) {
        Some(renamed) => renamed.clone(),
        None => name,
    }
}

pub fn normalize_row(row: RawRow, renames: &BTreeMap<String, String>) -> RawRow {
    row.into_iter()
        .map(|(k, v)| (normalize_column(&k, renames), v))
        .collect()
}

pub fn games_from_rows(rows: Vec<RawRow>, renames: &BTreeMap<String, String>) -> Result<Vec<GameRecord>> {
    if rows.is_empty() {
        return Err(ReportError::DataUnavailable("dataset is empty".to_string()));
    }

    let mut games = Vec::with_capacity(rows.len());
    for (idx, row) in rows.into_iter().enumerate() {
        games.push(game_from_row(idx + 1, normalize_row(row, renames))?);
    }

    Ok(games)
}

fn game_from_row(row_number: usize, mut row: RawRow) -> Result<GameRecord> {
    for column in REQUIRED_COLUMNS {
        if !row.contains_key(column) {
            return Err(ReportError::MissingColumn(column.to_string()));
        }
    }

    let team = value_to_string(row.remove("team").unwrap_or(Value::Null));
    let opp_team = value_to_string(row.remove("opp_team").unwrap_or(Value::Null));

    let raw_date = value_to_string(row.remove("date").unwrap_or(Value::Null));
    let date = parse_date(&raw_date).ok_or_else(|| ReportError::InvalidDate {
        row: row_number,
        value: raw_date.clone(),
    })?;

    let total = parse_total(row_number, row.remove("total").unwrap_or(Value::Null))?;

    Ok(GameRecord {
        team,
        opp_team,
        date,
        total,
        extras: row.into_iter().collect(),
    })
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for layout in &DATE_FORMATS {
        let parsed = match layout {
            DateLayout::Date(format) => NaiveDate::parse_from_str(value, format).ok(),
            DateLayout::DateTime(format) => NaiveDateTime::parse_from_str(value, format).ok().map(|dt| dt.date()),
        };

        if parsed.is_some() {
            return parsed;
        }
    }

    DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive())
}

// Totals may arrive as numbers or numeric strings ("210", "210.0"). Anything that isn't a
// whole, non-negative score is rejected.
pub fn parse_total(row_number: usize, value: Value) -> Result<u32> {
    let value = match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    };
    let shown = value_to_string(value.clone());
    let invalid = || ReportError::InvalidTotal { row: row_number, value: shown.clone() };

    let total: f64 = deserialize_number_from_string(value).map_err(|_| invalid())?;

    if !total.is_finite() || total < 0.0 || total.fract() != 0.0 || total > u32::MAX as f64 {
        return Err(invalid());
    }

    Ok(total as u32)
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
