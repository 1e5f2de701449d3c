//! Database models
//!
//! Library rows are decoded dynamically: every column is read as a
//! [`SqlValue`] by its runtime storage class, so rows can be copied verbatim
//! even when Mixxx stored a value that disagrees with the declared column
//! type (REAL cue points in an INTEGER column, for example).

use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// One SQLite cell
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Decode column `index` of `row` by the value's storage class
    pub fn from_row(row: &SqliteRow, index: usize) -> sqlx::Result<Self> {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        let storage = raw.type_info().name().to_string();
        let value = match storage.as_str() {
            "INTEGER" => SqlValue::Integer(row.try_get(index)?),
            "REAL" => SqlValue::Real(row.try_get(index)?),
            "TEXT" => SqlValue::Text(row.try_get(index)?),
            _ => SqlValue::Blob(row.try_get(index)?),
        };
        Ok(value)
    }

    /// Text view of the value; numbers are rendered, blobs are not text
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Integer(i) => Some(i.to_string()),
            SqlValue::Real(f) => Some(f.to_string()),
            SqlValue::Null | SqlValue::Blob(_) => None,
        }
    }

    /// Integer view of the value, used for row identifiers
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Ordered column values of one row, in source column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    columns: Vec<(String, SqlValue)>,
}

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every column of `row`
    pub fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        let mut values = Self::new();
        for column in row.columns() {
            let value = SqlValue::from_row(row, column.ordinal())?;
            values.push(column.name(), value);
        }
        Ok(values)
    }

    pub fn push(&mut self, name: impl Into<String>, value: SqlValue) {
        self.columns.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    /// Remove a column and return its value
    pub fn take(&mut self, name: &str) -> Option<SqlValue> {
        let index = self.columns.iter().position(|(column, _)| column == name)?;
        Some(self.columns.remove(index).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Watched library folder
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub directory: Option<String>,
}

/// Track location row as read from a source library
///
/// `values` holds every column except `id`, `location` and `directory`.
#[derive(Debug, Clone)]
pub struct SourceLocation {
    pub id: i64,
    pub location: Option<String>,
    pub directory: Option<String>,
    pub values: ColumnValues,
}

/// Cue row as read from a source library
///
/// `values` holds every column except `id` and `track_id`.
#[derive(Debug, Clone)]
pub struct SourceCue {
    pub id: i64,
    pub values: ColumnValues,
}

/// Library row joined with its location and cues
///
/// `values` holds every column except `id` and the `location` reference;
/// `artist` and `title` are copies kept for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceTrack {
    /// Zero-based position in source row order
    pub position: usize,
    /// `None` when the row's id is NULL or not an integer
    pub id: Option<i64>,
    /// Raw `location` reference, kept even when it resolves to nothing
    pub location_id: Option<i64>,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub values: ColumnValues,
    pub location: Option<SourceLocation>,
    pub cues: Vec<SourceCue>,
}

impl SourceTrack {
    /// `"Artist - Title"` with `<N/A>` for missing parts
    pub fn display_name(&self) -> String {
        format!(
            "{} - {}",
            self.artist.as_deref().unwrap_or("<N/A>"),
            self.title.as_deref().unwrap_or("<N/A>")
        )
    }
}
