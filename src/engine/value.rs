// src/engine/value.rs

use std::borrow::Cow;

use serde::{Serialize, Serializer, ser::SerializeMap};
use sqlx::{
    Column, Decode, Row as _, Sqlite, TypeInfo, ValueRef,
    sqlite::{SqliteRow, SqliteTypeInfo, SqliteValueRef},
};

/// A single scalar produced by the storage engine.
///
/// SQLite is dynamically typed, so the variant is chosen from the storage
/// class of each individual value rather than from the column declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Textual form fed to the result hasher.
    ///
    /// Booleans use their SQLite storage form so that a `BOOLEAN` column and an
    /// integer expression with the same value canonicalize identically. Floats
    /// always keep a fractional marker, which keeps `1` and `1.0` apart.
    pub fn canonical_text(&self) -> Cow<'_, str> {
        match self {
            SqlValue::Null => Cow::Borrowed("NULL"),
            SqlValue::Boolean(true) => Cow::Borrowed("1"),
            SqlValue::Boolean(false) => Cow::Borrowed("0"),
            SqlValue::Integer(i) => Cow::Owned(i.to_string()),
            SqlValue::Float(f) => Cow::Owned(format!("{f:?}")),
            SqlValue::Text(s) => Cow::Borrowed(s),
            SqlValue::Blob(b) => Cow::Owned(format!("X'{}'", hex::encode(b))),
        }
    }

    /// Decodes one raw SQLite value.
    ///
    /// `declared` is the declared type of the originating column; it only
    /// matters for telling booleans apart from plain integers. A `BOOLEAN`
    /// column holding anything other than 0 or 1 decodes as an integer.
    pub(crate) fn decode(
        raw: SqliteValueRef<'_>,
        declared: &SqliteTypeInfo,
    ) -> Result<Self, sqlx::Error> {
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        let storage = raw.type_info().name().to_string();
        let value = match storage.as_str() {
            "INTEGER" => {
                let int = <i64 as Decode<'_, Sqlite>>::decode(raw).map_err(sqlx::Error::Decode)?;
                // SQLite does not constrain BOOLEAN columns to 0 and 1.
                match int {
                    0 | 1 if declared.name() == "BOOLEAN" => SqlValue::Boolean(int == 1),
                    _ => SqlValue::Integer(int),
                }
            }
            "REAL" => SqlValue::Float(<f64 as Decode<'_, Sqlite>>::decode(raw).map_err(sqlx::Error::Decode)?),
            "BLOB" => {
                SqlValue::Blob(<Vec<u8> as Decode<'_, Sqlite>>::decode(raw).map_err(sqlx::Error::Decode)?)
            }
            _ => SqlValue::Text(<String as Decode<'_, Sqlite>>::decode(raw).map_err(sqlx::Error::Decode)?),
        };

        Ok(value)
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Boolean(b) => serializer.serialize_bool(*b),
            SqlValue::Integer(i) => serializer.serialize_i64(*i),
            SqlValue::Float(f) => serializer.serialize_f64(*f),
            SqlValue::Text(s) => serializer.serialize_str(s),
            SqlValue::Blob(b) => serializer.serialize_str(&hex::encode(b)),
        }
    }
}

/// One result row: columns in select-list order, name paired with value.
///
/// Duplicate column names (`SELECT id, id ...`) are kept as separate entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column; builder style so tests and callers can assemble rows inline.
    pub fn with(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        self.columns.push((name.into(), value));
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.columns.iter().map(|(_, v)| v)
    }

    pub(crate) fn from_sqlite(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let columns = row
            .columns()
            .iter()
            .map(|col| {
                let raw = row.try_get_raw(col.ordinal())?;
                let value = SqlValue::decode(raw, col.type_info())?;
                Ok((col.name().to_string(), value))
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Self { columns })
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
