//! Ordered column → value maps used for inserted rows, SET lists and equality filters.

use crate::param::Param;
use tokio_postgres::types::ToSql;

/// Column/value pairs in insertion order. Setting a column twice replaces its value
/// but keeps its original position.
#[derive(Clone, Debug, Default)]
pub struct ValueMap {
    entries: Vec<(String, Param)>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value.
    pub fn set<T: ToSql + Send + Sync + 'static>(self, column: &str, value: T) -> Self {
        self.set_param(column, Param::new(value))
    }

    /// Set an optional column value (`None` => column omitted).
    pub fn set_opt<T: ToSql + Send + Sync + 'static>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a JSON column from any serializable value.
    pub fn set_json<T: serde::Serialize>(self, column: &str, value: &T) -> serde_json::Result<Self> {
        let json = serde_json::to_value(value)?;
        Ok(self.set(column, json))
    }

    /// Set a pre-wrapped parameter.
    pub fn set_param(mut self, column: &str, param: Param) -> Self {
        match self.entries.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = param,
            None => self.entries.push((column.to_string(), param)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&Param> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, p)| p)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param)> {
        self.entries.iter().map(|(c, p)| (c.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
