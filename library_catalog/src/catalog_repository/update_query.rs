use tokio_postgres::types::ToSql;

use crate::api::{AuthorPatch, BookPatch};

pub type SqlParam = Box<dyn ToSql + Sync + Send>;

/// Builder of `UPDATE <table> SET ... WHERE id = $n` containing only the columns that were set
pub struct UpdateQuery {
    table: &'static str,
    columns: Vec<&'static str>,
    params: Vec<SqlParam>,
}

impl UpdateQuery {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            columns: vec![],
            params: vec![],
        }
    }

    /// Adds `column = $n` when the value is present, skips it otherwise
    pub fn set<T>(mut self, column: &'static str, value: Option<T>) -> Self
    where
        T: ToSql + Sync + Send + 'static,
    {
        if let Some(value) = value {
            self.columns.push(column);
            self.params.push(Box::new(value));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the statement and its parameters, the id is always the last parameter.
    /// None when no column was set.
    pub fn build(self, id: i32) -> Option<(String, Vec<SqlParam>)> {
        if self.is_empty() {
            return None;
        }

        let assignments = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, column)| format!("{} = ${}", column, idx + 1))
            .collect::<Vec<_>>()
            .join(", ");

        let query = format!(
            "UPDATE {} SET {} WHERE id = ${}",
            self.table,
            assignments,
            self.columns.len() + 1
        );

        let mut params = self.params;
        params.push(Box::new(id));
        Some((query, params))
    }
}

pub fn author_update(patch: AuthorPatch) -> UpdateQuery {
    UpdateQuery::new("authors")
        .set("first_name", patch.first_name)
        .set("last_name", patch.last_name)
        .set("biography", patch.biography)
        .set("birth_date", patch.birth_date)
}

pub fn book_update(patch: BookPatch) -> UpdateQuery {
    UpdateQuery::new("books")
        .set("title", patch.title)
        .set("year", patch.year)
        .set("isbn", patch.isbn)
        .set("author_id", patch.author_id)
}

pub fn as_params(params: &[SqlParam]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|param| param.as_ref() as &(dyn ToSql + Sync))
        .collect()
}
