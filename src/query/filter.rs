//! Translation of request parameters into a parameterized `WHERE` clause

use crate::error::QueryError;
use crate::schema::{Schema, TABLE_NAME};

/// Equality filter built from request query parameters.
///
/// Keys keep the order in which they first appeared; values keep their order
/// within a key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<(String, Vec<String>)>,
}

/// SQL text plus positional arguments, ready for [`crate::sqlite::SqliteStore::query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub sql: String,
    pub args: Vec<String>,
}

impl Filter {
    /// Group `(key, value)` pairs by key.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut terms: Vec<(String, Vec<String>)> = Vec::new();
        for (key, value) in pairs {
            let key = key.into();
            match terms.iter_mut().find(|(k, _)| *k == key) {
                Some((_, values)) => values.push(value.into()),
                None => terms.push((key, vec![value.into()])),
            }
        }
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of equality clauses the filter produces.
    pub fn clause_count(&self) -> usize {
        self.terms.iter().map(|(_, values)| values.len()).sum()
    }

    pub fn terms(&self) -> &[(String, Vec<String>)] {
        &self.terms
    }

    /// Build `SELECT * FROM csv WHERE k1 = ?1 AND k2 = ?2 ...`.
    ///
    /// Every value is its own clause, so a key given twice yields two
    /// equalities on the same column and matches only rows where both hold.
    /// Keys are emitted as given after checking them against the schema.
    pub fn to_sql(&self, schema: &Schema) -> Result<FilterQuery, QueryError> {
        if self.is_empty() {
            return Err(QueryError::EmptyFilter);
        }

        let mut clauses = Vec::with_capacity(self.clause_count());
        let mut args = Vec::with_capacity(self.clause_count());
        for (key, values) in &self.terms {
            if schema.find_column(key).is_none() {
                return Err(QueryError::UnknownColumn(key.clone()));
            }
            for value in values {
                args.push(value.clone());
                clauses.push(format!("{} = ?{}", key, args.len()));
            }
        }

        Ok(FilterQuery {
            sql: format!(
                "SELECT * FROM {} WHERE {}",
                TABLE_NAME,
                clauses.join(" AND ")
            ),
            args,
        })
    }
}
