use crate::error::{Error, Result};
use crate::row::Row;
use crate::schema::Schema;
use crate::value::Value;

/// A materialized relation: a [Schema] plus the rows conforming to it.
///
/// Every insertion is validated: the row's attribute names must equal the
/// schema's names exactly (no missing, no extra), and each non-null value
/// must match the declared type. A table is conceptually a set of rows;
/// iteration order is insertion order, guaranteed only for printing and
/// debugging, never relied upon by the algebra.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Schema,
    rows: Vec<Row>,
}

impl Table {
    /// Creates an empty table with the given heading.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// The relation's heading.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Read-only view of the rows, in insertion order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Inserts a row after validating it against the schema.
    ///
    /// # Errors
    /// Returns an error if the row misses an attribute, carries an attribute
    /// the schema does not declare, or binds a non-null value of the wrong
    /// kind.
    pub fn insert(&mut self, row: Row) -> Result<()> {
        for attr in self.schema.attributes() {
            let value = row.get(&attr.name).ok_or_else(|| {
                Error::RowSchemaMismatch(format!("missing attribute: {}", attr.name))
            })?;
            if let Some(kind) = value.data_type()
                && kind != attr.data_type
            {
                return Err(Error::value_type_mismatch(&attr.name, attr.data_type, kind));
            }
        }
        for (name, _) in row.iter() {
            if !self.schema.has(name) {
                return Err(Error::RowSchemaMismatch(format!(
                    "unknown attribute in row: {name}"
                )));
            }
        }
        // Stored in schema attribute order, so row equality and hashing see
        // one canonical entry order per table.
        let canonical = self
            .schema
            .attributes()
            .iter()
            .map(|attr| {
                let value = row.get(&attr.name).cloned().unwrap_or(Value::Null);
                (attr.name.clone(), value)
            })
            .collect();
        self.rows.push(canonical);
        Ok(())
    }

    /// Inserts several rows, stopping at the first offending one.
    pub fn insert_all(&mut self, rows: impl IntoIterator<Item = Row>) -> Result<()> {
        for row in rows {
            self.insert(row)?;
        }
        Ok(())
    }
}
