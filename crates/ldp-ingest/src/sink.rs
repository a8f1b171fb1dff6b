//! Postgres sink for combined datasets
//!
//! Consumes a finished, validated combined table and replaces the raw loan
//! table with it. Everything lands as TEXT; typing is downstream's job.
//! Compiled only with the `database` feature.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;

use crate::error::Result;
use crate::table::Table;

/// Default name of the raw loan table
const DEFAULT_TABLE: &str = "sba_7a_raw";

/// Writes combined datasets into Postgres
pub struct PostgresSink {
    pool: PgPool,
    table_name: String,
}

impl PostgresSink {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new().max_connections(4).connect(url).await?;
        Ok(Self {
            pool,
            table_name: DEFAULT_TABLE.to_string(),
        })
    }

    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Drop and recreate the sink table, then bulk-insert the dataset.
    ///
    /// Inserts are chunked to stay under the bind-parameter limit of a
    /// single Postgres statement. Null cells become SQL NULL.
    pub async fn replace(&self, table: &Table) -> Result<u64> {
        let quoted_table = quote_ident(&self.table_name);
        let quoted_columns: Vec<String> = table.columns().iter().map(|c| quote_ident(c)).collect();

        sqlx::query(&format!("DROP TABLE IF EXISTS {}", quoted_table))
            .execute(&self.pool)
            .await?;

        let column_defs: Vec<String> = quoted_columns
            .iter()
            .map(|c| format!("{} TEXT", c))
            .collect();
        sqlx::query(&format!(
            "CREATE TABLE {} ({})",
            quoted_table,
            column_defs.join(", ")
        ))
        .execute(&self.pool)
        .await?;

        // Postgres caps bind parameters per statement at u16::MAX
        let chunk_rows = (u16::MAX as usize / table.columns().len().max(1)).clamp(1, 10_000);

        let mut written = 0u64;
        for chunk in table.rows().chunks(chunk_rows) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                quoted_table,
                quoted_columns.join(", ")
            ));
            builder.push_values(chunk, |mut b, row| {
                for cell in row {
                    let value = (!cell.trim().is_empty()).then(|| cell.as_str());
                    b.push_bind(value);
                }
            });
            written += builder.build().execute(&self.pool).await?.rows_affected();
        }

        info!(
            rows = written,
            table = %self.table_name,
            "wrote combined dataset to Postgres"
        );
        Ok(written)
    }
}

/// Double-quote an identifier, escaping embedded quotes
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("GrossApproval"), "\"GrossApproval\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
