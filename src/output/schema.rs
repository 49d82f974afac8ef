//! Relational table definition for harvested records

use crate::record::Field;
use rusqlite::Connection;

/// SQL creating the record table if it does not exist yet
///
/// `table` must already be a validated plain identifier.
pub fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = Field::COLUMNS
        .iter()
        .map(|field| format!("    {} TEXT NOT NULL", field.as_str()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        table,
        columns.join(",\n")
    )
}

/// SQL inserting one record, with one positional parameter per column
pub fn insert_sql(table: &str) -> String {
    let names: Vec<&str> = Field::COLUMNS.iter().map(|field| field.as_str()).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders.join(", ")
    )
}

/// Creates the record table
///
/// This is idempotent; existing rows are left alone.
pub fn initialize_table(conn: &Connection, table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&create_table_sql(table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_initializes_twice() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_table(&conn, "products").unwrap();
        assert!(initialize_table(&conn, "products").is_ok());

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='products'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_insert_sql_lists_columns_in_order() {
        assert_eq!(
            insert_sql("products"),
            "INSERT INTO products (item_id, item_name, item_category, item_description, item_price, item_image) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
    }
}
