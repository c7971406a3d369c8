//! Column layout of the `countries` table and the SQL generated from it

pub const TABLE: &str = "countries";

/// Column definition
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static str,
    pub constraint: &'static str,
}

impl Column {
    const fn new(name: &'static str, sql_type: &'static str, constraint: &'static str) -> Self {
        Self {
            name,
            sql_type,
            constraint,
        }
    }
}

/// Every column except `id`, in bind order for the upsert
pub static COLUMNS: &[Column] = &[
    Column::new("name", "TEXT", "NOT NULL"),
    Column::new("name_lower", "TEXT", "NOT NULL UNIQUE"),
    Column::new("capital", "TEXT", ""),
    Column::new("region", "TEXT", ""),
    Column::new(
        "population",
        "INTEGER",
        "CHECK (population IS NULL OR population >= 0)",
    ),
    Column::new("currency_code", "TEXT", ""),
    Column::new(
        "exchange_rate",
        "REAL",
        "CHECK (exchange_rate IS NULL OR exchange_rate > 0)",
    ),
    Column::new("estimated_gdp", "REAL", ""),
    Column::new("flag_url", "TEXT", ""),
    Column::new("last_refreshed_at", "TEXT", "NOT NULL"),
];

pub static INDEXED: &[&str] = &["region", "currency_code", "estimated_gdp"];

/// Generate CREATE TABLE SQL for the countries table
pub fn generate_create_table() -> String {
    let mut columns = vec!["    id INTEGER PRIMARY KEY AUTOINCREMENT".to_string()];

    for col in COLUMNS {
        let mut def = format!("    {} {}", col.name, col.sql_type);
        if !col.constraint.is_empty() {
            def.push(' ');
            def.push_str(col.constraint);
        }
        columns.push(def);
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
        TABLE,
        columns.join(",\n")
    )
}

/// Generate CREATE INDEX statements for the filter and sort columns
pub fn generate_indexes() -> Vec<String> {
    INDEXED
        .iter()
        .map(|col| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                TABLE, col, TABLE, col
            )
        })
        .collect()
}

/// Single-statement upsert keyed on `name_lower`
pub fn generate_upsert() -> String {
    let names: Vec<&str> = COLUMNS.iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    let updates: Vec<String> = names
        .iter()
        .filter(|n| **n != "name_lower")
        .map(|n| format!("{} = excluded.{}", n, n))
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT(name_lower) DO UPDATE SET {}",
        TABLE,
        names.join(", "),
        placeholders.join(", "),
        updates.join(", ")
    )
}

/// Column list for SELECTs, `id` first
pub fn select_columns() -> String {
    std::iter::once("id")
        .chain(COLUMNS.iter().map(|c| c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS countries"));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("name_lower TEXT NOT NULL UNIQUE"));
        assert!(sql.contains("capital TEXT,"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes();
        assert!(indexes.iter().any(|i| i.contains("idx_countries_region")));
        assert!(indexes.iter().any(|i| i.contains("idx_countries_currency_code")));
    }

    #[test]
    fn test_generate_upsert() {
        let sql = generate_upsert();
        assert!(sql.contains("VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"));
        assert!(sql.contains("ON CONFLICT(name_lower) DO UPDATE SET name = excluded.name"));
        assert!(!sql.contains("name_lower = excluded.name_lower"));
    }
}
