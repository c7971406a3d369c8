use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::query::CountryFilter;
use super::schema::{generate_create_table, generate_indexes, generate_upsert, select_columns, TABLE};
use crate::error::{Error, Result};
use crate::model::{normalize_name, CountryRecord, CountryRow};

/// Row count and most recent refresh time
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStatus {
    pub total_countries: u64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

/// SQLite-backed country table. The connection is shared behind a mutex;
/// callers on the async runtime go through [`CountryStore::call`].
pub struct CountryStore {
    conn: Mutex<Connection>,
}

impl CountryStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;

        debug!(path = ?db_path, "opened database");
        Self::migrate(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::migrate(Connection::open_in_memory()?)
    }

    fn migrate(conn: Connection) -> Result<Self> {
        conn.execute(&generate_create_table(), [])?;
        for index_sql in generate_indexes() {
            conn.execute(&index_sql, [])?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run blocking store work off the async runtime
    pub async fn call<F, T>(self: &Arc<Self>, f: F) -> Result<T>
    where
        F: FnOnce(&CountryStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| Error::Internal(format!("store task failed: {}", e)))?
    }

    /// Upsert every row in one transaction. Any failure rolls the whole batch
    /// back when the transaction is dropped uncommitted.
    pub fn upsert_all(&self, rows: &[CountryRow]) -> Result<usize> {
        self.refresh_with(rows, 0, |_, _| Ok(rows.len()))
    }

    /// Upsert `rows`, then hand the post-upsert status and top `top_n` rows
    /// to `finish` while the transaction is still open. The transaction only
    /// commits if `finish` succeeds.
    pub fn refresh_with<F, T>(&self, rows: &[CountryRow], top_n: usize, finish: F) -> Result<T>
    where
        F: FnOnce(&StoreStatus, &[CountryRecord]) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(&generate_upsert())?;
            for row in rows {
                stmt.execute(params![
                    row.name,
                    row.name_lower(),
                    row.capital,
                    row.region,
                    row.population,
                    row.currency_code,
                    row.exchange_rate,
                    row.estimated_gdp,
                    row.flag_url,
                    row.last_refreshed_at,
                ])?;
            }
        }

        let status = read_status(&tx)?;
        let top = if top_n > 0 { read_top(&tx, top_n)? } else { Vec::new() };
        let out = finish(&status, &top)?;

        tx.commit()?;
        debug!(count = rows.len(), "upserted countries");
        Ok(out)
    }

    pub fn list(&self, filter: &CountryFilter) -> Result<Vec<CountryRecord>> {
        let mut clauses = Vec::new();
        let mut values: Vec<&str> = Vec::new();

        if let Some(region) = &filter.region {
            clauses.push("region = ? COLLATE NOCASE");
            values.push(region);
        }
        if let Some(currency) = &filter.currency {
            clauses.push("currency_code = ? COLLATE NOCASE");
            values.push(currency);
        }

        let mut sql = format!("SELECT {} FROM {}", select_columns(), TABLE);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push(' ');
        sql.push_str(filter.sort.order_by());

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(values), read_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Look up by display name, compared on the normalized key
    pub fn get(&self, name: &str) -> Result<Option<CountryRecord>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE name_lower = ?1",
            select_columns(),
            TABLE
        );

        let conn = self.conn.lock();
        let record = conn
            .query_row(&sql, [normalize_name(name)], read_record)
            .optional()?;

        Ok(record)
    }

    /// Returns whether a row was removed
    pub fn delete(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE name_lower = ?1", TABLE),
            [normalize_name(name)],
        )?;

        Ok(removed > 0)
    }

    pub fn status(&self) -> Result<StoreStatus> {
        read_status(&self.conn.lock())
    }

    /// Highest estimates first; rows without an estimate are left out
    pub fn top_by_gdp(&self, limit: usize) -> Result<Vec<CountryRecord>> {
        read_top(&self.conn.lock(), limit)
    }
}

fn read_status(conn: &Connection) -> Result<StoreStatus> {
    let (count, last): (i64, Option<DateTime<Utc>>) = conn.query_row(
        &format!("SELECT COUNT(*), MAX(last_refreshed_at) FROM {}", TABLE),
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(StoreStatus {
        total_countries: count as u64,
        last_refreshed_at: last,
    })
}

fn read_top(conn: &Connection, limit: usize) -> Result<Vec<CountryRecord>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE estimated_gdp IS NOT NULL \
         ORDER BY estimated_gdp DESC, id LIMIT ?1",
        select_columns(),
        TABLE
    );

    let mut stmt = conn.prepare(&sql)?;
    let records = stmt
        .query_map([limit as i64], read_record)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

fn read_record(row: &Row) -> rusqlite::Result<CountryRecord> {
    Ok(CountryRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        name_lower: row.get("name_lower")?,
        capital: row.get("capital")?,
        region: row.get("region")?,
        population: row.get("population")?,
        currency_code: row.get("currency_code")?,
        exchange_rate: row.get("exchange_rate")?,
        estimated_gdp: row.get("estimated_gdp")?,
        flag_url: row.get("flag_url")?,
        last_refreshed_at: row.get("last_refreshed_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortOrder;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 22, hour, 0, 0).unwrap()
    }

    fn row(name: &str, region: &str, currency: Option<&str>, gdp: Option<f64>) -> CountryRow {
        CountryRow {
            name: name.to_string(),
            capital: None,
            region: Some(region.to_string()),
            population: Some(1_000),
            currency_code: currency.map(str::to_string),
            exchange_rate: currency.map(|_| 2.0),
            estimated_gdp: gdp,
            flag_url: None,
            last_refreshed_at: at(9),
        }
    }

    fn seeded() -> CountryStore {
        let store = CountryStore::in_memory().unwrap();
        store
            .upsert_all(&[
                row("Nigeria", "Africa", Some("NGN"), Some(300.0)),
                row("Ghana", "Africa", Some("GHS"), Some(900.0)),
                row("France", "Europe", Some("EUR"), Some(600.0)),
                row("Germany", "Europe", Some("EUR"), None),
                row("Antarctica", "Polar", None, Some(0.0)),
            ])
            .unwrap();
        store
    }

    fn names(records: &[CountryRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_empty_status() {
        let store = CountryStore::in_memory().unwrap();
        let status = store.status().unwrap();
        assert_eq!(status.total_countries, 0);
        assert_eq!(status.last_refreshed_at, None);
    }

    #[test]
    fn test_upsert_overwrites_by_normalized_name() {
        let store = seeded();
        let mut again = row("NIGERIA", "Africa", Some("NGN"), Some(1.0));
        again.last_refreshed_at = at(10);
        store.upsert_all(&[again]).unwrap();

        let status = store.status().unwrap();
        assert_eq!(status.total_countries, 5);
        assert_eq!(status.last_refreshed_at, Some(at(10)));

        let record = store.get("nigeria").unwrap().unwrap();
        assert_eq!(record.name, "NIGERIA");
        assert_eq!(record.name_lower, "nigeria");
        assert_eq!(record.estimated_gdp, Some(1.0));
    }

    #[test]
    fn test_failed_upsert_rolls_back() {
        let store = CountryStore::in_memory().unwrap();
        let mut bad = row("Broken", "Nowhere", Some("BRK"), None);
        bad.exchange_rate = Some(-1.0);

        let result = store.upsert_all(&[row("Chad", "Africa", None, Some(0.0)), bad]);
        assert!(matches!(result, Err(Error::Database(_))));
        assert_eq!(store.status().unwrap().total_countries, 0);
    }

    #[test]
    fn test_refresh_with_rolls_back_when_finish_fails() {
        let store = seeded();

        let result: Result<()> = store.refresh_with(
            &[row("Chad", "Africa", None, Some(0.0))],
            5,
            |status, top| {
                // The callback sees the uncommitted rows
                assert_eq!(status.total_countries, 6);
                assert_eq!(top.len(), 5);
                Err(Error::Internal("render failed".into()))
            },
        );

        assert!(matches!(result, Err(Error::Internal(_))));
        assert_eq!(store.status().unwrap().total_countries, 5);
        assert!(store.get("chad").unwrap().is_none());
    }

    #[test]
    fn test_list_filters_compose() {
        let store = seeded();

        let all = store.list(&CountryFilter::default()).unwrap();
        assert_eq!(names(&all), ["Nigeria", "Ghana", "France", "Germany", "Antarctica"]);

        let africa = store
            .list(&CountryFilter::parse(Some("africa"), None, None).unwrap())
            .unwrap();
        assert_eq!(names(&africa), ["Nigeria", "Ghana"]);

        let euro = store
            .list(&CountryFilter::parse(Some("Europe"), Some("eur"), None).unwrap())
            .unwrap();
        assert_eq!(names(&euro), ["France", "Germany"]);

        let none = store
            .list(&CountryFilter::parse(Some("Africa"), Some("EUR"), None).unwrap())
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_list_sorts_by_gdp_with_nulls_last() {
        let store = seeded();
        let filter = CountryFilter {
            sort: SortOrder::GdpDesc,
            ..CountryFilter::default()
        };
        let sorted = store.list(&filter).unwrap();
        assert_eq!(names(&sorted), ["Ghana", "France", "Nigeria", "Antarctica", "Germany"]);

        let filter = CountryFilter {
            sort: SortOrder::GdpAsc,
            ..CountryFilter::default()
        };
        let sorted = store.list(&filter).unwrap();
        assert_eq!(names(&sorted), ["Antarctica", "Nigeria", "France", "Ghana", "Germany"]);
    }

    #[test]
    fn test_get_and_delete() {
        let store = seeded();

        assert!(store.get("Atlantis").unwrap().is_none());
        assert_eq!(store.get("GHANA").unwrap().unwrap().name, "Ghana");

        assert!(store.delete("ghana").unwrap());
        assert!(!store.delete("ghana").unwrap());
        assert!(store.get("Ghana").unwrap().is_none());
        assert_eq!(store.status().unwrap().total_countries, 4);
    }

    #[test]
    fn test_top_by_gdp_excludes_nulls() {
        let store = seeded();
        let top = store.top_by_gdp(5).unwrap();
        assert_eq!(names(&top), ["Ghana", "France", "Nigeria", "Antarctica"]);

        let top = store.top_by_gdp(2).unwrap();
        assert_eq!(names(&top), ["Ghana", "France"]);
    }

    #[test]
    fn test_open_creates_file_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("countries.db");

        CountryStore::open(&path)
            .unwrap()
            .upsert_all(&[row("Chad", "Africa", None, Some(0.0))])
            .unwrap();

        let reopened = CountryStore::open(&path).unwrap();
        assert_eq!(reopened.status().unwrap().total_countries, 1);
    }
}
