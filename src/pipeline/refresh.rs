use chrono::{DateTime, SubsecRound, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::info;

use super::derive::derive_batch;
use crate::error::{Error, Result};
use crate::render::{stage_summary, Summary};
use crate::sources::{fetch_all, ExternalSources, COUNTRIES_SOURCE};
use crate::store::CountryStore;

/// How many countries the summary image lists
pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub total_countries: u64,
    pub last_refreshed_at: DateTime<Utc>,
    pub skipped: usize,
}

/// Runs the fetch, derive, persist and render cycle. Runs are serialized so
/// two refreshes never interleave their upserts or image writes.
pub struct Refresher {
    sources: Arc<dyn ExternalSources>,
    store: Arc<CountryStore>,
    image_path: PathBuf,
    seed: Option<u64>,
    lock: Mutex<()>,
}

impl Refresher {
    pub fn new(
        sources: Arc<dyn ExternalSources>,
        store: Arc<CountryStore>,
        image_path: PathBuf,
        seed: Option<u64>,
    ) -> Self {
        Self {
            sources,
            store,
            image_path,
            seed,
            lock: Mutex::new(()),
        }
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub async fn run(&self) -> Result<RefreshOutcome> {
        let _guard = self.lock.lock().await;
        let start = Instant::now();

        // Nothing is written unless both sources answered
        let (countries, rates) = fetch_all(self.sources.as_ref()).await?;

        let refreshed_at = Utc::now().trunc_subsecs(3);
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let batch = derive_batch(&countries, &rates, refreshed_at, &mut rng);
        let skipped = batch.skipped;
        let rows = batch.rows;
        if rows.is_empty() {
            return Err(Error::unavailable(
                COUNTRIES_SOURCE,
                format!("payload contained no usable countries ({} skipped)", skipped),
            ));
        }
        let image_path = self.image_path.clone();

        // The image is rendered inside the upsert transaction and only moved
        // into place once the rows are committed
        let (staged, status) = self
            .store
            .call(move |store| {
                store.refresh_with(&rows, TOP_N, |status, top| {
                    let summary =
                        Summary::new(status.total_countries, status.last_refreshed_at, top);
                    Ok((stage_summary(&image_path, &summary)?, status.clone()))
                })
            })
            .await?;
        staged.publish()?;
        let total_countries = status.total_countries;

        info!(
            fetched = countries.len(),
            rates = rates.len(),
            skipped,
            total_countries,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "refresh complete"
        );

        Ok(RefreshOutcome {
            total_countries,
            last_refreshed_at: status.last_refreshed_at.unwrap_or(refreshed_at),
            skipped,
        })
    }
}
