use anyhow::{Context, Result};
use country_gdp_cache::{
    api::{run_server, AppState},
    cli::{Cli, Commands},
    store::CountryStore,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse_args();
    let config = cli.config.clone();

    match cli.command() {
        Commands::Serve => {
            let addr = config.listen_addr()?;
            let state = AppState::from_config(&config).context("Failed to initialise state")?;
            run_server(state, addr).await?;
        }

        Commands::Refresh => {
            let state = AppState::from_config(&config).context("Failed to initialise state")?;
            let outcome = state.refresher.run().await.context("Refresh failed")?;

            println!(
                "Refreshed {} countries at {} ({} skipped); summary written to {:?}",
                outcome.total_countries,
                outcome.last_refreshed_at.to_rfc3339(),
                outcome.skipped,
                config.image_path
            );
        }

        Commands::Status => {
            let store = CountryStore::open(&config.db_path).context("Failed to open database")?;
            let status = store.status()?;

            println!("Total countries: {}", status.total_countries);
            match status.last_refreshed_at {
                Some(at) => println!("Last refreshed:  {}", at.to_rfc3339()),
                None => println!("Last refreshed:  never"),
            }
        }
    }

    Ok(())
}
