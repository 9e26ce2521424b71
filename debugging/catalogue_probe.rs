//! Run discovery or a detail lookup against the live catalogue and print the
//! records as JSON.
//! Usage:
//!   cargo run --bin catalogue_probe -- discover [genre_id]
//!   cargo run --bin catalogue_probe -- detail <movie_id>
//! Requires API_TOKEN in the environment (.env supported).

use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use reelscout::catalogue::{CatalogueApi, TmdbClient};
use reelscout::discovery::Discovery;
use reelscout::enrichment::EnrichmentCache;
use reelscout::models::GenreFilter;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Probe {
    Discover,
    Detail,
}

impl FromStr for Probe {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "discover" => Ok(Probe::Discover),
            "detail" => Ok(Probe::Detail),
            _ => Err(anyhow!("probe must be 'discover' or 'detail'")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin catalogue_probe -- discover [genre_id]");
        eprintln!("       cargo run --bin catalogue_probe -- detail <movie_id>");
        std::process::exit(1);
    }

    let probe = Probe::from_str(&args[1])?;
    let api: Arc<dyn CatalogueApi> = Arc::new(TmdbClient::from_env()?);

    match probe {
        Probe::Discover => {
            let genre = match args.get(2) {
                Some(raw) => {
                    let id: u32 = raw.parse().context("genre_id must be an integer")?;
                    Some(GenreFilter::from_id(id).ok_or_else(|| anyhow!("unknown genre {id}"))?)
                }
                None => None,
            };
            let movies = Discovery::new(api).discover(genre.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&movies)?);
            eprintln!("{} movies", movies.len());
        }
        Probe::Detail => {
            let id: u32 = args
                .get(2)
                .ok_or_else(|| anyhow!("missing movie id"))?
                .parse()
                .context("movie_id must be an integer")?;
            let detail = EnrichmentCache::new(api).get_detail(id).await?;
            println!("{}", serde_json::to_string_pretty(detail.as_ref())?);
        }
    }

    Ok(())
}
