//! Offline access to Pokemon random battle sets.
//!
//! Set files are downloaded from the pkmn randbats repository, cached as
//! flat JSON files and refreshed once they are older than the update
//! interval (24 hours by default). Lookups are served from memory and keep
//! working from the cache, or bundled data, when the network is down.
//!
//! ```no_run
//! use randbats_core::{Config, RandBatsData};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let data = RandBatsData::open(Config::load()?).await?;
//! if let Some(set) = data.get_pokemon("Pikachu", None) {
//!     println!("{}", set["level"]);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod formats;
pub mod models;
pub mod store;
pub mod updater;
pub mod utils;

pub use api::{ApiError, RemoteClient, RemoteEndpoints};
pub use cache::CacheManager;
pub use config::Config;
pub use models::{CacheInfo, FormatData, FormatMetadata, RandomSet, StatsSummary};
pub use store::{PokemonMatch, RandBatsData, RefreshEvent, RefresherHandle, SearchResults};
pub use updater::{UpdateReport, Updater};
