pub mod block;
pub mod client;
pub mod poller;
pub mod store;

pub use block::BlockRecord;
pub use client::{BlockCypherClient, ChainSource, FetchError};
pub use poller::{Backoff, ChainPoller, PollError};
pub use store::{BlockStore, StoreError};

/// Default explorer endpoint.
pub const DEFAULT_EXPLORER_URL: &str = "https://api.blockcypher.com";

/// Blocks retained in the store, and blocks fetched by the initial backfill.
pub const DEFAULT_STORE_WINDOW: usize = 6;

/// Explorer calls per hour we allow ourselves (the free tier allows 100).
pub const DEFAULT_API_CALLS_PER_HOUR: u64 = 90;
