use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use super::BlockRecord;

/// Path of the Bitcoin mainnet chain resource on the explorer API.
pub const CHAIN_PATH: &str = "/v1/btc/main";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Read-only view of the chain tip and individual blocks.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Current height of the chain tip.
    async fn chain_height(&self) -> Result<u64, FetchError>;

    /// Height and timestamp of the block at `height`.
    async fn block(&self, height: u64) -> Result<BlockRecord, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ChainInfo {
    height: u64,
}

#[derive(Debug, Deserialize)]
struct BlockInfo {
    height: u64,
    time: String,
}

pub(crate) fn parse_chain_height(body: &str) -> Result<u64, FetchError> {
    let info: ChainInfo = serde_json::from_str(body)?;
    Ok(info.height)
}

pub(crate) fn parse_block(body: &str) -> Result<BlockRecord, FetchError> {
    let info: BlockInfo = serde_json::from_str(body)?;
    Ok(BlockRecord::new(info.height, info.time))
}

/// `ChainSource` backed by the BlockCypher REST API.
#[derive(Debug, Clone)]
pub struct BlockCypherClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BlockCypherClient {
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: Option<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token,
        }
    }

    pub fn chain_url(&self) -> String {
        format!("{}{}", self.base_url, CHAIN_PATH)
    }

    pub fn block_url(&self, height: u64) -> String {
        match &self.token {
            Some(token) => format!("{}/blocks/{height}?token={token}", self.chain_url()),
            None => format!("{}/blocks/{height}", self.chain_url()),
        }
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ChainSource for BlockCypherClient {
    async fn chain_height(&self) -> Result<u64, FetchError> {
        let body = self.get_body(&self.chain_url()).await?;
        let height = parse_chain_height(&body)?;
        debug!("CHAIN - tip height {}", height);
        Ok(height)
    }

    async fn block(&self, height: u64) -> Result<BlockRecord, FetchError> {
        let body = self.get_body(&self.block_url(height)).await?;
        parse_block(&body)
    }
}
