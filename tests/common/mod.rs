#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use halving_bot::blockchain::{BlockRecord, BlockStore, ChainSource, FetchError};
use halving_bot::bot::{
    Alert, AlertChannels, AssetSource, ChannelPermissions, ChannelRef, ChatError, GuildRef,
    StatusSink,
};

pub fn temp_store() -> (tempfile::TempDir, BlockStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = BlockStore::new(dir.path().join("block_data.txt"));
    (dir, store)
}

/// Ten-minute spaced timestamps, one per height.
pub fn block_time(height: u64) -> String {
    let base = chrono::DateTime::parse_from_rfc3339("2024-04-01T00:00:00Z").unwrap();
    let t = base + chrono::TimeDelta::minutes(10 * (height % 10_000) as i64);
    t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub fn record(height: u64) -> BlockRecord {
    BlockRecord::new(height, block_time(height))
}

#[derive(Default)]
pub struct FakeChain {
    pub tip: Mutex<Option<u64>>,
    pub failing: Mutex<HashSet<u64>>,
    pub calls: Mutex<usize>,
}

impl FakeChain {
    pub fn at(tip: u64) -> Self {
        let chain = Self::default();
        chain.set_tip(Some(tip));
        chain
    }

    pub fn set_tip(&self, tip: Option<u64>) {
        *self.tip.lock().unwrap() = tip;
    }

    pub fn fail_block(&self, height: u64) {
        self.failing.lock().unwrap().insert(height);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ChainSource for FakeChain {
    async fn chain_height(&self) -> Result<u64, FetchError> {
        *self.calls.lock().unwrap() += 1;
        self.tip.lock().unwrap().ok_or(FetchError::Status(503))
    }

    async fn block(&self, height: u64) -> Result<BlockRecord, FetchError> {
        *self.calls.lock().unwrap() += 1;
        if self.failing.lock().unwrap().contains(&height) {
            return Err(FetchError::Status(429));
        }
        Ok(record(height))
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub texts: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

impl StatusSink for RecordingSink {
    fn set_status(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }
}

pub fn channel(id: u64, send_messages: bool, attach_files: bool) -> ChannelRef {
    ChannelRef {
        id,
        name: format!("channel-{id}"),
        permissions: ChannelPermissions {
            send_messages,
            attach_files,
        },
    }
}

#[derive(Default)]
pub struct FakeChannels {
    pub guilds: Mutex<Vec<(GuildRef, Vec<ChannelRef>)>>,
    pub posts: Mutex<Vec<(u64, Alert)>>,
    pub reject_posts: Mutex<bool>,
    /// Guilds that are listed but whose channels cannot be resolved yet.
    pub uncached: Mutex<Vec<u64>>,
}

impl FakeChannels {
    pub fn with_guild(self, id: u64, channels: Vec<ChannelRef>) -> Self {
        let guild = GuildRef {
            id,
            name: format!("guild-{id}"),
        };
        self.guilds.lock().unwrap().push((guild, channels));
        self
    }

    pub fn set_channels(&self, guild_id: u64, channels: Vec<ChannelRef>) {
        let mut guilds = self.guilds.lock().unwrap();
        if let Some((_, c)) = guilds.iter_mut().find(|(g, _)| g.id == guild_id) {
            *c = channels;
        }
    }

    pub fn set_uncached(&self, ids: &[u64]) {
        *self.uncached.lock().unwrap() = ids.to_vec();
    }

    pub fn posts(&self) -> Vec<(u64, Alert)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertChannels for FakeChannels {
    async fn guilds(&self) -> Vec<GuildRef> {
        self.guilds.lock().unwrap().iter().map(|(g, _)| g.clone()).collect()
    }

    async fn text_channels(&self, guild: &GuildRef) -> Result<Vec<ChannelRef>, ChatError> {
        if self.uncached.lock().unwrap().contains(&guild.id) {
            return Err(ChatError::Rejected(format!("guild {} is not cached yet", guild.name)));
        }
        let guilds = self.guilds.lock().unwrap();
        guilds
            .iter()
            .find(|(g, _)| g.id == guild.id)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| ChatError::Rejected(format!("unknown guild {}", guild.id)))
    }

    async fn post(&self, channel: &ChannelRef, alert: &Alert) -> Result<(), ChatError> {
        if *self.reject_posts.lock().unwrap() {
            return Err(ChatError::Rejected("missing access".into()));
        }
        self.posts.lock().unwrap().push((channel.id, alert.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAssets {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub fetches: Mutex<usize>,
}

impl FakeAssets {
    pub fn serving(url: &str, bytes: &[u8]) -> Self {
        let assets = Self::default();
        assets
            .files
            .lock()
            .unwrap()
            .insert(url.to_string(), bytes.to_vec());
        assets
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl AssetSource for FakeAssets {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        *self.fetches.lock().unwrap() += 1;
        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::Status(404))
    }
}
