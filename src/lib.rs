pub mod api;
pub mod blockchain;
pub mod bot;
pub mod config;
pub mod halving;
pub mod scheduler;
