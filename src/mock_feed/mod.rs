// src/mock_feed/mod.rs

pub mod quotes;
pub mod server;

pub use server::{MockMarket, PairSpec, spawn};
