// src/lib.rs
#![doc = include_str!("../README.md")]

#[doc = include_str!("../doc/feed.md")]
pub mod feed;

#[doc = include_str!("../doc/graph.md")]
pub mod graph;

#[doc = include_str!("../doc/path_request.md")]
pub mod path_request;

#[doc = include_str!("../doc/view.md")]
pub mod view;

pub mod config;

pub mod mock_feed;
