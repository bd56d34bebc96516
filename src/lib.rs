//! Local mirror of the EBS academic catalog: a throttled crawl-and-sync
//! engine plus a read-only query API over the mirrored data.

pub mod api;
pub mod config;
pub mod db;
pub mod ebs;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod state;
