pub mod config;
pub mod db;
pub mod snapshot_store;
