#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

pub mod client;
pub mod engine;
pub mod translate;

pub use client::{AirtableClient, AirtableRecord};
pub use engine::{AirtableSyncService, SyncOutcome, SyncRunner};
