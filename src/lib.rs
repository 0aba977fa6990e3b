//! newsdesk: a one-shot feed crawler.
//!
//! Fetches a configured list of RSS/Atom feeds, normalizes their entries
//! into canonical article records, classifies each by topic, and stores them
//! in SQLite keyed on link so repeated runs never duplicate an article.

pub mod config;
pub mod ingest;
pub mod storage;
