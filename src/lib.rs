//! Bluesky chat bridge core: conversation log entries in, normalized
//! messages out.

pub mod config;
pub mod delivery;
pub mod error;
pub mod identity;
pub mod lexicon;
pub mod pipeline;
