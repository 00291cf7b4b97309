//! Compressed cache of parsed network logs.
//!
//! Raw event logs from long simulations run to hundreds of megabytes of
//! JSON. The parsed event list is stored beside the input as
//! `<input>.events.zst` (bincode inside zstd) and reused while it is at
//! least as new as the input.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};

use super::log_parser::load_network_log;
use super::types::*;

const CACHE_SUFFIX: &str = "events.zst";
const ZSTD_LEVEL: i32 = 3;

/// Cache location for an input log.
pub fn cache_path_for(input: &Path) -> PathBuf {
    let mut name = input.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(CACHE_SUFFIX);
    input.with_file_name(name)
}

/// True when the cache exists and is not older than the input.
pub fn is_fresh(input: &Path, cache: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(input), modified(cache)) {
        (Some(input_time), Some(cache_time)) => cache_time >= input_time,
        _ => false,
    }
}

pub fn write_cache(path: &Path, events: &[NetworkEvent]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create event cache {}", path.display()))?;
    let mut encoder = zstd::stream::Encoder::new(BufWriter::new(file), ZSTD_LEVEL)
        .context("Failed to start zstd encoder")?;

    bincode::serialize_into(&mut encoder, events)
        .with_context(|| format!("Failed to serialize events into {}", path.display()))?;
    encoder
        .finish()
        .with_context(|| format!("Failed to finish event cache {}", path.display()))?;

    Ok(())
}

pub fn read_cache(path: &Path) -> Result<Vec<NetworkEvent>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open event cache {}", path.display()))?;
    let decoder = zstd::stream::Decoder::new(BufReader::new(file))
        .context("Failed to start zstd decoder")?;

    let events: Vec<NetworkEvent> = bincode::deserialize_from(decoder)
        .with_context(|| format!("Failed to deserialize event cache {}", path.display()))?;

    Ok(events)
}

/// Load a network log through its cache, refreshing the cache when stale.
///
/// An unreadable cache is ignored and rebuilt; failing to write the cache
/// only costs the next run a reparse.
pub fn load_with_cache(input: &Path) -> Result<Vec<NetworkEvent>> {
    let cache = cache_path_for(input);

    if is_fresh(input, &cache) {
        match read_cache(&cache) {
            Ok(events) => {
                log::info!("Loaded {} events from cache {}", events.len(), cache.display());
                return Ok(events);
            }
            Err(e) => log::warn!("Ignoring unreadable event cache: {:#}", e),
        }
    }

    let events = load_network_log(input)?;

    match write_cache(&cache, &events) {
        Ok(()) => log::debug!("Event cache written to {}", cache.display()),
        Err(e) => log::warn!("Could not write event cache: {:#}", e),
    }

    Ok(events)
}
