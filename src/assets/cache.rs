//! Memoized vector asset cache with supersede-safe updates.
//!
//! An update is split into [`VectorAssetCache::begin`] (cheap, resolves memo hits),
//! [`DecodeJob::run`] (the decode work, which may be deferred by the host) and
//! [`VectorAssetCache::commit`]. Every `begin` bumps the generation; an outcome from an older
//! generation is discarded on commit so a slow decode can never replace a newer snapshot.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::assets::decode::{VectorAsset, VectorAssetSet, decode_svg};

/// Immutable view of the decoded assets for one generation.
#[derive(Clone, Debug, Default)]
pub struct AssetSnapshot {
    generation: u64,
    assets: HashMap<String, VectorAsset>,
    failed: BTreeSet<String>,
}

impl AssetSnapshot {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn get(&self, part: &str) -> Option<&VectorAsset> {
        self.assets.get(part)
    }

    pub fn contains(&self, part: &str) -> bool {
        self.assets.contains_key(part)
    }

    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    /// Parts whose source failed to decode; they have no drawing.
    pub fn failed_parts(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(String::as_str)
    }

    pub fn is_failed(&self, part: &str) -> bool {
        self.failed.contains(part)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Decode work captured by [`VectorAssetCache::begin`].
#[derive(Debug)]
pub struct DecodeJob {
    generation: u64,
    resolved: Vec<(String, String, Option<VectorAsset>)>,
    pending: Vec<(String, String)>,
}

/// Result of running a [`DecodeJob`].
#[derive(Debug)]
pub struct DecodeOutcome {
    generation: u64,
    resolved: Vec<(String, String, Option<VectorAsset>)>,
    decoded: Vec<(String, String, Option<VectorAsset>)>,
    decode_calls: u64,
}

impl DecodeJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of sources that still need decoding (memo misses).
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn run(self) -> DecodeOutcome {
        let mut by_source: HashMap<&str, Option<VectorAsset>> = HashMap::new();
        let mut decoded = Vec::with_capacity(self.pending.len());
        for (part, source) in &self.pending {
            let asset = by_source
                .entry(source.as_str())
                .or_insert_with(|| match decode_svg(source) {
                    Ok(asset) => Some(asset),
                    Err(e) => {
                        tracing::warn!(part = %part, error = %e, "vector asset decode failed");
                        None
                    }
                })
                .clone();
            decoded.push((part.clone(), source.clone(), asset));
        }
        let decode_calls = by_source.len() as u64;

        DecodeOutcome {
            generation: self.generation,
            resolved: self.resolved,
            decoded,
            decode_calls,
        }
    }
}

/// Owned, content-addressed cache of decoded body-part drawings.
#[derive(Debug, Default)]
pub struct VectorAssetCache {
    generation: u64,
    snapshot: Arc<AssetSnapshot>,
    // Source text -> decoded asset (`None` records a failed decode).
    memo: HashMap<String, Option<VectorAsset>>,
    decode_calls: u64,
}

impl VectorAssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest requested generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current snapshot; cheap to clone and hold across frames.
    pub fn snapshot(&self) -> Arc<AssetSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Total number of decoder invocations so far.
    pub fn decode_calls(&self) -> u64 {
        self.decode_calls
    }

    /// Start an update to `set`, superseding any outstanding job.
    pub fn begin(&mut self, set: &VectorAssetSet) -> DecodeJob {
        self.generation += 1;

        let mut resolved = Vec::new();
        let mut pending = Vec::new();
        for (part, source) in set.iter() {
            match self.memo.get(source) {
                Some(hit) => resolved.push((part.to_string(), source.to_string(), hit.clone())),
                None => pending.push((part.to_string(), source.to_string())),
            }
        }

        tracing::debug!(
            generation = self.generation,
            hits = resolved.len(),
            misses = pending.len(),
            "vector asset update started"
        );

        DecodeJob {
            generation: self.generation,
            resolved,
            pending,
        }
    }

    /// Install the outcome if it belongs to the latest generation.
    ///
    /// Returns `false` (and leaves the cache untouched apart from the decode counter) when the
    /// outcome was superseded or cancelled.
    pub fn commit(&mut self, outcome: DecodeOutcome) -> bool {
        self.decode_calls += outcome.decode_calls;

        if outcome.generation != self.generation {
            tracing::debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding superseded vector asset decode"
            );
            return false;
        }

        let mut live_sources = HashSet::new();
        let mut assets = HashMap::new();
        let mut failed = BTreeSet::new();

        for (part, source, asset) in outcome.resolved {
            live_sources.insert(source);
            match asset {
                Some(asset) => {
                    assets.insert(part, asset);
                }
                None => {
                    failed.insert(part);
                }
            }
        }
        for (part, source, asset) in outcome.decoded {
            match &asset {
                Some(asset) => {
                    assets.insert(part, asset.clone());
                }
                None => {
                    failed.insert(part);
                }
            }
            self.memo.insert(source.clone(), asset);
            live_sources.insert(source);
        }

        // Superseded sources are released; failures stay memoized while still referenced.
        self.memo.retain(|source, _| live_sources.contains(source));

        self.snapshot = Arc::new(AssetSnapshot {
            generation: outcome.generation,
            assets,
            failed,
        });
        true
    }

    /// Decode `set` synchronously and install it.
    #[tracing::instrument(skip_all, fields(parts = set.len()))]
    pub fn update(&mut self, set: &VectorAssetSet) -> Arc<AssetSnapshot> {
        let job = self.begin(set);
        let outcome = job.run();
        self.commit(outcome);
        self.snapshot()
    }

    /// Invalidate any outstanding job without touching the current snapshot.
    pub fn cancel_pending(&mut self) {
        self.generation += 1;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
