//! Cache of previously computed distribution maps.
//!
//! Maps are matched by unit count only. A hit means "a map was already
//! computed for this many units", not "for these weights": a decomposition
//! that keeps its sub-domain count across steps keeps its assignment until
//! the cache is flushed.

use std::io;

use distmap_core::DistributionMap;
use tracing::{debug, warn};

/// Append-only list of maps, newest last. Entries are never modified; the
/// only removal is [`AssignmentCache::clear`].
#[derive(Debug, Default, Clone)]
pub struct AssignmentCache {
    maps: Vec<DistributionMap>,
}

impl AssignmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently inserted map covering exactly `nunits` units.
    pub fn lookup(&self, nunits: usize) -> Option<&DistributionMap> {
        self.maps.iter().rev().find(|map| map.len() == nunits)
    }

    /// Append `map` unless a map with the same unit count is already cached.
    /// Returns whether the map was stored.
    ///
    /// A cached map of the same length that differs from `map` is kept; the
    /// mismatch is logged, and is an assertion failure in debug builds.
    pub fn insert(&mut self, map: &DistributionMap) -> bool {
        if map.is_empty() {
            return false;
        }
        if let Some(existing) = self.maps.iter().find(|cached| cached.len() == map.len()) {
            if existing != map {
                warn!(
                    units = map.len(),
                    "cache already holds a different map for this unit count, keeping cached map"
                );
            }
            debug_assert_eq!(existing, map);
            return false;
        }
        debug!(units = map.len(), cached = self.maps.len() + 1, "caching distribution map");
        self.maps.push(map.clone());
        true
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DistributionMap> {
        self.maps.iter()
    }

    /// Write the number of cached maps and each map's unit count.
    pub fn write_stats<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "The distribution map cache contains {} map(s):",
            self.maps.len()
        )?;
        if !self.maps.is_empty() {
            for (idx, map) in self.maps.iter().enumerate() {
                writeln!(out, "\tMap #{idx} covers {} units", map.len())?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
