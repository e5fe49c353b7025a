use glam::Vec2;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tileworld_kernel::World;

/// Label raster pixels per world unit.
pub const PIXELS_PER_UNIT: f32 = 16.0;

/// Labels sit this far above their entity.
pub const LABEL_OFFSET: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    /// Centre of the label in world units.
    pub position: Vec2,
}

/// Username labels for every player except the local one.
pub fn player_labels(world: &World) -> Vec<Label> {
    let local = world.local_player_id();
    world
        .entities()
        .values()
        .filter(|e| Some(&e.id) != local)
        .filter_map(|e| {
            e.as_player().map(|p| Label {
                text: p.username.clone(),
                position: e.position + Vec2::new(0.0, LABEL_OFFSET),
            })
        })
        .collect()
}

/// Resources derived from a string, built once on first use and reused for
/// every later request of the exact same string. A failed build is
/// remembered so it is logged once and not retried while the label stays
/// on screen.
#[derive(Debug)]
pub struct TextCache<T> {
    entries: HashMap<String, T>,
    failed: HashSet<String>,
    misses: u64,
}

impl<T> Default for TextCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            failed: HashSet::new(),
            misses: 0,
        }
    }
}

impl<T> TextCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `text`, building it on first use.
    pub fn resolve<E: fmt::Display>(
        &mut self,
        text: &str,
        make: impl FnOnce(&str) -> Result<T, E>,
    ) -> Option<&T> {
        if self.failed.contains(text) {
            return None;
        }
        if !self.entries.contains_key(text) {
            self.misses += 1;
            match make(text) {
                Ok(value) => {
                    self.entries.insert(text.to_owned(), value);
                }
                Err(err) => {
                    tracing::warn!(text, error = %err, "label skipped");
                    self.failed.insert(text.to_owned());
                    return None;
                }
            }
        }
        self.entries.get(text)
    }

    /// Resolve this frame's labels, up to `limit` of them, and drop cached
    /// strings no longer on screen. Returns the labels that have a value.
    pub fn prepare<'l, E: fmt::Display>(
        &mut self,
        labels: &'l [Label],
        limit: usize,
        mut make: impl FnMut(&str) -> Result<T, E>,
    ) -> Vec<&'l Label> {
        let mut ready = Vec::new();
        for label in labels {
            if ready.len() == limit {
                break;
            }
            if self.resolve(&label.text, &mut make).is_some() {
                ready.push(label);
            }
        }
        let evicted = self.retain_only(labels.iter().map(|l| l.text.as_str()));
        if evicted > 0 {
            tracing::debug!(evicted, cached = self.entries.len(), "label cache trimmed");
        }
        ready
    }

    /// Keep only the strings in `keep`. Returns how many values were dropped.
    pub fn retain_only<'a>(&mut self, keep: impl IntoIterator<Item = &'a str>) -> usize {
        let keep: HashSet<&str> = keep.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|text, _| keep.contains(text.as_str()));
        self.failed.retain(|text| keep.contains(text.as_str()));
        before - self.entries.len()
    }

    pub fn get(&self, text: &str) -> Option<&T> {
        self.entries.get(text)
    }

    pub fn is_failed(&self, text: &str) -> bool {
        self.failed.contains(text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of builds so far.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.failed.clear();
    }
}
