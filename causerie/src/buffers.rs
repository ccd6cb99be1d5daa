// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Registry of per-conversation history buffers, keyed by lowercased
//! bare JID.

use std::collections::{HashMap, HashSet};

use crate::hbuf::HistoryBuffer;

/// All live buffers.
#[derive(Default)]
pub struct Buffers {
    map: HashMap<String, HistoryBuffer>,
    replayed: HashSet<String>,
}

impl Buffers {
    /// Creates an empty registry.
    pub fn new() -> Buffers {
        Buffers::default()
    }

    fn key(bjid: &str) -> String {
        bjid.to_ascii_lowercase()
    }

    /// Whether a buffer exists for this JID.
    pub fn contains(&self, bjid: &str) -> bool {
        self.map.contains_key(&Self::key(bjid))
    }

    /// Returns the buffer, creating it if needed.  The `created` out
    /// parameter tells the caller to run the one-time history replay.
    pub fn get_or_create(&mut self, bjid: &str, created: &mut bool) -> &mut HistoryBuffer {
        let key = Self::key(bjid);
        *created = !self.map.contains_key(&key) && self.replayed.insert(key.clone());
        self.map.entry(key).or_default()
    }

    /// Returns an existing buffer.
    pub fn get_mut(&mut self, bjid: &str) -> Option<&mut HistoryBuffer> {
        self.map.get_mut(&Self::key(bjid))
    }

    /// Read-only access.
    pub fn get(&self, bjid: &str) -> Option<&HistoryBuffer> {
        self.map.get(&Self::key(bjid))
    }

    /// Drops a buffer entirely (buffer purge on close).
    pub fn purge(&mut self, bjid: &str) {
        self.map.remove(&Self::key(bjid));
        // A later reopen replays the file again.
        self.replayed.remove(&Self::key(bjid));
    }

    /// Re-wraps every buffer for a new display width.
    pub fn rebuild_all(&mut self, width: usize) {
        for buffer in self.map.values_mut() {
            buffer.rebuild(width);
        }
    }
}
