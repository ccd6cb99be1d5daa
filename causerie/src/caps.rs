// Copyright (c) 2025 causerie contributors.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Entity-capability cache: what we advertise, and what remote hashes
//! have been resolved to feature sets.

use std::collections::HashMap;

use causerie_stanza::caps::{self, Caps};
use causerie_stanza::disco::{DiscoInfoResult, Feature, Identity};
use causerie_stanza::ns;

/// The caps node URI this client advertises.
pub const CAPS_NODE: &str = "https://causerie.im/caps";

/// Client software name, reused by the version responder.
pub const CLIENT_NAME: &str = "causerie";
/// Client version string.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// State of one remote capability hash.
enum CacheEntry {
    /// A disco query is in flight; don't issue another.
    Pending,
    /// The verified feature set.
    Known(DiscoInfoResult),
}

/// The capability store.
pub struct CapsCache {
    entries: HashMap<String, CacheEntry>,
    own_info: DiscoInfoResult,
    own_ver: Vec<u8>,
}

impl Default for CapsCache {
    fn default() -> Self {
        CapsCache::new()
    }
}

impl CapsCache {
    /// Builds the cache and our own advertisement.
    pub fn new() -> CapsCache {
        let own_info = own_disco_info(None);
        let own_ver = caps::hash_caps(&caps::compute_disco(&own_info));
        CapsCache {
            entries: HashMap::new(),
            own_info,
            own_ver,
        }
    }

    /// The `<c/>` payload to attach to outgoing presence.
    pub fn own_caps(&self) -> Caps {
        Caps::new(CAPS_NODE, self.own_ver.clone())
    }

    /// Our own disco#info, served to whoever asks.  When `node` names our
    /// current caps node the result carries it back.
    pub fn own_info(&self, node: Option<&str>) -> DiscoInfoResult {
        let mut info = self.own_info.clone();
        info.node = node.map(String::from);
        info
    }

    /// Whether a disco query should be issued for this hash: true only
    /// the first time a hash is seen.
    pub fn note_seen(&mut self, ver: &str) -> bool {
        if self.entries.contains_key(ver) {
            return false;
        }
        self.entries.insert(ver.to_owned(), CacheEntry::Pending);
        true
    }

    /// Stores a disco result for a hash, verifying the hash first.
    /// Returns whether the result was accepted.
    pub fn store(&mut self, ver: &str, info: DiscoInfoResult) -> bool {
        let computed = caps::hash_caps(&caps::compute_disco(&info));
        if encode_ver(&computed) != ver {
            log::warn!("capability hash mismatch, discarding result for {}", ver);
            self.entries.remove(ver);
            return false;
        }
        self.entries.insert(ver.to_owned(), CacheEntry::Known(info));
        true
    }

    /// Whether the entity with this hash supports a feature.  Unknown
    /// hashes answer `false`.
    pub fn has_feature(&self, ver: &str, feature: &str) -> bool {
        match self.entries.get(ver) {
            Some(CacheEntry::Known(info)) => info.has_feature(feature),
            _ => false,
        }
    }

    /// Whether the hash has been resolved.
    pub fn is_known(&self, ver: &str) -> bool {
        matches!(self.entries.get(ver), Some(CacheEntry::Known(_)))
    }
}

use base64::engine::general_purpose::STANDARD as base64_encode;
use base64::Engine;

fn encode_ver(raw: &[u8]) -> String {
    base64_encode.encode(raw)
}

/// The feature set this client implements.
pub fn own_disco_info(node: Option<&str>) -> DiscoInfoResult {
    DiscoInfoResult {
        node: node.map(String::from),
        identities: vec![Identity {
            category: "client".to_owned(),
            type_: "console".to_owned(),
            lang: None,
            name: Some(format!("{} {}", CLIENT_NAME, CLIENT_VERSION)),
        }],
        features: vec![
            Feature::new(ns::CAPS),
            Feature::new(ns::CHATSTATES),
            Feature::new(ns::COMMANDS),
            Feature::new(ns::DISCO_INFO),
            Feature::new(ns::LAST),
            Feature::new(ns::MUC),
            Feature::new(ns::PING),
            Feature::new(ns::RECEIPTS),
            Feature::new(ns::TIME),
            Feature::new(ns::VERSION),
        ],
        extensions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_caps_stable() {
        let cache = CapsCache::new();
        let a = cache.own_caps();
        let b = cache.own_caps();
        assert_eq!(a.ver, b.ver);
        assert_eq!(a.node, CAPS_NODE);
        assert_eq!(a.hash, "sha-1");
    }

    #[test]
    fn test_single_probe_per_hash() {
        let mut cache = CapsCache::new();
        assert!(cache.note_seen("abc="));
        assert!(!cache.note_seen("abc="));
    }

    #[test]
    fn test_store_verifies_hash() {
        let mut cache = CapsCache::new();
        let info = own_disco_info(None);
        let good = encode_ver(&causerie_stanza::caps::hash_caps(
            &causerie_stanza::caps::compute_disco(&info),
        ));
        cache.note_seen(&good);
        assert!(cache.store(&good, info.clone()));
        assert!(cache.has_feature(&good, ns::MUC));
        assert!(!cache.has_feature(&good, "urn:nonexistent"));

        cache.note_seen("bogus=");
        assert!(!cache.store("bogus=", info));
        assert!(!cache.is_known("bogus="));
        // A rejected hash may be probed again later.
        assert!(cache.note_seen("bogus="));
    }
}
