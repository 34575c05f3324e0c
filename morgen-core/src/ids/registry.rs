//! Process-lifetime mapping between short virtual IDs and upstream IDs.
//!
//! Upstream IDs are long and leak structure (account hex IDs, calendar
//! emails). Callers only ever see 7-character tokens minted here. The
//! mapping lives in memory only, so after a restart every token is unknown
//! until the caller lists entities again.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MorgenError, MorgenResult};

pub const VIRTUAL_ID_LEN: usize = 7;

/// URL-safe base64 alphabet.
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Opaque caller-facing token standing in for an upstream ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualId(String);

impl VirtualId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `s` could have been minted by a registry.
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == VIRTUAL_ID_LEN && s.bytes().all(|b| ALPHABET.contains(&b))
    }
}

impl fmt::Display for VirtualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for VirtualId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for VirtualId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<VirtualId> for String {
    fn from(id: VirtualId) -> Self {
        id.0
    }
}

/// Produces candidate tokens. The registry retries on collision, so a source
/// is free to repeat itself.
pub trait TokenSource: Send + Sync {
    fn next_token(&self) -> String;
}

/// Uniformly random tokens over the 64-symbol alphabet.
#[derive(Debug, Default)]
pub struct RandomTokens;

impl TokenSource for RandomTokens {
    fn next_token(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..VIRTUAL_ID_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}

#[derive(Default)]
struct Mappings {
    to_upstream: HashMap<VirtualId, String>,
    to_virtual: HashMap<String, VirtualId>,
}

impl Mappings {
    fn issue(&mut self, upstream: &str, tokens: &dyn TokenSource) -> VirtualId {
        if let Some(existing) = self.to_virtual.get(upstream) {
            return existing.clone();
        }

        let virtual_id = loop {
            let candidate = VirtualId(tokens.next_token());
            if !self.to_upstream.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(token = %candidate, "virtual ID collision, minting another");
        };

        self.to_upstream
            .insert(virtual_id.clone(), upstream.to_string());
        self.to_virtual
            .insert(upstream.to_string(), virtual_id.clone());
        virtual_id
    }
}

/// Bidirectional VirtualId <-> upstream ID registry.
///
/// Both directions sit behind one lock so a token is never resolvable
/// before its reverse entry exists.
pub struct IdRegistry {
    mappings: RwLock<Mappings>,
    tokens: Box<dyn TokenSource>,
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::with_token_source(RandomTokens)
    }

    pub fn with_token_source(tokens: impl TokenSource + 'static) -> Self {
        IdRegistry {
            mappings: RwLock::new(Mappings::default()),
            tokens: Box::new(tokens),
        }
    }

    /// Return the token for `upstream`, minting one on first sight.
    pub fn issue(&self, upstream: &str) -> VirtualId {
        if let Some(existing) = self.mappings.read().to_virtual.get(upstream) {
            return existing.clone();
        }
        self.mappings.write().issue(upstream, self.tokens.as_ref())
    }

    /// Issue tokens for a batch of upstream IDs under a single lock
    /// acquisition. Output order matches input order.
    pub fn issue_all<S: AsRef<str>>(&self, upstream: &[S]) -> Vec<VirtualId> {
        let mut mappings = self.mappings.write();
        upstream
            .iter()
            .map(|id| mappings.issue(id.as_ref(), self.tokens.as_ref()))
            .collect()
    }

    pub fn resolve(&self, virtual_id: &str) -> MorgenResult<String> {
        self.mappings
            .read()
            .to_upstream
            .get(virtual_id)
            .cloned()
            .ok_or_else(|| MorgenError::UnknownVirtualId(virtual_id.to_string()))
    }

    pub fn resolve_all<S: AsRef<str>>(&self, virtual_ids: &[S]) -> MorgenResult<Vec<String>> {
        let mappings = self.mappings.read();
        virtual_ids
            .iter()
            .map(|vid| {
                let vid = vid.as_ref();
                mappings
                    .to_upstream
                    .get(vid)
                    .cloned()
                    .ok_or_else(|| MorgenError::UnknownVirtualId(vid.to_string()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.mappings.read().to_upstream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
