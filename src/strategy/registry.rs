use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{info, warn};

/// Broker-visible integer tag attached to orders so broker-side positions remain attributable to
/// the strategy that opened them, even when free-form order comments are truncated. Kept in the
/// non-negative signed 32-bit range common brokers accept.
pub type MagicNumber = i32;

const MAGIC_MODULUS: i64 = 1 << 31;

/// Bidirectional mapping `strategy name <-> magic number`, process-local and populated
/// deterministically: the same name resolves to the same magic number within a process, and a
/// magic number resolves back to exactly one name.
#[derive(Clone, Debug, Default)]
pub struct StrategyRegistry {
    by_name: HashMap<String, MagicNumber>,
    by_magic: HashMap<MagicNumber, String>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` and returns its magic number, reusing the existing assignment when the
    /// name is already registered. Candidate collisions resolve by a first-free linear probe,
    /// deterministic given registration order.
    pub fn register(&mut self, name: &str) -> MagicNumber {
        if let Some(&magic) = self.by_name.get(name) {
            return magic;
        }

        let mut magic = derive_candidate(name);
        if let Some(occupant) = self.by_magic.get(&magic) {
            warn!(
                strategy = name,
                candidate = magic,
                occupied_by = %occupant,
                "magic number collision, probing for a free slot"
            );
            while self.by_magic.contains_key(&magic) {
                magic = ((i64::from(magic) + 1) % MAGIC_MODULUS) as MagicNumber;
            }
        }

        self.by_name.insert(name.to_owned(), magic);
        self.by_magic.insert(magic, name.to_owned());
        info!(strategy = name, magic, "strategy registered");
        magic
    }

    /// Magic number of a registered strategy.
    pub fn magic_of(&self, name: &str) -> Option<MagicNumber> {
        self.by_name.get(name).copied()
    }

    /// Reverse lookup for audit: the strategy name a magic number was assigned to.
    pub fn name_of(&self, magic: MagicNumber) -> Option<&str> {
        self.by_magic.get(&magic).map(String::as_str)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}

/// Candidate magic derived from a deterministic 128-bit digest of the name's UTF-8 bytes,
/// reduced modulo 2^31.
fn derive_candidate(name: &str) -> MagicNumber {
    let digest = Sha256::digest(name.as_bytes());
    let mut wide = [0u8; 16];
    wide.copy_from_slice(&digest[..16]);
    (u128::from_be_bytes(wide) % (MAGIC_MODULUS as u128)) as MagicNumber
}
