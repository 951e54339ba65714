//! Upgrade Offers
//!
//! At each level-up the player is offered a bounded, randomly ordered subset
//! of: level-ups for acquired magics below their cap, and new magics not yet
//! acquired. Filtering happens here, at generation time; applying a selected
//! offer trusts the list.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::magic::{MagicId, Spellbook};
use super::magic_config::MagicCatalog;

/// Default number of offers shown per level-up.
pub const DEFAULT_OFFER_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeKind {
    NewAbility,
    LevelUp,
}

/// One choice presented at a level-up. Discarded after a selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeOption {
    pub kind: UpgradeKind,
    pub magic: MagicId,
    pub description: String,
}

/// What applying an offer changed.
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeApplied {
    Acquired(MagicId),
    LeveledUp { magic: MagicId, level: u32 },
    /// The offer no longer matched the spellbook (missing definition, already
    /// acquired or already capped).
    Stale,
}

/// Every currently valid offer, unshuffled: level-ups in spellbook order, then
/// new magics in catalog order.
pub fn candidate_offers(catalog: &MagicCatalog, spellbook: &Spellbook) -> Vec<UpgradeOption> {
    let mut options = Vec::new();

    for magic in spellbook.iter().filter(|m| !m.is_max_level()) {
        let Some(def) = catalog.get(&magic.id) else {
            continue;
        };
        options.push(UpgradeOption {
            kind: UpgradeKind::LevelUp,
            magic: magic.id.clone(),
            description: format!(
                "{} (Lv {}) - {}",
                def.name,
                magic.level(),
                def.next_level_description(magic.level())
            ),
        });
    }

    for def in catalog.iter().filter(|d| !spellbook.contains(&d.id)) {
        options.push(UpgradeOption {
            kind: UpgradeKind::NewAbility,
            magic: def.id.clone(),
            description: format!("New magic: {} - {}", def.name, def.description),
        });
    }

    options
}

/// Shuffle the valid offers uniformly and keep the first `count`.
pub fn generate_offers<R: Rng + ?Sized>(
    catalog: &MagicCatalog,
    spellbook: &Spellbook,
    count: usize,
    rng: &mut R,
) -> Vec<UpgradeOption> {
    let mut options = candidate_offers(catalog, spellbook);
    options.shuffle(rng);
    options.truncate(count);
    options
}

pub fn apply_offer(
    option: &UpgradeOption,
    catalog: &MagicCatalog,
    spellbook: &mut Spellbook,
) -> UpgradeApplied {
    match option.kind {
        UpgradeKind::NewAbility => {
            let Some(def) = catalog.get(&option.magic) else {
                return UpgradeApplied::Stale;
            };
            if spellbook.acquire(def) {
                UpgradeApplied::Acquired(option.magic.clone())
            } else {
                UpgradeApplied::Stale
            }
        }
        UpgradeKind::LevelUp => match spellbook.level_up(&option.magic) {
            Some(level) => UpgradeApplied::LeveledUp {
                magic: option.magic.clone(),
                level,
            },
            None => UpgradeApplied::Stale,
        },
    }
}
