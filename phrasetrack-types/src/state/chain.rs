//! Chain tables: ordered phrase slots.

use serde::{Deserialize, Serialize};

use crate::{ChainId, PhraseId, CHAIN_SLOTS, NUM_CHAINS};

/// Sixteen ordered phrase slots. Empty slots are skipped during playback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub slots: [Option<PhraseId>; CHAIN_SLOTS],
}

impl Chain {
    pub fn slot(&self, index: usize) -> Option<PhraseId> {
        self.slots.get(index).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Non-empty slots at or after `from`, in order.
    pub fn filled_slots_from(&self, from: usize) -> impl Iterator<Item = (usize, PhraseId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .skip(from)
            .filter_map(|(i, slot)| slot.map(|p| (i, p)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTable {
    chains: Vec<Chain>,
}

impl Default for ChainTable {
    fn default() -> Self {
        Self {
            chains: vec![Chain::default(); NUM_CHAINS],
        }
    }
}

impl ChainTable {
    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id.index())
    }

    pub fn chain_mut(&mut self, id: ChainId) -> Option<&mut Chain> {
        self.chains.get_mut(id.index())
    }

    pub fn set_slot(&mut self, id: ChainId, slot: usize, phrase: Option<PhraseId>) {
        if let Some(s) = self.chain_mut(id).and_then(|c| c.slots.get_mut(slot)) {
            *s = phrase;
        }
    }

    pub fn normalize(&mut self) {
        self.chains.resize(NUM_CHAINS, Chain::default());
    }
}
