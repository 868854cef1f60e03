//! Phase sequencer
//!
//! Merges the immutable base phases of a methodology with user-defined custom
//! phases. A new custom phase is slotted in with a fractional key
//! (`slot + 0.5`) that sorts strictly between its neighbours, then every custom
//! phase is renormalized to its 1-based position in the merged sequence. Keys
//! therefore never accumulate fractional drift across insertions.

use crate::position::InsertPosition;
use pm_model::{Methodology, NewPhase, Phase, PhaseId, PhasePatch};
use std::collections::HashSet;

/// Ordered base + custom phase set
///
/// Base phases are never modified. Each custom phase stores its position in
/// the merged sequence as `order`; base phases fill the remaining positions
/// in their declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSequencer {
    methodology: Methodology,
    base: Vec<Phase>,
    custom: Vec<Phase>,
}

impl PhaseSequencer {
    /// Create sequencer over caller-supplied base phases and persisted custom phases
    ///
    /// Base phases are sorted by their declared order. Custom entries that
    /// reuse a base id are dropped; the rest are renormalized.
    #[must_use]
    pub fn new(mut base: Vec<Phase>, custom: Vec<Phase>) -> Self {
        base.sort_by(|a, b| a.order.total_cmp(&b.order));
        for phase in &mut base {
            phase.is_custom = false;
        }
        let methodology = base.first().map(|p| p.methodology).unwrap_or_default();

        let base_ids: HashSet<&PhaseId> = base.iter().map(|p| &p.id).collect();
        let custom: Vec<Phase> = custom
            .into_iter()
            .filter(|p| {
                let clash = base_ids.contains(&p.id);
                if clash {
                    tracing::warn!("Dropping custom phase {} that shadows a base phase", p.id);
                }
                !clash
            })
            .map(|mut p| {
                p.is_custom = true;
                p
            })
            .collect();

        let mut sequencer = Self {
            methodology,
            base,
            custom,
        };
        let merged = sequencer.sequence();
        sequencer.commit(merged);
        sequencer
    }

    /// Sequencer with the default base set of a methodology and no custom phases
    #[must_use]
    pub fn for_methodology(methodology: Methodology) -> Self {
        let mut sequencer = Self::new(methodology.base_phases(), Vec::new());
        sequencer.methodology = methodology;
        sequencer
    }

    /// Methodology of the base set
    #[inline]
    #[must_use]
    pub fn methodology(&self) -> Methodology {
        self.methodology
    }

    /// Base phases in declared order
    #[inline]
    #[must_use]
    pub fn base_phases(&self) -> &[Phase] {
        &self.base
    }

    /// Custom phases with their stored (position) orders, in sequence order
    #[inline]
    #[must_use]
    pub fn custom_phases(&self) -> &[Phase] {
        &self.custom
    }

    /// Total number of phases
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.base.len() + self.custom.len()
    }

    /// Check if there are no phases at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if `id` names a custom phase
    #[must_use]
    pub fn is_custom(&self, id: &PhaseId) -> bool {
        self.custom.iter().any(|p| &p.id == id)
    }

    /// Lookup a phase (base or custom) as stored
    #[must_use]
    pub fn get(&self, id: &PhaseId) -> Option<&Phase> {
        self.custom
            .iter()
            .chain(self.base.iter())
            .find(|p| &p.id == id)
    }

    /// Merged sequence, every phase carrying its effective 1-based order
    #[must_use]
    pub fn sequence(&self) -> Vec<Phase> {
        let mut merged = merge(&self.base, &self.custom);
        renumber(&mut merged);
        merged
    }

    /// 1-based position of a phase in the merged sequence
    #[must_use]
    pub fn position_of(&self, id: &PhaseId) -> Option<usize> {
        self.sequence()
            .iter()
            .position(|p| &p.id == id)
            .map(|i| i + 1)
    }

    /// Build the custom phase `add_custom_phase` would insert, before renormalization
    ///
    /// Its `order` is the provisional fractional key `slot + 0.5`.
    #[must_use]
    pub fn provisional_phase(&self, data: NewPhase, position: &InsertPosition) -> Phase {
        let merged = self.sequence();
        let slot = slot_for(&merged, position);
        Phase::custom(
            PhaseId::custom(),
            data,
            provisional_order(slot),
            self.methodology,
        )
    }

    /// Insert a custom phase at `position` and renormalize all custom orders
    ///
    /// An unknown `After` id falls back to the tail.
    pub fn add_custom_phase(&mut self, data: NewPhase, position: InsertPosition) -> PhaseId {
        let phase = self.provisional_phase(data, &position);
        let id = phase.id.clone();
        tracing::debug!("Slotting phase {} at provisional order {}", id, phase.order);

        let mut merged = self.sequence();
        merged.push(phase);
        self.commit(merged);

        id
    }

    /// Merge attributes into a custom phase
    ///
    /// Base phases and unknown ids are left alone and return `false`.
    pub fn update_phase(&mut self, id: &PhaseId, patch: PhasePatch) -> bool {
        match self.custom.iter_mut().find(|p| &p.id == id) {
            Some(phase) => {
                patch.apply_to(phase);
                true
            }
            None => {
                tracing::debug!("Update ignored for non-custom phase {}", id);
                false
            }
        }
    }

    /// Remove a custom phase, closing the gap it leaves
    ///
    /// Returns the removed phase; base phases and unknown ids yield `None`.
    pub fn delete_phase(&mut self, id: &PhaseId) -> Option<Phase> {
        if !self.is_custom(id) {
            tracing::debug!("Delete ignored for non-custom phase {}", id);
            return None;
        }

        let removed = self.custom.iter().find(|p| &p.id == id).cloned();
        let merged: Vec<Phase> = self
            .sequence()
            .into_iter()
            .filter(|p| &p.id != id)
            .collect();
        self.commit(merged);

        removed
    }

    /// Re-slot an existing custom phase at `position`, keeping its id
    ///
    /// Returns `false` for base phases, unknown ids, or a request to place a
    /// phase after itself.
    pub fn move_custom_phase(&mut self, id: &PhaseId, position: InsertPosition) -> bool {
        if !self.is_custom(id) {
            tracing::debug!("Move ignored for non-custom phase {}", id);
            return false;
        }
        if matches!(&position, InsertPosition::After(after) if after == id) {
            return false;
        }

        let (mut moving, mut rest): (Vec<Phase>, Vec<Phase>) =
            self.sequence().into_iter().partition(|p| &p.id == id);
        let Some(mut phase) = moving.pop() else {
            return false;
        };

        renumber(&mut rest);
        phase.order = provisional_order(slot_for(&rest, &position));
        rest.push(phase);
        self.commit(rest);

        true
    }

    /// Sort by order and store every custom phase at its 1-based position
    fn commit(&mut self, mut merged: Vec<Phase>) {
        merged.sort_by(|a, b| a.order.total_cmp(&b.order));
        self.custom = merged
            .into_iter()
            .enumerate()
            .filter(|(_, p)| p.is_custom)
            .map(|(i, mut p)| {
                p.order = position_order(i);
                p
            })
            .collect();
    }
}

/// Interleave base phases around custom phases
///
/// Custom phases are taken in order of their keys; before each one, base
/// phases are emitted until the output reaches the position the key names.
/// Fractional keys land after the base phase they follow.
fn merge(base: &[Phase], custom: &[Phase]) -> Vec<Phase> {
    let mut custom = custom.to_vec();
    custom.sort_by(|a, b| a.order.total_cmp(&b.order));

    let mut out = Vec::with_capacity(base.len() + custom.len());
    let mut base_iter = base.iter();

    for phase in custom {
        while position_order(out.len()) < phase.order {
            match base_iter.next() {
                Some(b) => out.push(b.clone()),
                None => break,
            }
        }
        out.push(phase);
    }
    out.extend(base_iter.cloned());

    out
}

/// Index in `merged` a new phase goes to
fn slot_for(merged: &[Phase], position: &InsertPosition) -> usize {
    match position {
        InsertPosition::End => merged.len(),
        InsertPosition::After(after) => match merged.iter().position(|p| &p.id == after) {
            Some(i) => i + 1,
            None => {
                tracing::warn!("Phase {} not found, appending at the end", after);
                merged.len()
            }
        },
    }
}

fn renumber(phases: &mut [Phase]) {
    for (i, phase) in phases.iter_mut().enumerate() {
        phase.order = position_order(i);
    }
}

/// 1-based order of the phase at `index`
#[allow(clippy::cast_precision_loss)]
fn position_order(index: usize) -> f64 {
    (index + 1) as f64
}

/// Key strictly between the phases at `slot - 1` and `slot`
#[allow(clippy::cast_precision_loss)]
fn provisional_order(slot: usize) -> f64 {
    slot as f64 + 0.5
}
