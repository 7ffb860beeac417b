//! Name-keyed join of merchants and listing cards.
//!
//! The merchant list is authoritative: output follows merchant order and a
//! merchant whose name matches no card (typically one paged out of the
//! visible carousel) is dropped. Cards with no merchant never reach the
//! output. Matching is exact, case-sensitive string equality; when several
//! cards share a name the first in document order wins.

use std::collections::HashMap;

use serde::Serialize;

use crate::events::EventSink;
use crate::types::{DisplayRecord, MerchantRecord, UnifiedRecord};

const COMPONENT: &str = "Reconciler";

/// Counts describing one join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub merchants: usize,
    pub cards: usize,
    pub matched: usize,
    /// Merchants with no card of the same name.
    pub dropped: usize,
}

/// Join `merchants` with `cards` on display name.
pub fn reconcile(
    merchants: &[MerchantRecord],
    cards: &[DisplayRecord],
    sink: &dyn EventSink,
) -> (Vec<UnifiedRecord>, ReconcileStats) {
    let mut by_name: HashMap<&str, &DisplayRecord> = HashMap::with_capacity(cards.len());
    for card in cards {
        if let Some(name) = card.name.as_deref() {
            by_name.entry(name).or_insert(card);
        }
    }

    let unified: Vec<UnifiedRecord> = merchants
        .iter()
        .filter_map(|merchant| {
            let card = by_name.get(merchant.name.as_deref()?)?;
            Some(UnifiedRecord::merge(merchant, card))
        })
        .collect();

    let stats = ReconcileStats {
        merchants: merchants.len(),
        cards: cards.len(),
        matched: unified.len(),
        dropped: merchants.len() - unified.len(),
    };

    sink.info(
        COMPONENT,
        "reconcile",
        serde_json::to_value(stats).unwrap_or(serde_json::Value::Null),
        "Merchant and restaurant data joined",
    );
    (unified, stats)
}
