//! BoQ ledger: contract value arithmetic.

use crate::model::BoqItem;

/// Total contract value: the sum of `quantity * unit_price` over all items.
///
/// Malformed or negative quantities and prices count as zero, so this never
/// fails. An empty BoQ is worth `0`.
#[must_use]
pub fn total_value(boq: &[BoqItem]) -> f64 {
    boq.iter().map(BoqItem::line_value).sum()
}

/// Share of the contract value carried by one item, in percent.
///
/// Returns `0` when the contract is worth nothing.
#[must_use]
pub fn weight_percent(item: &BoqItem, contract_value: f64) -> f64 {
    if contract_value <= 0.0 {
        return 0.0;
    }
    item.line_value() / contract_value * 100.0
}
