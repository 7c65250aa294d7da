use serde::{Deserialize, Serialize};

use super::numeric::{lenient_f64, non_negative};

/// One contracted line of work in a project's Bill of Quantities.
///
/// `quantity` is the ceiling no cumulative completion may exceed. Both
/// `quantity` and `unit_price` deserialize leniently (see
/// [`lenient_f64`](super::numeric::lenient_f64)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoqItem {
    pub id: String,
    /// Display label such as `"3.2(1)"`; not unique.
    #[serde(default)]
    pub item_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_price: f64,
}

impl BoqItem {
    /// Build an item with the given identity and amounts.
    #[must_use]
    pub fn new(id: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            id: id.into(),
            item_number: String::new(),
            description: String::new(),
            unit: String::new(),
            quantity,
            unit_price,
        }
    }

    /// Contracted quantity, with malformed values treated as zero.
    #[must_use]
    pub fn contract_quantity(&self) -> f64 {
        non_negative(self.quantity)
    }

    /// Unit rate, with malformed values treated as zero.
    #[must_use]
    pub fn rate(&self) -> f64 {
        non_negative(self.unit_price)
    }

    /// `quantity * unit_price`.
    #[must_use]
    pub fn line_value(&self) -> f64 {
        self.contract_quantity() * self.rate()
    }
}
