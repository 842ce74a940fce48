use super::sanitize::{lenient_date, lenient_number, lenient_text, non_negative};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Invoice identifier within a trip. Assigned once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub u64);

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invoice as it arrives from manual entry or a batch import, before it
/// has an id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInvoiceEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub declared_weight_kg: f64,
    /// Goods value printed on the fiscal document.
    #[serde(default, deserialize_with = "lenient_number")]
    pub invoice_value: f64,
}

impl RawInvoiceEntry {
    pub fn with_weight(declared_weight_kg: f64) -> Self {
        Self {
            declared_weight_kg,
            ..Default::default()
        }
    }
}

/// Amounts the engine apportions to one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCharges {
    /// Fraction of the trip's real weight carried by this invoice.
    pub weight_share: f64,
    pub weight_based_freight: f64,
    pub express_value: f64,
    /// Freight to allocate: weight freight plus express.
    pub apportioned_freight: f64,
    pub toll_share: f64,
    pub palletizing_share: f64,
    pub transfer_freight_share: f64,
    pub collection_share: f64,
    pub icms_share: f64,
    /// Excludes transfer freight and collection.
    pub total_charge: f64,
}

/// One invoice riding on the trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub declared_weight_kg: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub invoice_value: f64,
    /// Written by the allocation engine only; ignored on input.
    #[serde(skip_deserializing)]
    charges: InvoiceCharges,
}

impl InvoiceRecord {
    /// Gives `entry` its id. Computed fields start at zero.
    pub fn from_entry(id: InvoiceId, entry: RawInvoiceEntry) -> Self {
        Self {
            id,
            invoice_number: entry.invoice_number,
            client: entry.client,
            issue_date: entry.issue_date,
            declared_weight_kg: entry.declared_weight_kg,
            invoice_value: entry.invoice_value,
            charges: InvoiceCharges::default(),
        }
        .sanitized()
    }

    pub fn new(id: InvoiceId, declared_weight_kg: f64) -> Self {
        Self::from_entry(id, RawInvoiceEntry::with_weight(declared_weight_kg))
    }

    pub fn charges(&self) -> &InvoiceCharges {
        &self.charges
    }

    pub(crate) fn sanitized(mut self) -> Self {
        self.declared_weight_kg = non_negative(self.declared_weight_kg);
        self.invoice_value = non_negative(self.invoice_value);
        self
    }

    /// Replaces every computed field at once.
    pub(crate) fn with_charges(mut self, charges: InvoiceCharges) -> Self {
        self.charges = charges;
        self
    }
}
