use super::header::HeaderParameters;
use super::invoice::{InvoiceId, InvoiceRecord};
use serde::{Deserialize, Serialize};

/// Aggregate cost figures for one truck trip, before apportionment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripTotals {
    pub total_real_weight_kg: f64,
    /// Real weight lifted to the contractual minimum when it falls short.
    pub considered_weight_kg: f64,
    pub weight_based_freight_total: f64,
    pub toll_total: f64,
    pub express_total: f64,
    /// Tax-exclusive base the ICMS gross-up is applied to.
    pub icms_base: f64,
    pub icms_total: f64,
    pub grand_total: f64,
}

/// Column sums over the enriched invoice list (table footer / print summary).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSummary {
    pub invoice_count: usize,
    pub declared_weight_kg: f64,
    pub invoice_value: f64,
    pub weight_based_freight: f64,
    pub express_value: f64,
    pub apportioned_freight: f64,
    pub toll: f64,
    pub palletizing: f64,
    pub transfer_freight: f64,
    pub collection: f64,
    pub icms: f64,
    pub total_charge: f64,
}

impl AllocationSummary {
    pub fn from_invoices(invoices: &[InvoiceRecord]) -> Self {
        invoices.iter().fold(
            Self {
                invoice_count: invoices.len(),
                ..Self::default()
            },
            |mut acc, invoice| {
                let c = invoice.charges();
                acc.declared_weight_kg += invoice.declared_weight_kg;
                acc.invoice_value += invoice.invoice_value;
                acc.weight_based_freight += c.weight_based_freight;
                acc.express_value += c.express_value;
                acc.apportioned_freight += c.apportioned_freight;
                acc.toll += c.toll_share;
                acc.palletizing += c.palletizing_share;
                acc.transfer_freight += c.transfer_freight_share;
                acc.collection += c.collection_share;
                acc.icms += c.icms_share;
                acc.total_charge += c.total_charge;
                acc
            },
        )
    }

    pub fn is_finite(&self) -> bool {
        [
            self.declared_weight_kg,
            self.invoice_value,
            self.weight_based_freight,
            self.express_value,
            self.apportioned_freight,
            self.toll,
            self.palletizing,
            self.transfer_freight,
            self.collection,
            self.icms,
            self.total_charge,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// Signed differences between apportioned sums and their trip totals.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConservationGaps {
    pub weight_based_freight: f64,
    pub express: f64,
    pub toll: f64,
    pub icms: f64,
}

impl ConservationGaps {
    pub fn max_abs(&self) -> f64 {
        [self.weight_based_freight, self.express, self.toll, self.icms]
            .into_iter()
            .fold(0.0_f64, |acc, gap| acc.max(gap.abs()))
    }
}

/// Immutable output of one allocation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSnapshot {
    /// The header as the engine saw it, after sanitizing.
    pub header: HeaderParameters,
    pub totals: TripTotals,
    pub invoices: Vec<InvoiceRecord>,
    pub summary: AllocationSummary,
}

impl AllocationSnapshot {
    pub fn invoice(&self, id: InvoiceId) -> Option<&InvoiceRecord> {
        self.invoices.iter().find(|invoice| invoice.id == id)
    }

    /// How far the apportioned sums drift from the trip totals.
    ///
    /// Near zero whenever the trip has any real weight. When it has none the
    /// gaps equal the totals themselves, since nothing is apportioned.
    pub fn conservation_gaps(&self) -> ConservationGaps {
        ConservationGaps {
            weight_based_freight: self.summary.weight_based_freight
                - self.totals.weight_based_freight_total,
            express: self.summary.express_value - self.totals.express_total,
            toll: self.summary.toll - self.totals.toll_total,
            icms: self.summary.icms - self.totals.icms_total,
        }
    }
}
