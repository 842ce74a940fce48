//! Freight allocation ("rateio") engine.
//!
//! Pure functions: trip totals are derived from the header and the real
//! weight on the truck, then apportioned back to each invoice by its share of
//! that real weight. No I/O, no shared state; equal inputs give bit-identical
//! output.

use crate::error::AllocationError;
use crate::models::sanitize::non_negative;
use crate::models::{
    AllocationSnapshot, AllocationSummary, HeaderParameters, InvoiceCharges, InvoiceRecord,
    TripTotals,
};

/// Trip totals for a given real weight (the totals panel of the billing
/// screen, refreshed without re-apportioning).
pub fn compute_trip_totals(
    header: &HeaderParameters,
    total_real_weight_kg: f64,
) -> Result<TripTotals, AllocationError> {
    let header = header.sanitized();
    header.validate()?;

    // Sanitizing would turn an overflowed sum into an empty trip.
    if total_real_weight_kg == f64::INFINITY {
        return Err(AllocationError::Overflow {
            quantity: "totalRealWeightKg",
        });
    }
    let total_real_weight_kg = non_negative(total_real_weight_kg);
    // Trips under the contracted minimum are billed as if they weighed it.
    let considered_weight_kg = total_real_weight_kg.max(header.minimum_weight_kg);

    let weight_based_freight_total = bounded(
        "weightBasedFreightTotal",
        (header.freight_rate_per_ton / 1000.0) * considered_weight_kg,
    )?;
    let toll_total = header.toll_value;
    let express_total = bounded(
        "expressTotal",
        weight_based_freight_total * (header.express_rate_percent / 100.0),
    )?;

    // Gross-up: the quoted rate is tax-inclusive, so the tax is solved such
    // that icms / (base + icms) == rate / 100.
    let icms_base = bounded("icmsBase", weight_based_freight_total + toll_total + express_total)?;
    let icms_total = if header.icms_rate_percent > 0.0 {
        bounded(
            "icmsTotal",
            icms_base / (100.0 - header.icms_rate_percent) * header.icms_rate_percent,
        )?
    } else {
        0.0
    };

    let grand_total = bounded(
        "grandTotal",
        weight_based_freight_total + toll_total + express_total + icms_total,
    )?;

    Ok(TripTotals {
        total_real_weight_kg,
        considered_weight_kg,
        weight_based_freight_total,
        toll_total,
        express_total,
        icms_base,
        icms_total,
        grand_total,
    })
}

/// Computes trip totals and rewrites the computed fields of every invoice.
///
/// Invoice order is preserved. An empty invoice set is valid and still
/// yields totals driven by the minimum weight.
pub fn allocate<'a, I>(header: &HeaderParameters, invoices: I) -> Result<AllocationSnapshot, AllocationError>
where
    I: IntoIterator<Item = &'a InvoiceRecord>,
{
    let header = header.sanitized();
    header.validate()?;

    let invoices: Vec<InvoiceRecord> = invoices
        .into_iter()
        .map(|invoice| invoice.clone().sanitized())
        .collect();

    let total_real_weight_kg = invoices
        .iter()
        .fold(0.0, |sum, invoice| sum + invoice.declared_weight_kg);

    let totals = compute_trip_totals(&header, total_real_weight_kg)?;

    let invoices: Vec<InvoiceRecord> = invoices
        .into_iter()
        .map(|invoice| {
            let share = weight_share(invoice.declared_weight_kg, totals.total_real_weight_kg);
            let charges = apportion(&header, &totals, share);
            invoice.with_charges(charges)
        })
        .collect();

    let summary = AllocationSummary::from_invoices(&invoices);
    if !summary.is_finite() {
        return Err(AllocationError::Overflow { quantity: "summary" });
    }

    Ok(AllocationSnapshot {
        header,
        totals,
        invoices,
        summary,
    })
}

fn bounded(quantity: &'static str, value: f64) -> Result<f64, AllocationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AllocationError::Overflow { quantity })
    }
}

/// Share of the real (not floor-adjusted) weight. With no real weight on the
/// trip every share is 0 and nothing is apportioned.
fn weight_share(declared_weight_kg: f64, total_real_weight_kg: f64) -> f64 {
    if total_real_weight_kg > 0.0 {
        declared_weight_kg / total_real_weight_kg
    } else {
        0.0
    }
}

fn apportion(header: &HeaderParameters, totals: &TripTotals, share: f64) -> InvoiceCharges {
    let weight_based_freight = totals.weight_based_freight_total * share;
    let express_value = totals.express_total * share;
    let toll_share = totals.toll_total * share;
    let palletizing_share = header.palletizing_value * share;
    let transfer_freight_share = header.transfer_freight_value * share;
    let collection_share = header.collection_value * share;
    let icms_share = totals.icms_total * share;

    // Transfer freight and collection are tracked but stay out of the total.
    let total_charge =
        weight_based_freight + express_value + palletizing_share + toll_share + icms_share;

    InvoiceCharges {
        weight_share: share,
        weight_based_freight,
        express_value,
        apportioned_freight: weight_based_freight + express_value,
        toll_share,
        palletizing_share,
        transfer_freight_share,
        collection_share,
        icms_share,
        total_charge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InvoiceId;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() <= EPS * expected.abs().max(1.0)
    }

    fn invoices(weights: &[f64]) -> Vec<InvoiceRecord> {
        weights
            .iter()
            .enumerate()
            .map(|(idx, &kg)| InvoiceRecord::new(InvoiceId(idx as u64 + 1), kg))
            .collect()
    }

    fn header(rate: f64, minimum: f64) -> HeaderParameters {
        HeaderParameters {
            freight_rate_per_ton: rate,
            minimum_weight_kg: minimum,
            ..Default::default()
        }
    }

    #[rstest]
    #[case::real_weight(0.0, 100.0, [30.0, 70.0])]
    #[case::minimum_floor(2000.0, 200.0, [60.0, 140.0])]
    fn freight_follows_real_weight_shares(
        #[case] minimum: f64,
        #[case] expected_total: f64,
        #[case] expected_split: [f64; 2],
    ) {
        let snapshot = allocate(&header(100.0, minimum), &invoices(&[300.0, 700.0])).unwrap();

        assert!(close(snapshot.totals.weight_based_freight_total, expected_total));
        assert!(close(snapshot.totals.total_real_weight_kg, 1000.0));
        for (invoice, expected) in snapshot.invoices.iter().zip(expected_split) {
            assert!(close(invoice.charges().weight_based_freight, expected));
        }
    }

    #[test]
    fn minimum_floor_inflates_considered_weight_only() {
        let totals = compute_trip_totals(&header(100.0, 2000.0), 1000.0).unwrap();
        assert_eq!(totals.considered_weight_kg, 2000.0);
        assert_eq!(totals.total_real_weight_kg, 1000.0);
    }

    #[test]
    fn icms_is_grossed_up() {
        // 100 of freight at 18% ICMS.
        let header = HeaderParameters {
            icms_rate_percent: 18.0,
            ..header(100.0, 0.0)
        };
        let totals = compute_trip_totals(&header, 1000.0).unwrap();

        assert!(close(totals.icms_base, 100.0));
        assert!((totals.icms_total - 21.95).abs() < 0.005);
        assert!((totals.grand_total - 121.95).abs() < 0.005);
        let fraction = totals.icms_total / (totals.icms_base + totals.icms_total);
        assert!((fraction - 0.18).abs() < 1e-12);
    }

    #[test]
    fn icms_base_includes_toll_and_express() {
        let header = HeaderParameters {
            freight_rate_per_ton: 100.0,
            express_rate_percent: 10.0,
            toll_value: 50.0,
            icms_rate_percent: 12.0,
            ..Default::default()
        };
        let totals = compute_trip_totals(&header, 1000.0).unwrap();

        assert!(close(totals.express_total, 10.0));
        assert!(close(totals.toll_total, 50.0));
        assert!(close(totals.icms_base, 160.0));
        assert!(close(totals.icms_total, 160.0 / 88.0 * 12.0));
        assert!(close(
            totals.grand_total,
            totals.weight_based_freight_total
                + totals.toll_total
                + totals.express_total
                + totals.icms_total
        ));
    }

    #[test]
    fn full_rate_icms_is_fatal() {
        let header = HeaderParameters {
            icms_rate_percent: 100.0,
            ..header(100.0, 0.0)
        };
        assert!(matches!(
            allocate(&header, &invoices(&[10.0])),
            Err(AllocationError::UndefinedGrossUp { .. })
        ));
    }

    #[rstest]
    #[case::freight(header(1e308, 0.0), &[1e4], "weightBasedFreightTotal")]
    #[case::real_weight(header(1.0, 5.0), &[1e308, 1e308], "totalRealWeightKg")]
    #[case::gross_up(
        HeaderParameters { toll_value: 1.7e308, icms_rate_percent: 99.0, ..header(1.0, 0.0) },
        &[10.0],
        "icmsTotal"
    )]
    fn overflowing_amounts_are_rejected(
        #[case] params: HeaderParameters,
        #[case] weights: &[f64],
        #[case] expected: &str,
    ) {
        match allocate(&params, &invoices(weights)) {
            Err(AllocationError::Overflow { quantity }) => assert_eq!(quantity, expected),
            other => panic!("expected overflow of {expected}, got {other:?}"),
        }
    }

    #[test]
    fn overflowing_column_sums_are_rejected() {
        let mut batch = invoices(&[10.0, 10.0]);
        for invoice in &mut batch {
            invoice.invoice_value = 1.5e308;
        }
        assert_eq!(
            allocate(&header(100.0, 0.0), &batch),
            Err(AllocationError::Overflow { quantity: "summary" })
        );
    }

    #[test]
    fn infinite_real_weight_is_not_an_empty_trip() {
        assert_eq!(
            compute_trip_totals(&header(1.0, 5.0), f64::INFINITY),
            Err(AllocationError::Overflow {
                quantity: "totalRealWeightKg"
            })
        );
        let totals = compute_trip_totals(&header(1.0, 5.0), f64::NAN).unwrap();
        assert_eq!(totals.considered_weight_kg, 5.0);
    }

    #[test]
    fn empty_trip_is_billed_on_the_floor() {
        let none: Vec<InvoiceRecord> = Vec::new();
        let snapshot = allocate(&header(50.0, 500.0), &none).unwrap();

        assert!(close(snapshot.totals.weight_based_freight_total, 25.0));
        assert_eq!(snapshot.totals.total_real_weight_kg, 0.0);
        assert!(snapshot.invoices.is_empty());
        assert_eq!(snapshot.summary.invoice_count, 0);
    }

    #[test]
    fn weightless_invoices_receive_nothing() {
        let header = HeaderParameters {
            icms_rate_percent: 12.0,
            toll_value: 30.0,
            palletizing_value: 15.0,
            ..header(80.0, 1000.0)
        };
        let snapshot = allocate(&header, &invoices(&[0.0, 0.0, f64::NAN])).unwrap();

        assert!(close(snapshot.totals.weight_based_freight_total, 80.0));
        assert!(snapshot.totals.grand_total > 0.0);
        for invoice in &snapshot.invoices {
            assert_eq!(invoice.charges(), &InvoiceCharges::default());
        }
    }

    #[test]
    fn total_charge_excludes_transfer_and_collection() {
        let header = HeaderParameters {
            express_rate_percent: 20.0,
            icms_rate_percent: 12.0,
            transfer_freight_value: 300.0,
            collection_value: 200.0,
            palletizing_value: 40.0,
            toll_value: 60.0,
            ..header(100.0, 0.0)
        };
        let snapshot = allocate(&header, &invoices(&[250.0, 750.0])).unwrap();
        let first = snapshot.invoices[0].charges();

        assert!(close(first.weight_share, 0.25));
        assert!(close(first.transfer_freight_share, 75.0));
        assert!(close(first.collection_share, 50.0));
        assert!(close(first.palletizing_share, 10.0));
        assert!(close(
            first.apportioned_freight,
            first.weight_based_freight + first.express_value
        ));
        assert!(close(
            first.total_charge,
            first.weight_based_freight
                + first.express_value
                + first.palletizing_share
                + first.toll_share
                + first.icms_share
        ));
        assert!(close(
            snapshot.summary.total_charge,
            snapshot.totals.grand_total + header.palletizing_value
        ));
    }

    #[test]
    fn garbage_numbers_are_sanitized_before_use() {
        let header = HeaderParameters {
            freight_rate_per_ton: 100.0,
            toll_value: f64::NAN,
            express_rate_percent: f64::INFINITY,
            ..Default::default()
        };
        let mut batch = invoices(&[500.0, 500.0]);
        batch[1].declared_weight_kg = -40.0;

        let snapshot = allocate(&header, &batch).unwrap();

        assert_eq!(snapshot.header.toll_value, 0.0);
        assert_eq!(snapshot.header.express_rate_percent, 0.0);
        assert_eq!(snapshot.invoices[1].declared_weight_kg, 0.0);
        assert!(close(snapshot.invoices[0].charges().weight_share, 1.0));
        assert!(snapshot.totals.grand_total.is_finite());
    }

    #[test]
    fn apportioned_sums_match_trip_totals() {
        let header = HeaderParameters {
            freight_rate_per_ton: 137.3,
            express_rate_percent: 7.5,
            icms_rate_percent: 17.0,
            toll_value: 88.4,
            ..Default::default()
        };
        let snapshot = allocate(&header, &invoices(&[123.4, 56.7, 890.1, 3.3])).unwrap();
        assert!(snapshot.conservation_gaps().max_abs() < 1e-9);
    }
}
