use super::sanitize::{lenient_number, non_negative, percent};
use crate::error::AllocationError;
use serde::{Deserialize, Serialize};

/// Trip-level billing parameters (the header of the billing screen).
///
/// Every field decodes leniently and defaults to 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderParameters {
    /// Freight rate per metric ton.
    #[serde(default, deserialize_with = "lenient_number")]
    pub freight_rate_per_ton: f64,
    /// Contractual minimum billable weight for the trip, in kg.
    #[serde(default, deserialize_with = "lenient_number")]
    pub minimum_weight_kg: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub icms_rate_percent: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub express_rate_percent: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub transfer_freight_value: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub collection_value: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub palletizing_value: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub toll_value: f64,
}

/// Returned by [`HeaderParameters::replace`]: the stored header changed and
/// the allocation built on the old one is stale.
#[must_use = "a replaced header leaves the allocation stale until it is recomputed"]
#[derive(Debug)]
pub struct RecomputeOwed(());

impl HeaderParameters {
    /// Re-sanitizes all eight fields. Amounts and weights are floored at 0,
    /// percentages clamped into [0, 100].
    pub fn sanitized(&self) -> Self {
        Self {
            freight_rate_per_ton: non_negative(self.freight_rate_per_ton),
            minimum_weight_kg: non_negative(self.minimum_weight_kg),
            icms_rate_percent: percent(self.icms_rate_percent),
            express_rate_percent: percent(self.express_rate_percent),
            transfer_freight_value: non_negative(self.transfer_freight_value),
            collection_value: non_negative(self.collection_value),
            palletizing_value: non_negative(self.palletizing_value),
            toll_value: non_negative(self.toll_value),
        }
    }

    /// Rejects the one input the engine cannot handle: an ICMS rate that
    /// (after sanitizing) sits at 100%.
    pub fn validate(&self) -> Result<(), AllocationError> {
        let icms_rate_percent = percent(self.icms_rate_percent);
        if icms_rate_percent >= 100.0 {
            return Err(AllocationError::UndefinedGrossUp { icms_rate_percent });
        }
        Ok(())
    }

    /// Replaces the whole header with a sanitized copy of `next`.
    ///
    /// Nothing of the previous state is merged in. On a validation error
    /// `self` is left untouched.
    pub fn replace(&mut self, next: HeaderParameters) -> Result<RecomputeOwed, AllocationError> {
        let next = next.sanitized();
        next.validate()?;
        *self = next;
        Ok(RecomputeOwed(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_partial_and_garbage_fields_as_zero() {
        let header: HeaderParameters = serde_json::from_str(
            r#"{"freightRatePerTon": "120.5", "minimumWeightKg": null, "tollValue": "n/a"}"#,
        )
        .unwrap();
        assert_eq!(header.freight_rate_per_ton, 120.5);
        assert_eq!(header.minimum_weight_kg, 0.0);
        assert_eq!(header.toll_value, 0.0);
        assert_eq!(header.icms_rate_percent, 0.0);
    }

    #[test]
    fn sanitized_clamps_every_field() {
        let header = HeaderParameters {
            freight_rate_per_ton: f64::NAN,
            minimum_weight_kg: -10.0,
            icms_rate_percent: 250.0,
            express_rate_percent: -5.0,
            transfer_freight_value: f64::INFINITY,
            collection_value: 30.0,
            palletizing_value: -0.0,
            toll_value: 12.0,
        }
        .sanitized();

        assert_eq!(header.freight_rate_per_ton, 0.0);
        assert_eq!(header.minimum_weight_kg, 0.0);
        assert_eq!(header.icms_rate_percent, 100.0);
        assert_eq!(header.express_rate_percent, 0.0);
        assert_eq!(header.transfer_freight_value, 0.0);
        assert_eq!(header.collection_value, 30.0);
        assert_eq!(header.palletizing_value, 0.0);
        assert_eq!(header.toll_value, 12.0);
    }

    #[test]
    fn full_rate_icms_is_rejected() {
        let header = HeaderParameters {
            icms_rate_percent: 100.0,
            ..Default::default()
        };
        assert_eq!(
            header.validate(),
            Err(AllocationError::UndefinedGrossUp {
                icms_rate_percent: 100.0
            })
        );

        let above = HeaderParameters {
            icms_rate_percent: 180.0,
            ..Default::default()
        };
        assert!(above.validate().is_err());

        let below = HeaderParameters {
            icms_rate_percent: 99.99,
            ..Default::default()
        };
        assert!(below.validate().is_ok());
    }

    #[test]
    fn replace_is_wholesale_and_keeps_old_header_on_error() {
        let mut current = HeaderParameters {
            freight_rate_per_ton: 100.0,
            toll_value: 40.0,
            ..Default::default()
        };

        let _owed = current
            .replace(HeaderParameters {
                freight_rate_per_ton: 90.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(current.freight_rate_per_ton, 90.0);
        assert_eq!(current.toll_value, 0.0);

        let rejected = current.replace(HeaderParameters {
            icms_rate_percent: 100.0,
            ..Default::default()
        });
        assert!(rejected.is_err());
        assert_eq!(current.freight_rate_per_ton, 90.0);
    }
}
