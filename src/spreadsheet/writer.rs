use crate::models::AllocationSnapshot;
use csv::WriterBuilder;
use std::io::Write;

const COLUMNS: [&str; 16] = [
    "invoice_id",
    "invoice_number",
    "client",
    "issue_date",
    "declared_weight_kg",
    "invoice_value",
    "weight_share",
    "weight_based_freight",
    "express_value",
    "apportioned_freight",
    "toll_share",
    "palletizing_share",
    "transfer_freight_share",
    "collection_share",
    "icms_share",
    "total_charge",
];

/// Writes one row per invoice followed by a `TOTAL` row of column sums,
/// in the same dialect [`read_entries`](super::read_entries) accepts.
pub fn write_snapshot<W: Write>(
    snapshot: &AllocationSnapshot,
    out: W,
    delimiter: u8,
) -> Result<(), csv::Error> {
    let mut writer = WriterBuilder::new().delimiter(delimiter).from_writer(out);
    writer.write_record(COLUMNS)?;

    for invoice in &snapshot.invoices {
        let c = invoice.charges();
        writer.write_record([
            invoice.id.to_string(),
            invoice.invoice_number.clone().unwrap_or_default(),
            invoice.client.clone().unwrap_or_default(),
            invoice.issue_date.map(|d| d.to_string()).unwrap_or_default(),
            invoice.declared_weight_kg.to_string(),
            invoice.invoice_value.to_string(),
            c.weight_share.to_string(),
            c.weight_based_freight.to_string(),
            c.express_value.to_string(),
            c.apportioned_freight.to_string(),
            c.toll_share.to_string(),
            c.palletizing_share.to_string(),
            c.transfer_freight_share.to_string(),
            c.collection_share.to_string(),
            c.icms_share.to_string(),
            c.total_charge.to_string(),
        ])?;
    }

    let s = &snapshot.summary;
    let share_total: f64 = snapshot
        .invoices
        .iter()
        .fold(0.0, |sum, invoice| sum + invoice.charges().weight_share);
    writer.write_record([
        "TOTAL".to_string(),
        String::new(),
        String::new(),
        String::new(),
        s.declared_weight_kg.to_string(),
        s.invoice_value.to_string(),
        share_total.to_string(),
        s.weight_based_freight.to_string(),
        s.express_value.to_string(),
        s.apportioned_freight.to_string(),
        s.toll.to_string(),
        s.palletizing.to_string(),
        s.transfer_freight.to_string(),
        s.collection.to_string(),
        s.icms.to_string(),
        s.total_charge.to_string(),
    ])?;

    writer.flush()?;
    Ok(())
}

/// [`write_snapshot`] into a string.
pub fn snapshot_to_csv(snapshot: &AllocationSnapshot, delimiter: u8) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_snapshot(snapshot, &mut buf, delimiter)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
