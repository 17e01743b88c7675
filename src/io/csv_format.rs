//! CSV export of the branch table
//!
//! Flattens rows into a report with columns:
//! `branchId, billingAccountNumber, crmId, serviceAccountNumber`.
//! Master rows fill `crmId`; billing rows fill `serviceAccountNumber`, with
//! multiple service numbers joined by `;`. Other master attributes are not
//! exported.

use crate::types::row::CRM_ID;
use crate::types::Row;
use serde_json::Value;
use std::io::Write;

/// Separator between service account numbers in one cell
pub const SERVICE_SEPARATOR: &str = ";";

/// Write rows to CSV format
///
/// Rows are sorted by branch ID then billing account number for
/// deterministic output.
///
/// # Arguments
///
/// * `rows` - Rows to write, in any order
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_rows_csv(rows: &[Row], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    // Write header
    writer
        .write_record(["branchId", "billingAccountNumber", "crmId", "serviceAccountNumber"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_rows: Vec<&Row> = rows.iter().collect();
    sorted_rows.sort_by(|a, b| {
        (&a.branch_id, &a.billing_account_number).cmp(&(&b.branch_id, &b.billing_account_number))
    });

    for row in sorted_rows {
        let crm_id = if row.is_master() {
            match row.attributes.get(CRM_ID) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }
        } else {
            String::new()
        };
        writer
            .write_record(&[
                row.branch_id.clone(),
                row.billing_account_number.clone(),
                crm_id,
                row.service_account_numbers().join(SERVICE_SEPARATOR),
            ])
            .map_err(|e| format!("Failed to write row record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
