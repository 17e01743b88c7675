//! Table configuration
//!
//! Names the table, where its snapshot lives and which attributes carry a
//! secondary index. Values come from the command line (with environment
//! fallbacks) and fall back to defaults when empty.

use crate::types::row::BILLING_ACCOUNT_NUMBER;
use std::path::PathBuf;

/// Default table name
pub const DEFAULT_TABLE_NAME: &str = "Branch";

/// Default snapshot file
pub const DEFAULT_DATA_FILE: &str = "branch-table.json";

/// Configuration for the branch table
#[derive(Clone, Debug, PartialEq)]
pub struct TableConfig {
    /// Name recorded in and checked against the snapshot
    pub table_name: String,
    /// Snapshot file the table is loaded from and saved to
    pub data_file: PathBuf,
    /// Attributes served by a secondary index
    pub indexed_attributes: Vec<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            indexed_attributes: vec![BILLING_ACCOUNT_NUMBER.to_string()],
        }
    }
}

impl TableConfig {
    /// Create a new TableConfig with custom values
    pub fn new(table_name: impl Into<String>, data_file: impl Into<PathBuf>) -> Self {
        let default = Self::default();

        let table_name = table_name.into();
        let table_name = if table_name.trim().is_empty() {
            tracing::warn!(
                default = %default.table_name,
                "Invalid table name (empty), using default"
            );
            default.table_name
        } else {
            table_name
        };

        let data_file = data_file.into();
        let data_file = if data_file.as_os_str().is_empty() {
            tracing::warn!(
                default = %default.data_file.display(),
                "Invalid data file (empty), using default"
            );
            default.data_file
        } else {
            data_file
        };

        Self {
            table_name,
            data_file,
            indexed_attributes: default.indexed_attributes,
        }
    }

    /// Declare the secondary indexes of the table
    ///
    /// Blank and repeated names are dropped. `billingAccountNumber` is always
    /// indexed because billing number resolution queries it.
    pub fn with_indexed_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut indexed = vec![BILLING_ACCOUNT_NUMBER.to_string()];
        let mut requested_billing_index = false;
        for attribute in attributes {
            let attribute = attribute.into().trim().to_string();
            if attribute == BILLING_ACCOUNT_NUMBER {
                requested_billing_index = true;
            }
            if !attribute.is_empty() && !indexed.contains(&attribute) {
                indexed.push(attribute);
            }
        }
        if !requested_billing_index {
            tracing::warn!(
                index = BILLING_ACCOUNT_NUMBER,
                "Required index not listed, adding it"
            );
        }

        self.indexed_attributes = indexed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config() {
        let config = TableConfig::default();

        assert_eq!(config.table_name, "Branch");
        assert_eq!(config.data_file, PathBuf::from("branch-table.json"));
        assert_eq!(config.indexed_attributes, vec!["billingAccountNumber"]);
    }

    #[rstest]
    #[case::custom("Accounts", "data/accounts.json", "Accounts", "data/accounts.json")]
    #[case::empty_table("", "data/accounts.json", "Branch", "data/accounts.json")]
    #[case::blank_table("  ", "x.json", "Branch", "x.json")]
    #[case::empty_file("Accounts", "", "Accounts", "branch-table.json")]
    fn test_new_falls_back_on_empty_values(
        #[case] table_name: &str,
        #[case] data_file: &str,
        #[case] expected_table: &str,
        #[case] expected_file: &str,
    ) {
        let config = TableConfig::new(table_name, data_file);

        assert_eq!(config.table_name, expected_table);
        assert_eq!(config.data_file, PathBuf::from(expected_file));
    }

    #[rstest]
    #[case::default_only(&["billingAccountNumber"], &["billingAccountNumber"])]
    #[case::extra(&["billingAccountNumber", "crmId"], &["billingAccountNumber", "crmId"])]
    #[case::billing_added(&["crmId"], &["billingAccountNumber", "crmId"])]
    #[case::blank_and_repeated(&["crmId", " ", "crmId", ""], &["billingAccountNumber", "crmId"])]
    #[case::trimmed(&[" crmId "], &["billingAccountNumber", "crmId"])]
    fn test_with_indexed_attributes(#[case] requested: &[&str], #[case] expected: &[&str]) {
        let config = TableConfig::default().with_indexed_attributes(requested.iter().copied());

        assert_eq!(config.indexed_attributes, expected);
    }
}
