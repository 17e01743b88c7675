//! Request dispatch for the command-line adapter
//!
//! Runs one operation against the aggregate store or the reverse index and
//! turns the outcome into a status code and a JSON body. Status mapping and
//! logging live here; the core only returns typed outcomes.

use super::args::Operation;
use crate::core::{AccountStore, ReverseIndex, TableClient};
use crate::types::{AppendOutcome, StoreError};
use serde::Serialize;
use serde_json::{json, Value};

/// Outcome of one dispatched operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub body: Value,
}

impl Response {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Response {
                status_code: 200,
                body,
            },
            Err(e) => Response::message(500, e.to_string()),
        }
    }

    fn message(status_code: u16, message: impl Into<String>) -> Self {
        Response {
            status_code,
            body: json!({ "message": message.into() }),
        }
    }

    fn from_error(error: &StoreError) -> Self {
        let status_code = match error {
            StoreError::BranchNotFound { .. }
            | StoreError::BillingNotFound { .. }
            | StoreError::BillingNumberUnresolved { .. } => 404,
            StoreError::InvalidKey { .. } | StoreError::InvalidAttribute { .. } => 400,
            StoreError::CorruptAggregate { .. } | StoreError::Storage(_) => 500,
        };
        Response::message(status_code, error.to_string())
    }
}

/// Parse a `set` value as JSON, falling back to a plain string
pub fn parse_attribute_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run one operation and map its outcome to a Response
pub async fn dispatch<C: TableClient>(
    store: &AccountStore<C>,
    index: &ReverseIndex<C>,
    operation: &Operation,
) -> Response {
    let response = match operation {
        Operation::Create { branch_id, crm_id } => {
            respond(store.create_account(branch_id, crm_id).await)
        }
        Operation::Get { branch_id } => respond(store.get_account(branch_id).await),
        Operation::AddBilling {
            branch_id,
            billing_account_number,
        } => respond(
            store
                .add_billing_account(branch_id, billing_account_number)
                .await,
        ),
        Operation::Set {
            branch_id,
            key,
            value,
        } => respond(
            store
                .set_master_attribute(branch_id, key, parse_attribute_value(value))
                .await,
        ),
        Operation::AppendService {
            branch_id,
            billing_account_number,
            service_account_number,
        } => match store
            .append_service_account(branch_id, billing_account_number, service_account_number)
            .await
        {
            Ok(AppendOutcome::Appended(row)) => Response::ok(&row),
            Ok(AppendOutcome::Conflict) => Response::message(
                409,
                format!(
                    "Service account {} already present on billing account {}",
                    service_account_number, billing_account_number
                ),
            ),
            Err(e) => Response::from_error(&e),
        },
        Operation::Delete { branch_id } => respond(store.delete_account(branch_id).await),
        Operation::Resolve {
            billing_account_number,
        } => respond(
            index
                .resolve_branch(billing_account_number)
                .await
                .map(|branch_id| json!({ "branchId": branch_id })),
        ),
        Operation::DeleteBilling {
            billing_account_number,
        } => respond(index.delete_billing(billing_account_number).await),
    };

    if response.status_code >= 500 {
        tracing::error!(
            operation = operation.name(),
            status = response.status_code,
            body = %response.body,
            "Operation failed"
        );
    } else {
        tracing::info!(
            operation = operation.name(),
            status = response.status_code,
            "Operation handled"
        );
    }
    response
}

fn respond<T: Serialize>(result: Result<T, StoreError>) -> Response {
    match result {
        Ok(value) => Response::ok(&value),
        Err(e) => Response::from_error(&e),
    }
}
