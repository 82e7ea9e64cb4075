//! Expense report drafting rules.
//!
//! Reports are assembled in draft by their owner; these checks run before
//! anything is written.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spendgate_shared::types::{CurrencyCode, EmployeeId, Money};

use crate::workflow::error::WorkflowError;
use crate::workflow::types::ReportStatus;

/// Longest accepted report name, in characters.
pub const MAX_REPORT_NAME_LEN: usize = 200;

/// Decimal places an expense amount may carry; matches the stored scale.
pub const MAX_AMOUNT_SCALE: u32 = 4;

/// Exclusive upper bound on an expense amount (twelve integer digits).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

/// Trims and checks a report name.
///
/// # Errors
///
/// Returns `WorkflowError::InvalidArgument` if the name is blank or too long.
pub fn validate_report_name(name: &str) -> Result<String, WorkflowError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkflowError::InvalidArgument(
            "Report name is required".to_string(),
        ));
    }
    if name.chars().count() > MAX_REPORT_NAME_LEN {
        return Err(WorkflowError::InvalidArgument(format!(
            "Report name must be at most {MAX_REPORT_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// Checks that `actor_id` may still change a report.
///
/// # Errors
///
/// * `WorkflowError::Forbidden` if the actor does not own the report
/// * `WorkflowError::InvalidState` once the report has left draft
pub fn ensure_editable(
    actor_id: EmployeeId,
    owner_id: EmployeeId,
    status: ReportStatus,
) -> Result<(), WorkflowError> {
    if actor_id != owner_id {
        return Err(WorkflowError::Forbidden(
            "Only the owner can edit a report".to_string(),
        ));
    }
    if !status.is_editable() {
        return Err(WorkflowError::InvalidState {
            action: "edit",
            status,
        });
    }
    Ok(())
}

/// Input for adding an expense line to a draft report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    /// Where the money was spent.
    pub merchant: String,
    /// Date of the expense.
    pub expense_date: NaiveDate,
    /// Amount spent.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Free-form category label.
    pub category: Option<String>,
    /// Optional description.
    pub description: Option<String>,
}

/// An expense line that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedExpense {
    /// Trimmed merchant.
    pub merchant: String,
    /// Date of the expense.
    pub expense_date: NaiveDate,
    /// Positive amount in its currency.
    pub amount: Money,
    /// Trimmed category, if any.
    pub category: Option<String>,
    /// Trimmed description, if any.
    pub description: Option<String>,
}

impl NewExpense {
    /// Validates the expense line.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidArgument` for a blank merchant, a
    /// malformed currency, or an amount that is not positive, has more than
    /// [`MAX_AMOUNT_SCALE`] decimal places, or reaches [`MAX_AMOUNT`].
    pub fn validate(self) -> Result<ValidatedExpense, WorkflowError> {
        let merchant = self.merchant.trim();
        if merchant.is_empty() {
            return Err(WorkflowError::InvalidArgument(
                "Merchant is required".to_string(),
            ));
        }

        let currency: CurrencyCode = self
            .currency
            .parse()
            .map_err(WorkflowError::InvalidArgument)?;

        let amount = Money::new(self.amount, currency);
        if !amount.is_positive() {
            return Err(WorkflowError::InvalidArgument(format!(
                "Expense amount must be positive, got {amount}"
            )));
        }
        if self.amount.scale() > MAX_AMOUNT_SCALE {
            return Err(WorkflowError::InvalidArgument(format!(
                "Expense amount allows at most {MAX_AMOUNT_SCALE} decimal places, got {}",
                self.amount
            )));
        }
        if self.amount >= MAX_AMOUNT {
            return Err(WorkflowError::InvalidArgument(format!(
                "Expense amount must be below {MAX_AMOUNT}, got {}",
                self.amount
            )));
        }

        Ok(ValidatedExpense {
            merchant: merchant.to_string(),
            expense_date: self.expense_date,
            amount,
            category: non_blank(self.category),
            description: non_blank(self.description),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
