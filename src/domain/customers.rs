//! Customer records and the write-side input shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Payment status of a customer row.
///
/// Variant names are the persisted wire form (`"Open"`, `"Paid"`, ...),
/// matching the blob format the service reads and writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerStatus {
    #[default]
    Open,
    Paid,
    Due,
    Inactive,
}

impl CustomerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CustomerStatus::Open => "Open",
            CustomerStatus::Paid => "Paid",
            CustomerStatus::Due => "Due",
            CustomerStatus::Inactive => "Inactive",
        }
    }
}

impl TryFrom<&str> for CustomerStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Open" => Ok(CustomerStatus::Open),
            "Paid" => Ok(CustomerStatus::Paid),
            "Due" => Ok(CustomerStatus::Due),
            "Inactive" => Ok(CustomerStatus::Inactive),
            _ => Err(()),
        }
    }
}

/// A single customer/payment row.
///
/// The identifier is opaque, globally unique, and immutable after creation;
/// everything else can change through [`CustomerPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: CustomerStatus,
    pub rate: f64,
    pub balance: f64,
    pub deposit: f64,
}

impl CustomerRecord {
    /// The statically declared searchable projections of this record, in
    /// field order: name, description, status, rate, balance, deposit.
    ///
    /// Numbers are formatted with Rust's shortest round-trip `Display`
    /// (no locale grouping), the status by its wire name.
    pub fn search_haystacks(&self) -> [String; 6] {
        [
            self.name.clone(),
            self.description.clone(),
            self.status.as_str().to_string(),
            format_amount(self.rate),
            format_amount(self.balance),
            format_amount(self.deposit),
        ]
    }
}

/// Format a currency amount for search matching and display.
pub fn format_amount(value: f64) -> String {
    value.to_string()
}

/// Validated input for creating a customer.
///
/// `name` and `rate` are mandatory; the remaining fields fall back to the
/// documented defaults (empty description, `Open`, zero amounts).
#[derive(Debug, Clone)]
pub struct CustomerDraft {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<CustomerStatus>,
    pub rate: f64,
    pub balance: Option<f64>,
    pub deposit: Option<f64>,
}

impl CustomerDraft {
    pub fn new(name: impl Into<String>, rate: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            status: None,
            rate,
            balance: None,
            deposit: None,
        }
    }

    /// Validate the draft and materialize a record with a fresh identifier.
    pub fn into_record(self) -> Result<CustomerRecord, DomainError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        ensure_amount("rate", self.rate)?;
        if let Some(balance) = self.balance {
            ensure_amount("balance", balance)?;
        }
        if let Some(deposit) = self.deposit {
            ensure_amount("deposit", deposit)?;
        }

        Ok(CustomerRecord {
            id: Uuid::new_v4(),
            name,
            description: self
                .description
                .map(|value| value.trim().to_string())
                .unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            rate: self.rate,
            balance: self.balance.unwrap_or(0.0),
            deposit: self.deposit.unwrap_or(0.0),
        })
    }
}

/// Partial update for an existing customer; absent fields are left as-is.
/// The identifier is not part of the patch and cannot change.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<CustomerStatus>,
    pub rate: Option<f64>,
    pub balance: Option<f64>,
    pub deposit: Option<f64>,
}

impl CustomerPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.rate.is_none()
            && self.balance.is_none()
            && self.deposit.is_none()
    }

    /// Validate the fields present in the patch; the same constraints as
    /// creation apply to whatever is being changed.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err(DomainError::validation("name must not be empty"));
        }
        if let Some(rate) = self.rate {
            ensure_amount("rate", rate)?;
        }
        if let Some(balance) = self.balance {
            ensure_amount("balance", balance)?;
        }
        if let Some(deposit) = self.deposit {
            ensure_amount("deposit", deposit)?;
        }
        Ok(())
    }

    /// Merge the patch into `record`, field by field.
    pub fn apply_to(&self, record: &mut CustomerRecord) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = description.trim().to_string();
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        if let Some(rate) = self.rate {
            record.rate = rate;
        }
        if let Some(balance) = self.balance {
            record.balance = balance;
        }
        if let Some(deposit) = self.deposit {
            record.deposit = deposit;
        }
    }
}

fn ensure_amount(field: &'static str, value: f64) -> Result<(), DomainError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "{field} must be a finite number"
        )))
    }
}
