//! Income/expense ledger line

use crate::core::entity::{Data, EntityId, Operation};
use crate::core::field::FieldValue;
use crate::core::render::{DisplayRow, Render, format_amount};
use crate::core::validation::{EntityValidationConfig, filters, validators};
use crate::entities::date_start;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// +1 for income, -1 for expenses
    pub fn sign(&self) -> f64 {
        match self {
            TransactionKind::Income => 1.0,
            TransactionKind::Expense => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub description: String,
    /// Always positive; direction comes from `kind`
    pub amount: f64,
    pub kind: TransactionKind,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

fn default_category() -> String {
    "General".to_string()
}

crate::impl_entity!(Transaction, "transactions", "transaction");

impl Transaction {
    /// Amount with the sign of its kind
    pub fn signed_amount(&self) -> f64 {
        self.amount * self.kind.sign()
    }
}

impl Data for Transaction {
    fn title(&self) -> &str {
        &self.description
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["description", "category"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "description" => Some(self.description.clone().into()),
            "category" => Some(self.category.clone().into()),
            "amount" => Some(self.amount.into()),
            "kind" | "status" => Some(self.kind.as_str().into()),
            "date" => Some(self.occurred_at().into()),
            _ => None,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.date.map(date_start).unwrap_or(self.created_at)
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }

    fn measure(&self) -> f64 {
        self.amount
    }

    fn validation_config(_operation: Operation) -> EntityValidationConfig {
        EntityValidationConfig::new("transaction")
            .filter("description", filters::trim())
            .validate("description", validators::required())
            .filter("amount", filters::parse_number())
            .filter("amount", filters::round_decimals(2))
            .validate("amount", validators::required())
            .validate("amount", validators::non_negative())
            .filter("kind", filters::trim())
            .filter("kind", filters::lowercase())
            .validate("kind", validators::required())
            .validate(
                "kind",
                validators::in_list(vec!["income".to_string(), "expense".to_string()]),
            )
            .filter("category", filters::trim())
            .filter("category", filters::blank_to_null())
            .filter("date", filters::blank_to_null())
    }
}

impl Render for Transaction {
    fn to_row(&self) -> DisplayRow {
        DisplayRow {
            id: self.id,
            title: self.description.clone(),
            subtitle: self.category.clone(),
            badges: vec![self.kind.as_str().to_string()],
            meta: vec![
                self.occurred_at().format("%Y-%m-%d").to_string(),
                format_amount(self.signed_amount(), "USD"),
            ],
        }
    }
}
