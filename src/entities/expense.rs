//! Expense tracker entry

use crate::core::entity::{Data, EntityId, Operation};
use crate::core::field::{FieldFormat, FieldValue};
use crate::core::render::{DisplayRow, Render, format_amount};
use crate::core::validation::{EntityValidationConfig, filters, validators};
use crate::entities::{date_start, day_start};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_EXPENSE_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: EntityId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub name: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// Day the money was spent; falls back to `created_at`
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_category() -> String {
    DEFAULT_EXPENSE_CATEGORY.to_string()
}

crate::impl_entity!(Expense, "expenses", "expense", sample_expenses);

impl Data for Expense {
    fn title(&self) -> &str {
        &self.name
    }

    fn indexed_fields() -> &'static [&'static str] {
        &["name", "notes"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "name" => Some(self.name.clone().into()),
            "notes" => Some(self.notes.clone().into()),
            "category" => Some(self.category.clone().into()),
            "currency" => Some(self.currency.clone().into()),
            "amount" => Some(self.amount.into()),
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

    fn unit(&self) -> Option<&str> {
        Some(&self.currency)
    }

    fn measure(&self) -> f64 {
        self.amount
    }

    fn validation_config(_operation: Operation) -> EntityValidationConfig {
        EntityValidationConfig::new("expense")
            .filter("name", filters::trim())
            .validate("name", validators::required())
            .validate("name", validators::max_length(100))
            .filter("amount", filters::parse_number())
            .filter("amount", filters::round_decimals(2))
            .validate("amount", validators::required())
            .validate("amount", validators::non_negative())
            .filter("currency", filters::trim())
            .filter("currency", filters::uppercase())
            .filter("currency", filters::blank_to_null())
            .validate("currency", validators::format(FieldFormat::CurrencyCode))
            .filter("category", filters::trim())
            .filter("category", filters::blank_to_null())
            .filter("date", filters::blank_to_null())
            .filter("notes", filters::trim())
            .validate("notes", validators::max_length(500))
    }
}

impl Render for Expense {
    fn to_row(&self) -> DisplayRow {
        DisplayRow {
            id: self.id,
            title: self.name.clone(),
            subtitle: self.notes.clone(),
            badges: vec![self.category.clone(), self.currency.clone()],
            meta: vec![
                self.occurred_at().format("%Y-%m-%d").to_string(),
                format_amount(self.amount, &self.currency),
            ],
        }
    }
}

fn sample_expenses() -> Vec<Expense> {
    let expense = |id: EntityId, name: &str, amount: f64, currency: &str, category: &str, day: u32| {
        let at = day_start(2024, 3, day);
        Expense {
            id,
            created_at: at,
            updated_at: at,
            name: name.to_string(),
            amount,
            currency: currency.to_string(),
            category: category.to_string(),
            date: Some(at.date_naive()),
            notes: String::new(),
        }
    };

    vec![
        expense(1, "Groceries", 54.20, "USD", "Food", 2),
        expense(2, "Train ticket", 23.00, "EUR", "Transport", 5),
        expense(3, "Coffee beans", 14.50, "USD", "Food", 9),
    ]
}
