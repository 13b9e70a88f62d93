//! Expense tracker facade: expenses in any currency plus income/expense transactions

use crate::core::aggregate::{self, BucketKey, round_cents};
use crate::core::entity::{Data, EntityId};
use crate::core::error::Result;
use crate::core::query::{FilterState, PageRequest, PaginatedResponse};
use crate::core::render::{RenderedPage, render_page};
use crate::core::store::{EntityStore, StoreOptions};
use crate::entities::{Expense, Transaction, TransactionKind};
use crate::rates::{RateService, RateTable};
use crate::storage::KeyValueStore;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Expense dashboard, all amounts in the base currency
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub base_currency: String,
    pub count: usize,
    pub total: f64,
    pub by_category: IndexMap<String, f64>,
    pub currencies: Vec<String>,
    /// (id, name, amount in base) of the largest expenses
    pub top_expenses: Vec<(EntityId, String, f64)>,
    pub busiest_month: Option<(String, usize)>,
    pub average_per_month: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Balance {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
}

pub struct Ledger {
    expenses: EntityStore<Expense>,
    transactions: EntityStore<Transaction>,
    base_currency: String,
}

impl Ledger {
    pub fn open(kv: Arc<dyn KeyValueStore>, options: StoreOptions, base_currency: &str) -> Self {
        Self {
            expenses: EntityStore::open(kv.clone(), options.clone()),
            transactions: EntityStore::open(kv, options),
            base_currency: base_currency.trim().to_ascii_uppercase(),
        }
    }

    pub fn teardown(self) -> Result<()> {
        self.expenses.teardown()?;
        self.transactions.teardown()
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn expenses(&self) -> &EntityStore<Expense> {
        &self.expenses
    }

    pub fn transactions(&self) -> &EntityStore<Transaction> {
        &self.transactions
    }

    pub fn add_expense(&mut self, draft: Value) -> Result<Expense> {
        self.expenses.create(draft)
    }

    pub fn update_expense(&mut self, id: EntityId, patch: Value) -> Result<Expense> {
        self.expenses.update(id, patch)
    }

    pub fn delete_expense(&mut self, id: EntityId) -> Result<Expense> {
        self.expenses.delete(id)
    }

    pub fn add_transaction(&mut self, draft: Value) -> Result<Transaction> {
        self.transactions.create(draft)
    }

    pub fn delete_transaction(&mut self, id: EntityId) -> Result<Transaction> {
        self.transactions.delete(id)
    }

    pub fn query_expenses(&self, filter: &FilterState, page: PageRequest) -> PaginatedResponse<Expense> {
        self.expenses.query(filter, page)
    }

    pub fn render_expenses(&self, filter: &FilterState, page: PageRequest) -> RenderedPage {
        render_page(&self.query_expenses(filter, page))
    }

    pub fn query_transactions(&self, filter: &FilterState, page: PageRequest) -> PaginatedResponse<Transaction> {
        self.transactions.query(filter, page)
    }

    /// Dashboard over every expense, converted with `table`
    pub fn summary(&self, table: &RateTable) -> LedgerSummary {
        let expenses = self.expenses.list();
        let base = self.base_currency.as_str();
        let in_base = |e: &Expense| table.convert_or_keep(e.amount, &e.currency, base);

        let mut by_category: IndexMap<String, f64> = IndexMap::new();
        for expense in expenses {
            *by_category.entry(expense.category.clone()).or_insert(0.0) += in_base(expense);
        }
        for total in by_category.values_mut() {
            *total = round_cents(*total);
        }

        let mut ranked: Vec<(EntityId, String, f64)> = expenses
            .iter()
            .map(|e| (e.id, e.name.clone(), round_cents(in_base(e))))
            .collect();
        ranked.sort_by(|a, b| b.2.total_cmp(&a.2));
        ranked.truncate(5);

        let currencies = {
            let units: indexmap::IndexSet<&str> = expenses.iter().filter_map(Data::unit).collect();
            units.into_iter().map(str::to_string).collect()
        };

        LedgerSummary {
            base_currency: self.base_currency.clone(),
            count: aggregate::count(expenses),
            total: aggregate::sum_in_unit(expenses, base, |amount, from, to| {
                table.convert_or_keep(amount, from, to)
            }),
            by_category,
            currencies,
            top_expenses: ranked,
            busiest_month: aggregate::busiest_bucket(&aggregate::bucket_counts(expenses, BucketKey::YearMonth)),
            average_per_month: aggregate::average_per_month(expenses),
        }
    }

    /// Income minus expenses over all transactions
    pub fn balance(&self) -> Balance {
        let sum_kind = |kind: TransactionKind| {
            round_cents(
                self.transactions
                    .list()
                    .iter()
                    .filter(|t| t.kind == kind)
                    .map(|t| t.amount)
                    .sum(),
            )
        };
        let income = sum_kind(TransactionKind::Income);
        let expenses = sum_kind(TransactionKind::Expense);
        Balance {
            income,
            expenses,
            net: round_cents(income - expenses),
        }
    }

    /// Total of all expenses in the base currency, using live rates when available
    pub async fn total_in_base(&self, rates: &RateService) -> f64 {
        let table = rates.rates(&self.base_currency).await;
        aggregate::sum_in_unit(self.expenses.list(), &self.base_currency, |amount, from, to| {
            table.convert_or_keep(amount, from, to)
        })
    }
}
