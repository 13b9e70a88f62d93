//! Expense tracker workflows: multi-currency totals, dashboards and filters

use serde_json::json;
use shelf::apps::Ledger;
use shelf::core::query::{FilterState, PageRequest, SortKey};
use shelf::core::store::StoreOptions;
use shelf::rates::{RateService, RateSource, RateTable, StaticRateProvider, fallback_rates};
use shelf::storage::{InMemoryKeyValueStore, KeyValueStore};
use std::collections::HashMap;
use std::sync::Arc;

fn ledger() -> Ledger {
    Ledger::open(Arc::new(InMemoryKeyValueStore::new()), StoreOptions::empty(), "USD")
}

fn usd_table(eur_per_usd: f64) -> RateTable {
    RateTable::new(
        "USD",
        HashMap::from([("EUR".to_string(), eur_per_usd)]),
        RateSource::Live,
    )
}

fn add(ledger: &mut Ledger, name: &str, amount: f64, currency: &str, category: &str, date: &str) {
    ledger
        .add_expense(json!({
            "name": name,
            "amount": amount,
            "currency": currency,
            "category": category,
            "date": date,
        }))
        .unwrap();
}

#[tokio::test]
async fn test_total_in_base_converts_foreign_amounts() {
    let mut ledger = ledger();
    add(&mut ledger, "Lunch", 10.0, "USD", "Food", "2024-03-01");
    add(&mut ledger, "Museum", 10.0, "EUR", "Leisure", "2024-03-02");

    let rates = RateService::new(Arc::new(StaticRateProvider::with_table(usd_table(1.0 / 1.1))));
    assert_eq!(ledger.total_in_base(&rates).await, 21.0);
}

#[tokio::test]
async fn test_total_in_base_offline_uses_fallback_table() {
    let mut ledger = ledger();
    add(&mut ledger, "Hotel", 92.0, "EUR", "Travel", "2024-03-01");

    let total = ledger.total_in_base(&RateService::offline()).await;
    assert_eq!(total, 100.0);
}

#[test]
fn test_expense_defaults_and_normalisation() {
    let mut ledger = ledger();
    let expense = ledger
        .add_expense(json!({ "name": "  Taxi ", "amount": "12.346", "currency": " eur ", "category": "" }))
        .unwrap();

    assert_eq!(expense.name, "Taxi");
    assert_eq!(expense.amount, 12.35);
    assert_eq!(expense.currency, "EUR");
    assert_eq!(expense.category, "Other");
    assert_eq!(expense.date, None);
}

#[test]
fn test_invalid_expense_is_refused() {
    let mut ledger = ledger();
    let err = ledger
        .add_expense(json!({ "name": "", "amount": -5, "currency": "euro" }))
        .unwrap_err();

    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    let notice = err.to_notice();
    let fields = notice.details.unwrap()["fields"].clone();
    let names: Vec<&str> = fields
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["name", "amount", "currency"]);
    assert!(ledger.expenses().is_empty());
}

#[test]
fn test_summary_dashboard() {
    let mut ledger = ledger();
    add(&mut ledger, "Rent", 900.0, "USD", "Home", "2024-01-01");
    add(&mut ledger, "Groceries", 120.0, "USD", "Food", "2024-01-10");
    add(&mut ledger, "Dinner", 50.0, "EUR", "Food", "2024-03-05");
    add(&mut ledger, "Market", 25.0, "EUR", "Food", "2024-03-20");

    let summary = ledger.summary(&usd_table(0.5));

    assert_eq!(summary.base_currency, "USD");
    assert_eq!(summary.count, 4);
    assert_eq!(summary.total, 1170.0);
    assert_eq!(summary.by_category.get("Home"), Some(&900.0));
    assert_eq!(summary.by_category.get("Food"), Some(&270.0));
    assert_eq!(summary.currencies, vec!["USD", "EUR"]);
    assert_eq!(summary.top_expenses[0].1, "Rent");
    assert_eq!(summary.top_expenses[1].1, "Groceries");
    assert_eq!(summary.top_expenses[2], (3, "Dinner".to_string(), 100.0));
    // January and March tie; the first month seen wins
    assert_eq!(summary.busiest_month, Some(("2024-01".to_string(), 2)));
    // four expenses over January..March
    assert!((summary.average_per_month - 4.0 / 3.0).abs() < 1e-9);
}

#[test]
fn test_filter_by_currency_and_date() {
    let mut ledger = ledger();
    add(&mut ledger, "Rent", 900.0, "USD", "Home", "2024-01-01");
    add(&mut ledger, "Dinner", 50.0, "EUR", "Food", "2024-03-05");
    add(&mut ledger, "Market", 25.0, "EUR", "Food", "2024-03-20");

    let filter = FilterState::default().with_unit("eur").with_sort(SortKey::Oldest);
    let page = ledger.query_expenses(&filter, PageRequest::default());
    let names: Vec<&str> = page.data.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Dinner", "Market"]);

    let rendered = ledger.render_expenses(&filter, PageRequest::default());
    assert_eq!(rendered.rows.len(), 2);
    assert_eq!(rendered.footer, "Showing 1-2 of 2 (page 1 of 1)");
}

#[test]
fn test_transactions_balance_and_kind_filter() {
    let mut ledger = ledger();
    ledger
        .add_transaction(json!({ "description": "Salary", "amount": 2500, "kind": "Income" }))
        .unwrap();
    ledger
        .add_transaction(json!({ "description": "Rent", "amount": 900, "kind": "expense" }))
        .unwrap();
    let coffee = ledger
        .add_transaction(json!({ "description": "Coffee", "amount": "3.40", "kind": "expense" }))
        .unwrap();

    assert!(ledger.add_transaction(json!({ "description": "?", "amount": 1, "kind": "gift" })).is_err());

    let balance = ledger.balance();
    assert_eq!(balance.income, 2500.0);
    assert_eq!(balance.expenses, 903.4);
    assert_eq!(balance.net, 1596.6);

    ledger.delete_transaction(coffee.id).unwrap();
    let spent = ledger.query_transactions(&FilterState::default().with_status("expense"), PageRequest::default());
    assert_eq!(spent.pagination.total, 1);
}

#[test]
fn test_ledger_survives_reopen() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
    let mut first = Ledger::open(kv.clone(), StoreOptions::empty(), "usd");
    first
        .add_expense(json!({ "name": "Book", "amount": 15, "date": "2024-02-02" }))
        .unwrap();
    first.teardown().unwrap();

    let second = Ledger::open(kv, StoreOptions::empty(), "usd");
    assert_eq!(second.expenses().len(), 1);
    assert_eq!(second.base_currency(), "USD");
    assert_eq!(second.summary(&fallback_rates("USD")).total, 15.0);
}
