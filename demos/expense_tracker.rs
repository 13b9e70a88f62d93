//! Expense tracker walkthrough: multi-currency expenses, dashboard and balance

use serde_json::json;
use shelf::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("💰 Shelf Expense Tracker Example\n");

    let config = ShelfConfig::from_yaml_str("rates:\n  base_currency: USD\nseed_defaults: false\n")?;
    let kv = config.open_storage()?;
    let mut ledger = Ledger::open(kv, config.store_options(), &config.rates.base_currency);
    let rates = config.rate_service()?;

    for draft in [
        json!({ "name": "Rent", "amount": "1200", "category": "Home", "date": "2024-03-01" }),
        json!({ "name": "Train to Lyon", "amount": 64.5, "currency": "eur", "category": "Travel", "date": "2024-03-08" }),
        json!({ "name": "Groceries", "amount": 82.3, "category": "Food", "date": "2024-03-09" }),
        json!({ "name": "Ramen", "amount": 1800, "currency": "JPY", "category": "Food", "date": "2024-04-02" }),
    ] {
        let expense = ledger.add_expense(draft)?;
        println!("✅ {:<14} {}", expense.name, format_amount(expense.amount, &expense.currency));
    }

    if let Err(e) = ledger.add_expense(json!({ "name": "Mystery", "amount": "lots" })) {
        println!("⚠️  {}", e.to_notice().message);
    }

    ledger.add_transaction(json!({ "description": "Salary", "amount": 3200, "kind": "income" }))?;
    ledger.add_transaction(json!({ "description": "Rent", "amount": 1200, "kind": "expense" }))?;

    println!("\n🔎 Food expenses, highest first:");
    let filter = FilterState::default().with_category("Food").with_sort(SortKey::Popular);
    let page = ledger.render_expenses(&filter, config.page(1, 0));
    for row in &page.rows {
        println!("   {:<14} {}", row.title, row.meta.join(" · "));
    }
    println!("   {}", page.footer);

    let table = rates.rates(ledger.base_currency()).await;
    let summary = ledger.summary(&table);
    println!("\n📊 Summary in {}", summary.base_currency);
    println!("   total: {}", format_amount(summary.total, &summary.base_currency));
    for (category, total) in &summary.by_category {
        println!("   {:<8} {}", category, format_amount(*total, &summary.base_currency));
    }
    if let Some((month, count)) = &summary.busiest_month {
        println!("   busiest month: {month} ({count} expenses)");
    }

    let total = ledger.total_in_base(&rates).await;
    println!("   total via rate service: {}", format_amount(total, ledger.base_currency()));

    let balance = ledger.balance();
    println!(
        "\n⚖️  income {} - expenses {} = {}",
        format_amount(balance.income, "USD"),
        format_amount(balance.expenses, "USD"),
        format_amount(balance.net, "USD")
    );

    ledger.teardown()?;
    println!("\n✨ Done");
    Ok(())
}
