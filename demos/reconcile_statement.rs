//! Reconcile a month of ledger entries against a bank statement

use reconciliation_core::{ReconciliationEngine, ReconciliationSettings, Transaction};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

const SETTINGS: &str = r#"
[reconcile]
date_margin_days = 3
amount_tolerance = "0.05"
max_combination_size = 4
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🏦 Reconciliation Core - Statement Reconciliation Example\n");

    let settings = ReconciliationSettings::from_toml(SETTINGS)?;
    let engine = ReconciliationEngine::with_config(settings.reconcile);

    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 3, d).ok_or("invalid date");
    let amount = |s: &str| BigDecimal::from_str(s);

    let ledger = vec![
        Transaction::expense(
            "L-001".into(),
            day(1)?,
            "Office rent March".into(),
            amount("1500.00")?,
        ),
        Transaction::income(
            "L-002".into(),
            day(4)?,
            "Invoice 2024-017 Acme".into(),
            amount("2360.00")?,
        ),
        Transaction::expense("L-003".into(), day(6)?, "Fuel station".into(), amount("64.90")?),
        Transaction::income(
            "L-004".into(),
            day(11)?,
            "Invoice 2024-018 Globex".into(),
            amount("800.00")?,
        ),
        Transaction::income(
            "L-005".into(),
            day(12)?,
            "Invoice 2024-019 Initech".into(),
            amount("450.00")?,
        ),
        Transaction::expense("L-006".into(), day(20)?, "Team lunch".into(), amount("120.00")?),
    ];

    let statement = vec![
        Transaction::expense("B-9001".into(), day(1)?, "RENT MARCH".into(), amount("1500")?),
        Transaction::income("B-9002".into(), day(6)?, "ACME CORP TRF".into(), amount("2360")?),
        Transaction::expense("B-9003".into(), day(7)?, "SHELL 0443".into(), amount("64.93")?),
        Transaction::income("B-9004".into(), day(13)?, "BATCH DEPOSIT".into(), amount("1250")?),
        Transaction::expense("B-9005".into(), day(31)?, "ACCOUNT FEE".into(), amount("7.50")?),
    ];

    let result = engine.reconcile_validated(&ledger, &statement)?;

    println!("\n✅ Matches:");
    for m in &result.matches {
        println!(
            "  {:?} ↔ {:?}  {}  (confidence {}, difference {})",
            m.internal_ids, m.external_ids, m.rule_info, m.confidence, m.difference
        );
    }

    println!("\n❓ Unmatched ledger entries:");
    for t in &result.unmatched_internal {
        println!("  {} {} {} {}", t.id, t.date, t.description, t.signed_amount());
    }

    println!("\n❓ Unmatched statement lines:");
    for t in &result.unmatched_external {
        println!("  {} {} {} {}", t.id, t.date, t.description, t.signed_amount());
    }

    println!("\n📊 {}", result.summary());

    Ok(())
}
