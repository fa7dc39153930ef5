//! Rank candidates for statement lines the engine left open, then review them

use reconciliation_core::utils::MemoryMatchStore;
use reconciliation_core::{CandidateScorer, MatchWorkflow, ReconciliationEngine, Transaction};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(true).init();

    println!("🔎 Reconciliation Core - Manual Review Example\n");

    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 4, d).ok_or("invalid date");
    let amount = |s: &str| BigDecimal::from_str(s);

    let ledger = vec![
        Transaction::income(
            "L-101".into(),
            day(2)?,
            "Consulting Globex April".into(),
            amount("4000.00")?,
        ),
        Transaction::expense("L-102".into(), day(3)?, "Laptop purchase".into(), amount("1899.00")?),
        Transaction::expense(
            "L-103".into(),
            day(9)?,
            "Cloud hosting April".into(),
            amount("212.40")?,
        ),
    ];
    let statement = vec![
        Transaction::income("B-501".into(), day(2)?, "GLOBEX INC".into(), amount("4000")?),
        Transaction::expense(
            "B-502".into(),
            day(8)?,
            "ELECTRONICS STORE laptop purchase".into(),
            amount("1899.00")?,
        ),
        Transaction::expense(
            "B-503".into(),
            day(10)?,
            "cloud hosting april invoice".into(),
            amount("215.00")?,
        ),
    ];

    let result = ReconciliationEngine::new().reconcile(&ledger, &statement);

    let mut workflow = MatchWorkflow::new(MemoryMatchStore::new());
    let stored = workflow.record_result(&result).await?;
    println!("💾 Stored {stored} automatic match(es)\n");

    let scorer = CandidateScorer::default();
    let batch =
        scorer.find_batch_candidates(&result.unmatched_external, &result.unmatched_internal);

    for line in &result.unmatched_external {
        println!("Statement line {} ({} {}):", line.id, line.description, line.signed_amount());
        let candidates = batch.get(&line.id).cloned().unwrap_or_default();
        for candidate in &candidates {
            println!(
                "  {:>3}  {}  {}",
                candidate.score,
                candidate.transaction.id,
                candidate.reason()
            );
        }

        if let Some(best) = candidates.first() {
            let suggestion = workflow.suggest(line, best).await?;
            let confirmed = workflow.confirm(&suggestion.id).await?;
            println!("  → confirmed {} as {}\n", confirmed.id, confirmed.status);
        }
    }

    for m in workflow.list_matches(None).await? {
        println!("{} {:?} ↔ {:?} [{}]", m.status, m.internal_ids, m.external_ids, m.rule_info);
    }

    Ok(())
}
