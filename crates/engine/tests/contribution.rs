//! End-to-end contribution flow

mod common;

use std::sync::Arc;

use campaign_core::{Currency, Money, MoneyError, NativeAmount};
use campaign_eligibility::{Decision, RejectionReason};
use campaign_engine::{
    Collaborator, ContributionAmount, ContributionError, ContributionRequest,
};
use campaign_ledger::{recompute_totals, verify_chain, ContributionLedger, JournalLedger};
use campaign_oracle::{FixedPriceOracle, TradingPair};
use common::*;
use rust_decimal_macros::dec;

fn request(who: &str, amount: &str) -> ContributionRequest {
    ContributionRequest::usd(donor(who), usd(amount))
}

#[tokio::test]
async fn test_accepted_contribution_recorded() {
    let (engine, ledger) = simple_engine(&["alice"]);

    let receipt = engine
        .submit(request("alice", "1000").with_correlation_id("form-1"))
        .await
        .unwrap();

    assert!(receipt.is_accepted());
    assert_eq!(receipt.cumulative_after, Some(usd("1000")));
    assert_eq!(receipt.correlation_id(), "form-1");
    assert_eq!(receipt.attempts, 1);
    assert_eq!(receipt.record.sequence, 1);
    assert_eq!(
        ledger.cumulative_accepted(&donor("alice")).await.unwrap(),
        usd("1000")
    );
}

#[tokio::test]
async fn test_scenarios_through_engine() {
    let (engine, ledger) = simple_engine(&["alice", "bob"]);

    // Exactly at the per-transaction limit
    let receipt = engine.submit(request("alice", "3300")).await.unwrap();
    assert!(receipt.is_accepted());

    // One cent over
    let receipt = engine.submit(request("bob", "3300.01")).await.unwrap();
    assert_eq!(
        receipt.decision.reason(),
        Some(RejectionReason::ExceedsPerTransactionLimit)
    );

    // $3000 then $500 then $300
    engine.submit(request("bob", "3000")).await.unwrap();
    let receipt = engine.submit(request("bob", "500")).await.unwrap();
    let rejection = receipt.decision.rejection().unwrap();
    assert_eq!(rejection.reason, RejectionReason::ExceedsCumulativeLimit);
    assert_eq!(rejection.remaining_capacity, Some(usd("300")));
    assert_eq!(receipt.cumulative_after, Some(usd("3000")));

    let receipt = engine.submit(request("bob", "300")).await.unwrap();
    assert!(receipt.is_accepted());
    assert_eq!(receipt.cumulative_after, Some(usd("3300")));

    // Unverified donor
    let receipt = engine.submit(request("carol", "100")).await.unwrap();
    assert_eq!(receipt.decision.reason(), Some(RejectionReason::KycNotVerified));
    assert_eq!(receipt.cumulative_after, None);

    // Every attempt is recorded, rejections included
    let records = ledger.records().await.unwrap();
    assert_eq!(records.len(), 6);
    assert!(verify_chain(&records).is_ok());
    ledger.verify_totals().unwrap();
}

#[tokio::test]
async fn test_zero_amount_skips_kyc_lookup() {
    let kyc = Arc::new(ScriptedKyc::new(registry_with(&[])));
    let ledger = Arc::new(campaign_ledger::InMemoryLedger::new(usd("3300")));
    let engine = engine(fast_config(), kyc.clone(), ledger.clone());

    let receipt = engine.submit(request("alice", "0")).await.unwrap();

    assert_eq!(
        receipt.decision.reason(),
        Some(RejectionReason::NonPositiveAmount)
    );
    assert_eq!(kyc.calls(), 0);
    assert_eq!(ledger.records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_negative_native_amount_is_input_error() {
    let (engine, ledger) = simple_engine(&["alice"]);

    let result = engine
        .submit(ContributionRequest::native(
            donor("alice"),
            NativeAmount::eth(dec!(-0.5)),
        ))
        .await;

    assert!(matches!(
        result,
        Err(ContributionError::InvalidAmount(MoneyError::InvalidAmount { .. }))
    ));
    assert!(ledger.records().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_usd_amount_is_input_error() {
    let (engine, _) = simple_engine(&["alice"]);
    let eur = Money::parse("10", Currency::Eur).unwrap();

    let result = engine
        .submit(ContributionRequest::usd(donor("alice"), eur))
        .await;
    assert!(matches!(result, Err(ContributionError::Eligibility(_))));
}

/// Cumulative never decreases and moves by exactly the accepted amount
#[tokio::test]
async fn test_cumulative_monotonic() {
    let (engine, ledger) = simple_engine(&["alice"]);
    let alice = donor("alice");
    let amounts = ["100", "0", "2500", "4000", "650", "50", "0.01", "1"];

    let mut previous = Money::ZERO_USD;
    for amount in amounts {
        let receipt = engine.submit(request("alice", amount)).await.unwrap();
        let now = ledger.cumulative_accepted(&alice).await.unwrap();

        let expected = if receipt.is_accepted() {
            previous.checked_add(&usd(amount)).unwrap()
        } else {
            previous
        };
        assert_eq!(now, expected, "after submitting {}", amount);
        assert!(now >= previous);
        previous = now;
    }
    assert_eq!(previous, usd("3300"));
}

/// No sequence of attempts pushes a donor over the cumulative limit
#[tokio::test]
async fn test_cumulative_never_exceeds_limit() {
    let (engine, ledger) = simple_engine(&["alice", "bob", "carol"]);

    let mut seed: u64 = 42;
    for i in 0..60 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let cents = (seed >> 33) % 200_000;
        let who = ["alice", "bob", "carol"][i % 3];
        let amount = Money::usd_cents(cents);

        engine
            .submit(ContributionRequest::usd(donor(who), amount))
            .await
            .unwrap();

        let total = ledger.cumulative_accepted(&donor(who)).await.unwrap();
        assert!(total <= usd("3300"));
    }

    let totals = recompute_totals(&ledger.records().await.unwrap()).unwrap();
    assert!(totals.values().all(|t| *t <= usd("3300")));
}

/// Two concurrent $2,000 attempts: exactly one is accepted
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_double_accept_race() {
    for _ in 0..20 {
        let (engine, ledger) = simple_engine(&["alice"]);

        let (a, b) = tokio::join!(
            engine.submit(request("alice", "2000")),
            engine.submit(request("alice", "2000"))
        );
        let decisions = [a.unwrap().decision, b.unwrap().decision];

        let accepted = decisions.iter().filter(|d| d.is_accepted()).count();
        assert_eq!(accepted, 1);
        assert!(decisions
            .iter()
            .any(|d| d.reason() == Some(RejectionReason::ExceedsCumulativeLimit)));
        assert_eq!(
            ledger.cumulative_accepted(&donor("alice")).await.unwrap(),
            usd("2000")
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_donors_in_parallel() {
    let names: Vec<String> = (0..16).map(|i| format!("donor-{}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let (engine, ledger) = simple_engine(&refs);

    let handles: Vec<_> = names
        .iter()
        .map(|name| {
            let engine = engine.clone();
            let req = request(name, "3300");
            tokio::spawn(async move { engine.submit(req).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_accepted());
    }
    assert_eq!(ledger.stats().await.unwrap().total_raised, usd("52800"));
}

/// Native conversion truncates to cents
#[tokio::test]
async fn test_native_conversion_rounds_toward_zero() {
    let (engine, _) = simple_engine(&["alice", "bob"]);

    let receipt = engine
        .submit(ContributionRequest::native(
            donor("alice"),
            NativeAmount::eth(dec!(1.100000000000000001)),
        ))
        .await
        .unwrap();
    assert!(receipt.is_accepted());
    let conversion = receipt.conversion.unwrap();
    assert_eq!(conversion.amount_usd, usd("3300"));
    assert_eq!(conversion.price_usd, dec!(3000));
    assert_eq!(
        receipt.record.amount_native,
        Some(NativeAmount::eth(dec!(1.100000000000000001)))
    );

    let receipt = engine
        .submit(ContributionRequest::native(
            donor("bob"),
            NativeAmount::eth(dec!(0.333333333333333333)),
        ))
        .await
        .unwrap();
    assert_eq!(receipt.record.amount_usd, usd("999.99"));
}

#[tokio::test]
async fn test_stale_price_is_lookup_unavailable() {
    let oracle = Arc::new(FixedPriceOracle::new());
    oracle
        .set_price_at(
            TradingPair::eth_usd(),
            dec!(3000),
            chrono::Utc::now() - chrono::Duration::hours(2),
        )
        .unwrap();
    let ledger = Arc::new(campaign_ledger::InMemoryLedger::new(usd("3300")));
    let engine = campaign_engine::ContributionEngine::new(
        fast_config(),
        registry_with(&["alice"]),
        ledger.clone(),
        oracle,
    )
    .unwrap();

    let result = engine
        .submit(ContributionRequest::native(donor("alice"), NativeAmount::eth(dec!(1))))
        .await;
    assert!(matches!(
        result,
        Err(ContributionError::LookupUnavailable {
            collaborator: Collaborator::PriceOracle,
            ..
        })
    ));
    assert!(ledger.records().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_paused_engine_refuses() {
    let (engine, ledger) = simple_engine(&["alice"]);

    engine.pause();
    assert!(engine.is_paused());
    let result = engine.submit(request("alice", "10")).await;
    assert!(matches!(result, Err(ContributionError::Paused)));
    assert!(ledger.records().await.unwrap().is_empty());

    engine.resume();
    assert!(engine.submit(request("alice", "10")).await.unwrap().is_accepted());
}

#[tokio::test]
async fn test_preview_does_not_record() {
    let (engine, ledger) = simple_engine(&["alice"]);
    engine.submit(request("alice", "3000")).await.unwrap();

    let decision = engine
        .preview(&donor("alice"), &ContributionAmount::Usd(usd("500")))
        .await
        .unwrap();
    assert_eq!(decision.reason(), Some(RejectionReason::ExceedsCumulativeLimit));

    let decision = engine
        .preview(&donor("alice"), &ContributionAmount::Usd(usd("300")))
        .await
        .unwrap();
    assert_eq!(decision, Decision::Accepted);

    assert_eq!(ledger.records().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_contributor_info() {
    let (engine, _) = simple_engine(&["alice"]);
    engine.submit(request("alice", "3000")).await.unwrap();
    engine.submit(request("alice", "500")).await.unwrap();

    let info = engine.contributor_info(&donor("alice")).await.unwrap();
    assert!(info.kyc_verified);
    assert!(info.has_contributed);
    assert_eq!(info.cumulative, usd("3000"));
    assert_eq!(info.remaining_capacity, usd("300"));
    assert_eq!(info.max_contribution_now, usd("300"));
    assert_eq!(info.history.len(), 2);

    let stranger = engine.contributor_info(&donor("nobody")).await.unwrap();
    assert!(!stranger.kyc_verified);
    assert!(!stranger.has_contributed);
    assert_eq!(stranger.remaining_capacity, usd("3300"));
}

#[tokio::test]
async fn test_campaign_stats() {
    let (engine, _) = simple_engine(&["alice", "bob"]);
    engine.submit(request("alice", "1000")).await.unwrap();
    engine.submit(request("bob", "500")).await.unwrap();
    engine.submit(request("carol", "500")).await.unwrap();

    let stats = engine.campaign_stats().await.unwrap();
    assert_eq!(stats.total_raised, usd("1500"));
    assert_eq!(stats.unique_contributors, 2);
    assert_eq!(stats.accepted_count, 2);
    assert_eq!(stats.rejected_count, 1);
    assert_eq!(stats.average_contribution, usd("750"));
    assert_eq!(stats.eth_price_usd, Some(dec!(3000)));
    assert!(!stats.paused);
}

#[tokio::test]
async fn test_max_contribution_native() {
    let (engine, _) = simple_engine(&[]);
    let max = engine.max_contribution_native(Currency::Eth).await.unwrap();
    assert_eq!(max, NativeAmount::eth(dec!(1.1)));

    let result = engine.max_contribution_native(Currency::Btc).await;
    assert!(matches!(
        result,
        Err(ContributionError::LookupUnavailable { .. })
    ));
}

#[tokio::test]
async fn test_journal_backed_engine_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("ledger.jsonl");

    {
        let ledger = Arc::new(JournalLedger::open(&path, usd("3300"))?);
        let engine = engine(fast_config(), registry_with(&["alice"]), ledger);
        engine.submit(request("alice", "3000")).await?;
    }

    let ledger = Arc::new(JournalLedger::open(&path, usd("3300"))?);
    let engine = engine(fast_config(), registry_with(&["alice"]), ledger);
    let receipt = engine.submit(request("alice", "500")).await?;

    assert_eq!(
        receipt.decision.rejection().and_then(|r| r.remaining_capacity),
        Some(usd("300"))
    );
    Ok(())
}
