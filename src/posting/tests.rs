//! Engine tests
//!
//! Drive the posting engine end to end against the in-memory store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::domain::{
        Bilti, ChartOfAccounts, Daybook, DaybookStatus, DaybookTransaction, DeliveredBilti,
        DomainError, GoodsDelivery, OperationContext, Party, PayMode, SourceDocument,
    };
    use crate::posting::balance::totals;
    use crate::posting::{LedgerPostingEngine, LedgerRequest, PostingError, PostingStatus};
    use crate::store::InMemoryLedgerStore;

    fn setup() -> (Arc<InMemoryLedgerStore>, LedgerPostingEngine) {
        let store = Arc::new(InMemoryLedgerStore::new());
        store.insert_party(party("P1", Some("L1")));
        store.insert_party(party("P2", Some("L5")));
        store.insert_party(party("P3", None));

        let engine = LedgerPostingEngine::new(store.clone(), ChartOfAccounts::default());
        (store, engine)
    }

    fn party(id: &str, ledger: Option<&str>) -> Party {
        Party {
            id: id.to_string(),
            name: format!("Party {}", id),
            assigned_ledger_id: ledger.map(str::to_string),
        }
    }

    fn context() -> OperationContext {
        OperationContext::new().with_request_user("accountant-1")
    }

    fn bilti(id: &str, pay_mode: PayMode, consignor: &str, consignee: &str) -> Bilti {
        Bilti {
            id: id.to_string(),
            bilti_no: None,
            branch_id: "B1".to_string(),
            miti: NaiveDate::from_ymd_opt(2024, 4, 20).unwrap(),
            nepali_miti: Some("2081-01-08".to_string()),
            consignor_id: consignor.to_string(),
            consignee_id: consignee.to_string(),
            total_amount: dec!(5000),
            pay_mode,
            ledger_processed: false,
        }
    }

    fn daybook(id: &str, transactions: Vec<DaybookTransaction>) -> Daybook {
        Daybook {
            id: id.to_string(),
            branch_id: "B1".to_string(),
            english_miti: NaiveDate::from_ymd_opt(2024, 4, 21).unwrap(),
            nepali_miti: None,
            status: DaybookStatus::Approved,
            processed_by_function: false,
            transactions,
        }
    }

    fn cash_tx(id: &str, transaction_type: &str, amount: Decimal, ledger: Option<&str>) -> DaybookTransaction {
        DaybookTransaction {
            id: id.to_string(),
            transaction_type: transaction_type.to_string(),
            amount,
            ledger_account_id: ledger.map(str::to_string),
            party_id: None,
            description: None,
            nepali_miti: None,
        }
    }

    fn delivery(id: &str, lines: Vec<DeliveredBilti>) -> GoodsDelivery {
        GoodsDelivery {
            id: id.to_string(),
            branch_id: "B2".to_string(),
            miti: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            nepali_miti: None,
            delivered_biltis: lines,
            ledger_processed: false,
        }
    }

    fn line(bilti_id: &str, rebate: Decimal, discount: Decimal) -> DeliveredBilti {
        DeliveredBilti {
            bilti_id: bilti_id.to_string(),
            rebate_amount: Some(rebate),
            rebate_reason: Some("Late delivery".to_string()),
            discount_amount: Some(discount),
            discount_reason: None,
        }
    }

    fn shape(store: &InMemoryLedgerStore) -> Vec<(String, Decimal, Decimal)> {
        store
            .entries()
            .into_iter()
            .map(|e| (e.account_id, e.debit, e.credit))
            .collect()
    }

    // =========================================================================
    // Bilti
    // =========================================================================

    #[tokio::test]
    async fn test_paid_bilti_debits_consignor() {
        let (store, engine) = setup();
        let b = bilti("BL1", PayMode::Paid, "P1", "P2");
        store.insert_bilti(b.clone());

        let outcome = engine.post_finalized_bilti(&b, &context()).await.unwrap();

        assert_eq!(outcome.status, PostingStatus::Posted);
        assert_eq!(
            shape(&store),
            vec![
                ("L1".to_string(), dec!(5000), dec!(0)),
                ("ACC_FREIGHT_INCOME".to_string(), dec!(0), dec!(5000)),
            ]
        );
        assert_eq!(store.gate(&SourceDocument::Bilti("BL1".to_string())), Some(true));

        let entry = &store.entries()[0];
        assert_eq!(entry.reference_no, "BLT-BL1");
        assert_eq!(entry.created_by, "accountant-1");
        assert_eq!(entry.nepali_miti.as_deref(), Some("2081-01-08"));
    }

    #[tokio::test]
    async fn test_to_pay_bilti_debits_consignee() {
        let (store, engine) = setup();
        let b = bilti("BL2", PayMode::ToPay, "P1", "P2");
        store.insert_bilti(b.clone());

        engine.post_finalized_bilti(&b, &context()).await.unwrap();

        assert_eq!(store.entries()[0].account_id, "L5");
    }

    #[tokio::test]
    async fn test_missing_consignor_is_fatal() {
        let (store, engine) = setup();
        let b = bilti("BL3", PayMode::ToPay, "NOPE", "P2");
        store.insert_bilti(b.clone());

        let err = engine.post_finalized_bilti(&b, &context()).await.unwrap_err();

        assert!(matches!(
            err,
            PostingError::ReferenceNotFound { kind: "party", ref id } if id == "NOPE"
        ));
        assert!(store.entries().is_empty());
        assert_eq!(store.gate(&SourceDocument::Bilti("BL3".to_string())), Some(false));
    }

    #[tokio::test]
    async fn test_party_without_ledger_account_is_fatal() {
        let (store, engine) = setup();
        let b = bilti("BL4", PayMode::Paid, "P3", "P2");
        store.insert_bilti(b.clone());

        let err = engine.post_finalized_bilti(&b, &context()).await.unwrap_err();

        assert!(matches!(
            err,
            PostingError::ReferenceNotFound { kind: "party ledger account", .. }
        ));
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_pay_mode_closes_gate_without_entries() {
        let (store, engine) = setup();
        let b = bilti("BL5", PayMode::Other("Cheque".to_string()), "P1", "P2");
        store.insert_bilti(b.clone());

        let outcome = engine.post_finalized_bilti(&b, &context()).await.unwrap();

        assert!(outcome.entries.is_empty());
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(store.gate(&SourceDocument::Bilti("BL5".to_string())), Some(true));
    }

    // =========================================================================
    // Idempotency
    // =========================================================================

    #[tokio::test]
    async fn test_flagged_payload_is_not_eligible() {
        let (store, engine) = setup();
        let mut b = bilti("BL6", PayMode::Paid, "P1", "P2");
        b.ledger_processed = true;
        store.insert_bilti(b.clone());

        let outcome = engine.post_finalized_bilti(&b, &context()).await.unwrap();

        assert!(matches!(outcome.status, PostingStatus::NotEligible(_)));
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_replayed_payload_posts_nothing_twice() {
        let (store, engine) = setup();
        let b = bilti("BL7", PayMode::Paid, "P1", "P2");
        store.insert_bilti(b.clone());

        // Same stale payload delivered twice, as a retried webhook would
        engine.post_finalized_bilti(&b, &context()).await.unwrap();
        let second = engine.post_finalized_bilti(&b, &context()).await.unwrap();

        assert!(matches!(second.status, PostingStatus::NotEligible(_)));
        assert!(second.entries.is_empty());
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_gate_open_and_retry_succeeds() {
        let (store, engine) = setup();
        let b = bilti("BL8", PayMode::Paid, "P1", "P2");
        store.insert_bilti(b.clone());
        store.fail_next_commit();

        let err = engine.post_finalized_bilti(&b, &context()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(store.entries().is_empty());
        assert_eq!(store.gate(&SourceDocument::Bilti("BL8".to_string())), Some(false));

        let outcome = engine.post_finalized_bilti(&b, &context()).await.unwrap();
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_processed_daybook_posts_nothing() {
        let (store, engine) = setup();
        store.register_source(SourceDocument::Daybook("D5".to_string()), false);
        let mut d = daybook("D5", vec![cash_tx("T1", "Cash In", dec!(80), Some("L1"))]);

        let first = engine.post_approved_daybook(&d, &context()).await.unwrap();
        assert_eq!(first.entries.len(), 2);

        // Stale payload: flag still false, store gate already closed
        let replay = engine.post_approved_daybook(&d, &context()).await.unwrap();
        assert!(matches!(replay.status, PostingStatus::NotEligible(_)));
        assert!(replay.entries.is_empty());

        d.processed_by_function = true;
        let flagged = engine.post_approved_daybook(&d, &context()).await.unwrap();
        assert!(matches!(flagged.status, PostingStatus::NotEligible(_)));
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_processed_goods_delivery_posts_nothing() {
        let (store, engine) = setup();
        store.insert_bilti(bilti("BL1", PayMode::ToPay, "P1", "P2"));
        store.register_source(SourceDocument::GoodsDelivery("GD5".to_string()), false);
        let mut g = delivery("GD5", vec![line("BL1", dec!(60), dec!(0))]);

        engine.post_goods_delivery(&g, &context()).await.unwrap();
        let replay = engine.post_goods_delivery(&g, &context()).await.unwrap();
        assert!(matches!(replay.status, PostingStatus::NotEligible(_)));
        assert!(replay.entries.is_empty());

        g.ledger_processed = true;
        let flagged = engine.post_goods_delivery(&g, &context()).await.unwrap();
        assert!(matches!(flagged.status, PostingStatus::NotEligible(_)));
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_posts_land_one_batch() {
        let (store, engine) = setup();
        let b = bilti("BL10", PayMode::Paid, "P1", "P2");
        store.insert_bilti(b.clone());
        let ctx = context();

        let (first, second) = tokio::join!(
            engine.post_finalized_bilti(&b, &ctx),
            engine.post_finalized_bilti(&b, &ctx)
        );
        let outcomes = [first.unwrap(), second.unwrap()];

        let posted = outcomes
            .iter()
            .filter(|o| o.status == PostingStatus::Posted)
            .count();
        assert_eq!(posted, 1);
        assert_eq!(outcomes.iter().map(|o| o.entries.len()).sum::<usize>(), 2);
        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_source_document_is_reference_not_found() {
        let (_store, engine) = setup();
        let d = daybook("D404", vec![cash_tx("T1", "Cash In", dec!(10), None)]);

        let err = engine.post_approved_daybook(&d, &context()).await.unwrap_err();

        assert!(matches!(
            err,
            PostingError::ReferenceNotFound { kind: "daybook", .. }
        ));
    }

    // =========================================================================
    // Daybook
    // =========================================================================

    #[tokio::test]
    async fn test_daybook_cash_in_scenario() {
        let (store, engine) = setup();
        store.register_source(SourceDocument::Daybook("D1".to_string()), false);
        let d = daybook("D1", vec![cash_tx("T1", "Cash In (Other)", dec!(200), Some("L9"))]);

        engine.post_approved_daybook(&d, &context()).await.unwrap();

        assert_eq!(
            shape(&store),
            vec![
                ("BRANCH_CASH_B1".to_string(), dec!(200), dec!(0)),
                ("L9".to_string(), dec!(0), dec!(200)),
            ]
        );
        assert_eq!(store.gate(&SourceDocument::Daybook("D1".to_string())), Some(true));
        assert_eq!(store.entries()[0].reference_no, "DB-D1-T1");
    }

    #[tokio::test]
    async fn test_daybook_requires_approval() {
        let (store, engine) = setup();
        store.register_source(SourceDocument::Daybook("D2".to_string()), false);
        let mut d = daybook("D2", vec![cash_tx("T1", "Cash In", dec!(200), None)]);
        d.status = DaybookStatus::Pending;

        let outcome = engine.post_approved_daybook(&d, &context()).await.unwrap();

        assert!(matches!(outcome.status, PostingStatus::NotEligible(_)));
        assert_eq!(store.gate(&SourceDocument::Daybook("D2".to_string())), Some(false));
    }

    #[tokio::test]
    async fn test_rejected_or_unknown_status_is_not_eligible() {
        let (store, engine) = setup();
        store.register_source(SourceDocument::Daybook("D6".to_string()), false);

        for status in [DaybookStatus::Rejected, DaybookStatus::from("Submitted".to_string())] {
            let mut d = daybook("D6", vec![cash_tx("T1", "Cash In", dec!(200), None)]);
            d.status = status;

            let outcome = engine.post_approved_daybook(&d, &context()).await.unwrap();
            assert!(matches!(outcome.status, PostingStatus::NotEligible(_)));
        }

        assert!(store.entries().is_empty());
        assert_eq!(store.gate(&SourceDocument::Daybook("D6".to_string())), Some(false));
    }

    #[tokio::test]
    async fn test_repeated_daybook_transaction_is_skipped() {
        let (store, engine) = setup();
        store.register_source(SourceDocument::Daybook("D7".to_string()), false);
        let d = daybook(
            "D7",
            vec![
                cash_tx("T1", "Cash In", dec!(40), Some("L1")),
                cash_tx("T1", "Cash In", dec!(40), Some("L1")),
            ],
        );

        let outcome = engine.post_approved_daybook(&d, &context()).await.unwrap();

        assert_eq!(outcome.status, PostingStatus::Posted);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(store.gate(&SourceDocument::Daybook("D7".to_string())), Some(true));
    }

    #[tokio::test]
    async fn test_daybook_mixed_batch_balances() {
        let (store, engine) = setup();
        store.register_source(SourceDocument::Daybook("D3".to_string()), false);
        let d = daybook(
            "D3",
            vec![
                cash_tx("T1", "Cash In", dec!(1500), Some("L1")),
                cash_tx("T2", "Cash Out (Fuel)", dec!(420.75), Some("EXP_FUEL")),
                cash_tx("T3", "Adjustment/Correction", dec!(-50), None),
                cash_tx("T4", "Opening Balance", dec!(999), None),
            ],
        );

        let outcome = engine.post_approved_daybook(&d, &context()).await.unwrap();

        assert_eq!(outcome.entries.len(), 6);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reference, "DB-D3-T4");

        let (debits, credits) = totals(&store.entries());
        assert_eq!(debits, credits);
        assert!(store
            .entries()
            .iter()
            .all(|e| e.debit >= Decimal::ZERO && e.credit >= Decimal::ZERO));
    }

    // =========================================================================
    // Goods delivery
    // =========================================================================

    #[tokio::test]
    async fn test_goods_delivery_rebate_scenario() {
        let (store, engine) = setup();
        store.insert_bilti(bilti("BL1", PayMode::ToPay, "P1", "P2"));
        store.register_source(SourceDocument::GoodsDelivery("GD1".to_string()), false);
        let g = delivery("GD1", vec![line("BL1", dec!(100), dec!(0))]);

        let outcome = engine.post_goods_delivery(&g, &context()).await.unwrap();

        assert_eq!(outcome.status, PostingStatus::Posted);
        assert_eq!(
            shape(&store),
            vec![
                ("L5".to_string(), dec!(0), dec!(100)),
                ("ACC_REBATE_EXPENSE".to_string(), dec!(100), dec!(0)),
            ]
        );
        let entries = store.entries();
        assert_eq!(entries[0].reference_no, "GD-GD1-BLT-BL1");
        assert!(entries[0].description.contains("Late delivery"));
        assert_eq!(
            store.gate(&SourceDocument::GoodsDelivery("GD1".to_string())),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_empty_goods_delivery_completes_vacuously() {
        let (store, engine) = setup();
        store.register_source(SourceDocument::GoodsDelivery("GD2".to_string()), false);
        let g = delivery("GD2", Vec::new());

        let outcome = engine.post_goods_delivery(&g, &context()).await.unwrap();

        assert_eq!(outcome.status, PostingStatus::VacuouslyComplete);
        assert!(store.entries().is_empty());
        assert_eq!(
            store.gate(&SourceDocument::GoodsDelivery("GD2".to_string())),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_unresolved_delivery_lines_are_skipped() {
        let (store, engine) = setup();
        store.insert_bilti(bilti("BL1", PayMode::ToPay, "P1", "P2"));
        store.insert_bilti(bilti("BL9", PayMode::ToPay, "P1", "P3"));
        store.register_source(SourceDocument::GoodsDelivery("GD3".to_string()), false);
        let g = delivery(
            "GD3",
            vec![
                line("MISSING", dec!(10), dec!(0)),
                line("BL9", dec!(10), dec!(0)),
                line("BL1", dec!(25), dec!(15)),
            ],
        );

        let outcome = engine.post_goods_delivery(&g, &context()).await.unwrap();

        assert_eq!(outcome.status, PostingStatus::Posted);
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(outcome.skipped[0].reference, "GD-GD3-BLT-MISSING");
        assert_eq!(outcome.entries.len(), 4);
        assert_eq!(totals(&outcome.entries), (dec!(40), dec!(40)));
    }

    #[tokio::test]
    async fn test_repeated_delivery_line_is_skipped() {
        let (store, engine) = setup();
        store.insert_bilti(bilti("BL1", PayMode::ToPay, "P1", "P2"));
        store.register_source(SourceDocument::GoodsDelivery("GD4".to_string()), false);
        let g = delivery(
            "GD4",
            vec![line("BL1", dec!(10), dec!(0)), line("BL1", dec!(10), dec!(0))],
        );

        let outcome = engine.post_goods_delivery(&g, &context()).await.unwrap();

        assert_eq!(outcome.status, PostingStatus::Posted);
        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].reason.contains("duplicate line"));
        assert_eq!(
            store.gate(&SourceDocument::GoodsDelivery("GD4".to_string())),
            Some(true)
        );
    }

    // =========================================================================
    // Dispatch and invariants
    // =========================================================================

    #[tokio::test]
    async fn test_process_dispatches_on_request_type() {
        let (store, engine) = setup();
        let b = bilti("BL1", PayMode::Due, "P1", "P2");
        store.insert_bilti(b.clone());

        let outcome = engine
            .process(&LedgerRequest::PostBiltiLedgerEntries(b), &context())
            .await
            .unwrap();

        assert_eq!(outcome.source, SourceDocument::Bilti("BL1".to_string()));
        assert_eq!(outcome.entries[0].account_id, "L5");
    }

    #[tokio::test]
    async fn test_configured_chart_is_used() {
        let store = Arc::new(InMemoryLedgerStore::new());
        store.insert_party(party("P1", Some("L1")));
        store.insert_party(party("P2", Some("L2")));
        let b = bilti("BL1", PayMode::Paid, "P1", "P2");
        store.insert_bilti(b.clone());

        let chart = ChartOfAccounts {
            freight_income: "4100-FREIGHT".to_string(),
            ..ChartOfAccounts::default()
        };
        let engine = LedgerPostingEngine::new(store.clone(), chart);

        engine.post_finalized_bilti(&b, &context()).await.unwrap();

        assert_eq!(store.entries()[1].account_id, "4100-FREIGHT");
    }

    #[test]
    fn test_invariant_errors_are_not_retryable() {
        let err = PostingError::from(DomainError::unbalanced(dec!(1), dec!(2)));
        assert!(!err.is_retryable());
    }
}
