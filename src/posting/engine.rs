//! Ledger Posting Engine
//!
//! Resolves accounts for one business event, derives its entries, checks the
//! balance invariant and hands the batch to the store for the atomic commit.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::{
    Bilti, ChartOfAccounts, Daybook, DaybookStatus, GoodsDelivery, OperationContext, Party,
    SourceDocument,
};
use crate::store::{CommitOutcome, LedgerStore};

use super::balance::{totals, validate_batch};
use super::commands::{LedgerRequest, PostingOutcome, PostingStatus, SkippedLineItem};
use super::error::PostingError;
use super::rules::{self, Derivation, PostingStamp};

/// Engine for one posting call
pub struct LedgerPostingEngine {
    store: Arc<dyn LedgerStore>,
    chart: ChartOfAccounts,
}

impl LedgerPostingEngine {
    pub fn new(store: Arc<dyn LedgerStore>, chart: ChartOfAccounts) -> Self {
        Self { store, chart }
    }

    /// Dispatch an RPC request to its posting operation
    pub async fn process(
        &self,
        request: &LedgerRequest,
        context: &OperationContext,
    ) -> Result<PostingOutcome, PostingError> {
        match request {
            LedgerRequest::ProcessApprovedDaybook(daybook) => {
                self.post_approved_daybook(daybook, context).await
            }
            LedgerRequest::PostBiltiLedgerEntries(bilti) => {
                self.post_finalized_bilti(bilti, context).await
            }
            LedgerRequest::PostGoodsDeliveryLedgerEntries(delivery) => {
                self.post_goods_delivery(delivery, context).await
            }
        }
    }

    // =========================================================================
    // Daybook
    // =========================================================================

    /// Post the cash transactions of an approved daybook
    pub async fn post_approved_daybook(
        &self,
        daybook: &Daybook,
        context: &OperationContext,
    ) -> Result<PostingOutcome, PostingError> {
        let source = SourceDocument::Daybook(daybook.id.clone());

        if daybook.status != DaybookStatus::Approved {
            return Ok(self.not_eligible(source, format!("status is {}", daybook.status)));
        }
        if daybook.processed_by_function {
            return Ok(self.not_eligible(source, "already processed"));
        }

        let stamp = PostingStamp::new(context.actor());
        let derivation = rules::daybook_entries(daybook, &self.chart, &stamp);

        self.commit(source, derivation, context).await
    }

    // =========================================================================
    // Bilti
    // =========================================================================

    /// Post the freight of a finalized bilti
    pub async fn post_finalized_bilti(
        &self,
        bilti: &Bilti,
        context: &OperationContext,
    ) -> Result<PostingOutcome, PostingError> {
        let source = SourceDocument::Bilti(bilti.id.clone());

        if bilti.ledger_processed {
            return Ok(self.not_eligible(source, "already processed"));
        }

        // Both parties must resolve regardless of pay mode
        let consignor = self.require_party(&bilti.consignor_id).await?;
        let consignee = self.require_party(&bilti.consignee_id).await?;
        let consignor_account = require_ledger_account(&consignor)?;
        let consignee_account = require_ledger_account(&consignee)?;

        let stamp = PostingStamp::new(context.actor());
        let derivation = rules::bilti_entries(
            bilti,
            consignor_account,
            consignee_account,
            &self.chart,
            &stamp,
        );

        self.commit(source, derivation, context).await
    }

    // =========================================================================
    // Goods delivery
    // =========================================================================

    /// Post rebates and discounts granted on a completed goods delivery
    pub async fn post_goods_delivery(
        &self,
        delivery: &GoodsDelivery,
        context: &OperationContext,
    ) -> Result<PostingOutcome, PostingError> {
        let source = SourceDocument::GoodsDelivery(delivery.id.clone());

        if delivery.ledger_processed {
            return Ok(self.not_eligible(source, "already processed"));
        }

        let stamp = PostingStamp::new(context.actor());
        let mut derivation = Derivation::default();
        let mut seen = HashSet::new();

        for line in &delivery.delivered_biltis {
            // A second line for the same bilti would collide on posting keys
            if !seen.insert(line.bilti_id.as_str()) {
                derivation.skipped.push(rules::skip_delivery_line(
                    delivery,
                    line,
                    format!("duplicate line for bilti {}", line.bilti_id),
                ));
                continue;
            }

            let bilti = match self.store.find_bilti(&line.bilti_id).await? {
                Some(bilti) => bilti,
                None => {
                    derivation.skipped.push(rules::skip_delivery_line(
                        delivery,
                        line,
                        format!("bilti {} not found", line.bilti_id),
                    ));
                    continue;
                }
            };

            let consignee = self.store.find_party(&bilti.consignee_id).await?;
            let consignee_account = match consignee.as_ref().and_then(Party::ledger_account) {
                Some(account) => account,
                None => {
                    derivation.skipped.push(rules::skip_delivery_line(
                        delivery,
                        line,
                        format!("consignee {} has no ledger account", bilti.consignee_id),
                    ));
                    continue;
                }
            };

            let line_derivation = rules::delivery_line_entries(
                delivery,
                line,
                &bilti,
                consignee_account,
                &self.chart,
                &stamp,
            );
            derivation.entries.extend(line_derivation.entries);
            derivation.skipped.extend(line_derivation.skipped);
        }

        let vacuous = delivery.delivered_biltis.is_empty();
        let mut outcome = self.commit(source, derivation, context).await?;
        if vacuous && outcome.status == PostingStatus::Posted {
            outcome.status = PostingStatus::VacuouslyComplete;
        }
        Ok(outcome)
    }

    // =========================================================================
    // Shared steps
    // =========================================================================

    async fn require_party(&self, party_id: &str) -> Result<Party, PostingError> {
        self.store
            .find_party(party_id)
            .await?
            .ok_or_else(|| PostingError::not_found("party", party_id))
    }

    fn not_eligible(&self, source: SourceDocument, reason: impl Into<String>) -> PostingOutcome {
        let outcome = PostingOutcome::not_eligible(source, reason);
        tracing::info!(reason = %outcome.message(), "Posting skipped");
        outcome
    }

    /// Validate the batch, then insert it and close the gate atomically
    async fn commit(
        &self,
        source: SourceDocument,
        derivation: Derivation,
        context: &OperationContext,
    ) -> Result<PostingOutcome, PostingError> {
        let Derivation { entries, skipped } = derivation;

        for item in &skipped {
            log_skipped(&source, item, context);
        }

        validate_batch(&entries)?;

        match self.store.commit_posting(&source, &entries).await? {
            CommitOutcome::AlreadyProcessed => Ok(self.not_eligible(source, "already processed")),
            CommitOutcome::Committed { inserted } => {
                let (debits, _) = totals(&entries);
                if inserted < entries.len() {
                    tracing::warn!(
                        source = %source,
                        expected = entries.len(),
                        inserted = inserted,
                        "Some entries were already present; duplicates ignored"
                    );
                }
                tracing::info!(
                    source = %source,
                    entries = entries.len(),
                    skipped = skipped.len(),
                    amount = %debits,
                    correlation_id = ?context.correlation_id,
                    "Ledger posting committed"
                );

                Ok(PostingOutcome {
                    source,
                    status: PostingStatus::Posted,
                    entries,
                    skipped,
                })
            }
        }
    }
}

fn require_ledger_account(party: &Party) -> Result<&str, PostingError> {
    party
        .ledger_account()
        .ok_or_else(|| PostingError::not_found("party ledger account", party.id.as_str()))
}

fn log_skipped(source: &SourceDocument, item: &SkippedLineItem, context: &OperationContext) {
    tracing::warn!(
        source = %source,
        reference = %item.reference,
        reason = %item.reason,
        correlation_id = ?context.correlation_id,
        "Line item skipped"
    );
}
