//! Posting requests and outcomes

use serde::{Deserialize, Serialize};

use crate::domain::{Bilti, Daybook, GoodsDelivery, LedgerEntry, SourceDocument};

/// Discriminated RPC request, one variant per business event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum LedgerRequest {
    #[serde(rename = "PROCESS_APPROVED_DAYBOOK")]
    ProcessApprovedDaybook(Daybook),
    #[serde(rename = "POST_BILTI_LEDGER_ENTRIES")]
    PostBiltiLedgerEntries(Bilti),
    #[serde(rename = "POST_GOODS_DELIVERY_LEDGER_ENTRIES")]
    PostGoodsDeliveryLedgerEntries(GoodsDelivery),
}

impl LedgerRequest {
    pub fn source(&self) -> SourceDocument {
        match self {
            LedgerRequest::ProcessApprovedDaybook(d) => SourceDocument::Daybook(d.id.clone()),
            LedgerRequest::PostBiltiLedgerEntries(b) => SourceDocument::Bilti(b.id.clone()),
            LedgerRequest::PostGoodsDeliveryLedgerEntries(g) => {
                SourceDocument::GoodsDelivery(g.id.clone())
            }
        }
    }
}

/// A line left out of the batch without failing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedLineItem {
    /// Reference number the line would have been posted under
    pub reference: String,
    pub reason: String,
}

impl SkippedLineItem {
    pub fn new(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingStatus {
    /// Entries committed and gate closed
    Posted,
    /// Gate closed with nothing to post (empty goods delivery)
    VacuouslyComplete,
    /// Source not eligible; nothing written
    NotEligible(String),
}

/// Result of one posting call
#[derive(Debug, Clone)]
pub struct PostingOutcome {
    pub source: SourceDocument,
    pub status: PostingStatus,
    /// Entries written by this call
    pub entries: Vec<LedgerEntry>,
    pub skipped: Vec<SkippedLineItem>,
}

impl PostingOutcome {
    pub fn not_eligible(source: SourceDocument, reason: impl Into<String>) -> Self {
        Self {
            source,
            status: PostingStatus::NotEligible(reason.into()),
            entries: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Terse message returned to the caller
    pub fn message(&self) -> String {
        match &self.status {
            PostingStatus::Posted if self.skipped.is_empty() => format!(
                "Posted {} ledger entries for {}",
                self.entries.len(),
                self.source
            ),
            PostingStatus::Posted => format!(
                "Posted {} ledger entries for {} ({} line items skipped)",
                self.entries.len(),
                self.source,
                self.skipped.len()
            ),
            PostingStatus::VacuouslyComplete => {
                format!("Nothing to post for {}; marked as processed", self.source)
            }
            PostingStatus::NotEligible(reason) => {
                format!("{} not eligible for posting: {}", self.source, reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_deserializes_by_type_tag() {
        let request: LedgerRequest = serde_json::from_value(json!({
            "type": "POST_GOODS_DELIVERY_LEDGER_ENTRIES",
            "payload": {
                "id": "GD1",
                "branchId": "B1",
                "miti": "2024-05-01",
                "deliveredBiltis": []
            }
        }))
        .unwrap();

        assert_eq!(
            request.source(),
            SourceDocument::GoodsDelivery("GD1".to_string())
        );
    }

    #[test]
    fn test_unknown_request_type_is_rejected() {
        let result: Result<LedgerRequest, _> = serde_json::from_value(json!({
            "type": "POST_MANIFEST",
            "payload": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_outcome_messages() {
        let source = SourceDocument::Bilti("BL1".to_string());
        let outcome = PostingOutcome::not_eligible(source.clone(), "already processed");
        assert!(outcome.entries.is_empty());
        assert!(outcome.message().contains("already processed"));

        let outcome = PostingOutcome {
            source,
            status: PostingStatus::Posted,
            entries: Vec::new(),
            skipped: vec![SkippedLineItem::new("BLT-BL1", "unrecognized pay mode")],
        };
        assert!(outcome.message().contains("1 line items skipped"));
    }
}
