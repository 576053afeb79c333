//! Concurrent evidence retrieval with integrity verification.

use tribunal_arbitration::{DisputeRecord, Evidence, Party};

use crate::capability::EvidenceSource;
use crate::error::WorkflowError;
use crate::stage::WorkflowStage;

/// Verified evidence for both parties.
#[derive(Debug, Clone)]
pub struct EvidencePair {
    pub a: Evidence,
    pub b: Evidence,
}

/// Fetch both parties' evidence together and verify each against the
/// dispute's commitments and party addresses.
///
/// Both requests are issued before either is awaited; the first failure
/// ends the fetch. Any integrity or party mismatch is fatal.
pub async fn fetch_verified_evidence(
    source: &dyn EvidenceSource,
    dispute: &DisputeRecord,
) -> Result<EvidencePair, WorkflowError> {
    let commitment = |party: Party| {
        party
            .commitment_in(dispute)
            .ok_or(WorkflowError::MissingEvidenceCommitment {
                dispute_id: dispute.id,
                party,
            })
    };
    let commitment_a = commitment(Party::A)?;
    let commitment_b = commitment(Party::B)?;

    let (doc_a, doc_b) = tokio::try_join!(
        source.fetch(&dispute.id, Party::A),
        source.fetch(&dispute.id, Party::B),
    )?;

    let verify = WorkflowError::arbitration(WorkflowStage::FetchEvidence);
    let a = Evidence::verify(Party::A, doc_a, &commitment_a, &dispute.party_a);
    let b = Evidence::verify(Party::B, doc_b, &commitment_b, &dispute.party_b);
    let (a, b) = match (a, b) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!(dispute_id = %dispute.id, "evidence rejected: {e}");
            return Err(verify(e));
        }
    };

    tracing::info!(
        dispute_id = %dispute.id,
        evidence_hash_a = %a.content_hash(),
        evidence_hash_b = %b.content_hash(),
        evidence_len_a = a.content().len(),
        evidence_len_b = b.content().len(),
        "evidence verified"
    );
    Ok(EvidencePair { a, b })
}
