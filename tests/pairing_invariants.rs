//! Pairing Invariant Tests
//!
//! Cover the pairing workflows end to end:
//! - Symmetric companion references after every link
//! - Deterministic rejection with stable codes and no partial state
//! - Idempotent unpairing
//! - Replacement rules

use std::sync::Arc;

use uuid::Uuid;

use gaugepair::config::EngineConfig;
use gaugepair::gauge::{
    EquipmentType, GaugeDraft, GaugeStatus, GaugeSuffix, Ownership, SpecSnapshot,
};
use gaugepair::history::{HistoryAction, HistorySink, MemoryHistorySink};
use gaugepair::idents::SequentialAllocator;
use gaugepair::pair::ValidationCode;
use gaugepair::service::{PairingService, UnpairOutcome};
use gaugepair::store::{CompanionRepository, PairStore};

fn engine() -> (CompanionRepository, PairingService) {
    let store = Arc::new(PairStore::new(Arc::new(MemoryHistorySink::new())));
    let repo = CompanionRepository::new(store);
    let pairing = PairingService::new(
        repo.clone(),
        Arc::new(SequentialAllocator::new()),
        EngineConfig::default(),
    );
    (repo, pairing)
}

fn thread_draft() -> GaugeDraft {
    GaugeDraft {
        equipment_type: EquipmentType::ThreadPlug,
        category: "TPG".to_string(),
        specification: SpecSnapshot::thread(".250-20", "2A", "UN", "plug"),
        status: GaugeStatus::Available,
        sealed: false,
        location: "CRIB-1".to_string(),
        ownership: Ownership::Company,
    }
}

// =============================================================================
// Creation
// =============================================================================

/// A freshly created set has mutual companion references.
#[test]
fn test_created_set_is_symmetric() {
    let (repo, pairing) = engine();
    let (go, no_go) = pairing
        .create_gauge_set(thread_draft(), thread_draft(), Uuid::new_v4())
        .unwrap();

    let go_row = repo.get_gauge(go.id).unwrap();
    let no_go_row = repo.get_gauge(no_go.id).unwrap();
    assert_eq!(go_row.companion, Some(no_go_row.id));
    assert_eq!(no_go_row.companion, Some(go_row.id));

    let entries = repo.store().history().entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, HistoryAction::CreatedTogether);
    assert!(entries[0].involves(go.id));
    assert!(entries[0].involves(no_go.id));
}

/// Spec mismatch rejects with SPEC_MISMATCH and persists nothing.
#[test]
fn test_spec_mismatch_leaves_both_unpaired() {
    let (repo, pairing) = engine();
    let mut other = thread_draft();
    other.specification.thread_size = Some(".375-16".to_string());

    let err = pairing
        .create_gauge_set(thread_draft(), other, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.validation_code(), Some(ValidationCode::SpecMismatch));
    assert_eq!(repo.store().row_count().unwrap(), 0);
}

/// Ownership mismatch rejects before any write.
#[test]
fn test_customer_mismatch_rejected() {
    let (repo, pairing) = engine();
    let mut go = thread_draft();
    let mut no_go = thread_draft();
    go.ownership = Ownership::Customer {
        customer_id: Uuid::new_v4(),
    };
    no_go.ownership = Ownership::Customer {
        customer_id: Uuid::new_v4(),
    };

    let err = pairing
        .create_gauge_set(go, no_go, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(
        err.validation_code(),
        Some(ValidationCode::OwnershipMismatch)
    );
    assert_eq!(repo.store().row_count().unwrap(), 0);
}

// =============================================================================
// Pairing spares
// =============================================================================

/// Matching spares pair and both references are symmetric afterward.
#[test]
fn test_pair_spares_end_to_end() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let go = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();
    let no_go = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::NoGo), user)
        .unwrap();

    pairing
        .pair_spare_gauges(go.id, no_go.id, user, "BENCH-7")
        .unwrap();

    let go_row = repo.get_gauge(go.id).unwrap();
    let no_go_row = repo.get_gauge(no_go.id).unwrap();
    assert_eq!(go_row.companion, Some(no_go.id));
    assert_eq!(no_go_row.companion, Some(go.id));
    assert_eq!(go_row.location, "BENCH-7");
    assert_eq!(no_go_row.location, "BENCH-7");
}

/// Two NPT gauges can never pair.
#[test]
fn test_npt_spares_never_pair() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let mut draft = thread_draft();
    draft.equipment_type = EquipmentType::NptPlug;
    draft.specification = SpecSnapshot::thread("1/2-14", "", "NPT", "plug");

    let a = pairing.create_spare_gauge(draft.clone(), None, user).unwrap();
    let b = pairing.create_spare_gauge(draft, None, user).unwrap();

    let err = pairing
        .pair_spare_gauges(a.id, b.id, user, "BENCH-1")
        .unwrap_err();
    assert_eq!(
        err.validation_code(),
        Some(ValidationCode::NptCompanionForbidden)
    );
    assert!(repo.get_gauge(a.id).unwrap().is_spare());
    assert!(repo.get_gauge(b.id).unwrap().is_spare());
}

/// Suffix duplicates are rejected with both values in the metadata.
#[test]
fn test_duplicate_suffix_rejected_with_metadata() {
    let (_, pairing) = engine();
    let user = Uuid::new_v4();
    let a = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();
    let b = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::Go), user)
        .unwrap();

    let err = pairing
        .pair_spare_gauges(a.id, b.id, user, "BENCH-1")
        .unwrap_err();
    assert_eq!(err.validation_code(), Some(ValidationCode::SuffixInvalid));
}

// =============================================================================
// Unpairing
// =============================================================================

/// After unpairing, neither former member references the other, and a
/// second unpair is a no-op success.
#[test]
fn test_unpair_is_idempotent() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let (go, no_go) = pairing
        .create_gauge_set(thread_draft(), thread_draft(), user)
        .unwrap();

    let outcome = pairing.unpair_set(no_go.id, user, None).unwrap();
    assert_eq!(
        outcome,
        UnpairOutcome::Unpaired {
            gauge: no_go.id,
            companion: go.id
        }
    );

    assert!(repo.get_gauge(go.id).unwrap().is_spare());
    assert!(repo.get_gauge(no_go.id).unwrap().is_spare());

    assert_eq!(
        pairing.unpair_set(no_go.id, user, None).unwrap(),
        UnpairOutcome::NotPaired
    );
    assert_eq!(
        pairing.unpair_set(go.id, user, None).unwrap(),
        UnpairOutcome::NotPaired
    );

    let entries = repo.store().history().entries().unwrap();
    let unlinked: Vec<_> = entries
        .iter()
        .filter(|e| e.action == HistoryAction::Unlinked)
        .collect();
    assert_eq!(unlinked.len(), 1);
}

// =============================================================================
// Replacement
// =============================================================================

/// Replacement relinks symmetrically and frees the old companion.
#[test]
fn test_replace_relinks_and_frees_old_companion() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let (go, no_go) = pairing
        .create_gauge_set(thread_draft(), thread_draft(), user)
        .unwrap();
    let replacement = pairing
        .create_spare_gauge(thread_draft(), Some(GaugeSuffix::NoGo), user)
        .unwrap();

    pairing
        .replace_companion(go.id, replacement.id, user, Some("wear ring"))
        .unwrap();

    assert_eq!(repo.get_gauge(go.id).unwrap().companion, Some(replacement.id));
    assert_eq!(
        repo.get_gauge(replacement.id).unwrap().companion,
        Some(go.id)
    );
    assert!(repo.get_gauge(no_go.id).unwrap().is_spare());
}

/// A paired gauge cannot stand in as a replacement.
#[test]
fn test_replacement_must_be_a_spare() {
    let (_, pairing) = engine();
    let user = Uuid::new_v4();
    let (go, _) = pairing
        .create_gauge_set(thread_draft(), thread_draft(), user)
        .unwrap();
    let (other_go, _) = pairing
        .create_gauge_set(thread_draft(), thread_draft(), user)
        .unwrap();

    let err = pairing
        .replace_companion(go.id, other_go.id, user, None)
        .unwrap_err();
    assert_eq!(err.validation_code(), Some(ValidationCode::NotASpare));
}

// =============================================================================
// Checkout decision
// =============================================================================

/// A fully available pair may check out; a blocked pair names the
/// blocking member.
#[test]
fn test_checkout_decision_reads_both_members() {
    let (repo, pairing) = engine();
    let user = Uuid::new_v4();
    let (go, no_go) = pairing
        .create_gauge_set(thread_draft(), thread_draft(), user)
        .unwrap();

    assert!(pairing.can_checkout_set(go.id).unwrap().allowed);

    let mut txn = repo.store().begin();
    txn.lock_rows(&[go.id]).unwrap();
    repo.update_status(go.id, GaugeStatus::OutForCalibration, &mut txn)
        .unwrap();
    txn.commit().unwrap();

    let decision = pairing.can_checkout_set(no_go.id).unwrap();
    assert!(!decision.allowed);
    let reason = decision.reason.unwrap();
    assert!(reason.contains("out_for_calibration"));
}
