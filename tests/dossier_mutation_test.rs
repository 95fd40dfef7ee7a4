// ==========================================
// Dossier Mutation - Integration Tests
// ==========================================
// The batched mutation surface: removals, status/field updates,
// replacements, additions, order re-pack, whole-batch rejection and the
// preference write-through.
// ==========================================


use std::collections::HashMap;

use chantier_dossier::domain::dossier::DossierWithEntries;
use chantier_dossier::domain::types::{DossierStatus, InclusionStatus};
use chantier_dossier::engine::assembly::CreateDossierRequest;
use chantier_dossier::engine::batch::{EntryAddition, EntryFieldPatch, MutationBatch};
use chantier_dossier::engine::error::EngineError;

use test_helpers::{build_harness, TestHarness};

async fn create(h: &TestHarness, sheet_ids: &[&str]) -> DossierWithEntries {
    h.engine
        .create_dossier(CreateDossierRequest {
            project_id: "P1".to_string(),
            name: "Dossier lot 2".to_string(),
            sheet_ids: sheet_ids.iter().map(|s| s.to_string()).collect(),
            overrides: HashMap::new(),
            include_toc: None,
        })
        .await
        .expect("creation should succeed")
}

fn entry_id_of(dossier: &DossierWithEntries, sheet_id: &str) -> String {
    dossier
        .entries
        .iter()
        .find(|e| e.sheet_id == sheet_id)
        .unwrap_or_else(|| panic!("no entry for {}", sheet_id))
        .entry_id
        .clone()
}

#[tokio::test]
async fn test_status_and_field_updates() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let e1 = entry_id_of(&created, "S1");

    let mut batch = MutationBatch::default();
    batch.status_changes.insert(e1.clone(), InclusionStatus::Approved);
    batch.field_patches.insert(
        e1.clone(),
        EntryFieldPatch {
            subcontractor_id: Some("SUB-3".to_string()),
            reference_code: None,
            remarks: Some("validé sur site".to_string()),
        },
    );

    let outcome = h
        .engine
        .mutate_dossier(&created.dossier.dossier_id, batch)
        .await
        .unwrap();

    let updated = outcome.dossier;
    assert_eq!(updated.dossier.version, 2);
    let entry = updated.entry_by_id(&e1).unwrap();
    assert_eq!(entry.inclusion_status, InclusionStatus::Approved);
    assert_eq!(entry.subcontractor_id.as_deref(), Some("SUB-3"));
    assert_eq!(entry.remarks.as_deref(), Some("validé sur site"));
    // untouched fields survive
    assert_eq!(entry.sheet_version, 1);
}

#[tokio::test]
async fn test_removals_repack_order_densely() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2", "S3", "S4"]).await;
    let e2 = entry_id_of(&created, "S2");
    let e4 = entry_id_of(&created, "S4");

    let batch = MutationBatch {
        removals: vec![e2, e4],
        ..Default::default()
    };
    let outcome = h
        .engine
        .mutate_dossier(&created.dossier.dossier_id, batch)
        .await
        .unwrap();

    let entries = &outcome.dossier.entries;
    assert_eq!(entries.len(), 2);
    let sheet_ids: Vec<&str> = entries.iter().map(|e| e.sheet_id.as_str()).collect();
    assert_eq!(sheet_ids, vec!["S1", "S3"]);
    let orders: Vec<i32> = entries.iter().map(|e| e.order_no).collect();
    assert_eq!(orders, vec![0, 1]);
}

#[tokio::test]
async fn test_additions_append_and_seed_from_preferences() {
    let h = build_harness();
    let created = create(&h, &["S1"]).await;

    let now = chrono::Utc::now().naive_utc();
    h.preference_repo
        .set_field(
            "P1",
            "S3",
            chantier_dossier::domain::types::PreferenceField::SubcontractorId,
            Some("SUB-7"),
            now,
        )
        .unwrap();

    let batch = MutationBatch {
        additions: vec![EntryAddition::new("S2"), EntryAddition::new("S3")],
        ..Default::default()
    };
    let outcome = h
        .engine
        .mutate_dossier(&created.dossier.dossier_id, batch)
        .await
        .unwrap();

    let entries = &outcome.dossier.entries;
    assert_eq!(entries.len(), 3);
    let orders: Vec<i32> = entries.iter().map(|e| e.order_no).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(entries[1].sheet_id, "S2");
    assert_eq!(entries[2].sheet_id, "S3");
    assert_eq!(entries[2].subcontractor_id.as_deref(), Some("SUB-7"));
    assert_eq!(entries[2].sheet_version, 1);
}

#[tokio::test]
async fn test_replacement_supersedes_entry() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = entry_id_of(&created, "S1");

    // flag S1 for replacement, then commit the pick in one batch
    let mut batch = MutationBatch::default();
    batch
        .status_changes
        .insert(e1.clone(), InclusionStatus::NewProposal);
    batch.replacements.insert(e1.clone(), "S3".to_string());

    let outcome = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap();
    let entries = &outcome.dossier.entries;

    // active entry count unchanged, S1 retired
    assert_eq!(entries.len(), 2);
    assert!(!entries.iter().any(|e| e.sheet_id == "S1"));
    let successor = entries.iter().find(|e| e.sheet_id == "S3").unwrap();
    assert!(successor.is_supersession());
    assert_eq!(successor.replaces_sheet_id.as_deref(), Some("S1"));
    assert_eq!(successor.sheet_version, 2);
    assert_eq!(successor.inclusion_status, InclusionStatus::Draft);
    // inherits the replaced entry's position
    assert_eq!(successor.order_no, 0);
    // the old entry id is gone
    assert!(outcome.dossier.entry_by_id(&e1).is_none());
}

#[tokio::test]
async fn test_replacement_requires_new_proposal() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = entry_id_of(&created, "S1");

    let mut batch = MutationBatch::default();
    batch.replacements.insert(e1.clone(), "S3".to_string());

    let err = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap_err();
    match err {
        EngineError::InvalidReplacementState { entry_id, status } => {
            assert_eq!(entry_id, e1);
            assert_eq!(status, InclusionStatus::Draft);
        }
        other => panic!("expected InvalidReplacementState, got {:?}", other),
    }

    // whole batch rejected: dossier unchanged
    let reloaded = h.engine.get_dossier(&dossier_id).unwrap();
    assert_eq!(reloaded.dossier.version, 1);
    assert!(reloaded.contains_sheet("S1"));
}

#[tokio::test]
async fn test_duplicate_sheet_rejects_whole_batch() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = entry_id_of(&created, "S1");

    // valid status change + invalid addition in the same batch
    let mut batch = MutationBatch::default();
    batch
        .status_changes
        .insert(e1.clone(), InclusionStatus::Approved);
    batch.additions.push(EntryAddition::new("S2"));

    let err = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap_err();
    match err {
        EngineError::DuplicateSheet { sheet_id } => assert_eq!(sheet_id, "S2"),
        other => panic!("expected DuplicateSheet, got {:?}", other),
    }

    // the otherwise-valid status change must not have been applied
    let reloaded = h.engine.get_dossier(&dossier_id).unwrap();
    assert_eq!(reloaded.dossier.version, 1);
    assert_eq!(
        reloaded.entry_by_id(&e1).unwrap().inclusion_status,
        InclusionStatus::Draft
    );
}

#[tokio::test]
async fn test_removal_frees_sheet_for_reuse_in_same_batch() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = entry_id_of(&created, "S1");
    let e2 = entry_id_of(&created, "S2");

    // remove S2, flag S1, replace S1 with S2 - all in one call
    let mut batch = MutationBatch::default();
    batch.removals.push(e2);
    batch
        .status_changes
        .insert(e1.clone(), InclusionStatus::NewProposal);
    batch.replacements.insert(e1, "S2".to_string());

    let outcome = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap();
    let entries = &outcome.dossier.entries;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sheet_id, "S2");
    assert_eq!(entries[0].replaces_sheet_id.as_deref(), Some("S1"));
    assert_eq!(entries[0].order_no, 0);
}

#[tokio::test]
async fn test_edit_of_removed_entry_rejects_batch() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = entry_id_of(&created, "S1");

    let mut batch = MutationBatch::default();
    batch.removals.push(e1.clone());
    batch
        .status_changes
        .insert(e1.clone(), InclusionStatus::Approved);

    match h.engine.mutate_dossier(&dossier_id, batch).await.unwrap_err() {
        EngineError::UnknownEntry { entry_id } => assert_eq!(entry_id, e1),
        other => panic!("expected UnknownEntry, got {:?}", other),
    }
    assert_eq!(h.engine.get_dossier(&dossier_id).unwrap().entries.len(), 2);
}

#[tokio::test]
async fn test_replacement_with_unknown_sheet_rejects_batch() {
    let h = build_harness();
    let created = create(&h, &["S1"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = entry_id_of(&created, "S1");

    let mut batch = MutationBatch::default();
    batch
        .status_changes
        .insert(e1.clone(), InclusionStatus::NewProposal);
    batch.replacements.insert(e1, "NOPE".to_string());

    match h.engine.mutate_dossier(&dossier_id, batch).await.unwrap_err() {
        EngineError::UnknownSheet { sheet_id } => assert_eq!(sheet_id, "NOPE"),
        other => panic!("expected UnknownSheet, got {:?}", other),
    }
    let reloaded = h.engine.get_dossier(&dossier_id).unwrap();
    assert!(reloaded.contains_sheet("S1"));
}

#[tokio::test]
async fn test_mutation_writes_preferences_through() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let e1 = entry_id_of(&created, "S1");

    let mut batch = MutationBatch::default();
    batch.field_patches.insert(
        e1,
        EntryFieldPatch {
            subcontractor_id: Some("SUB-9".to_string()),
            reference_code: Some("FT-BET-99".to_string()),
            remarks: None,
        },
    );
    h.engine
        .mutate_dossier(&created.dossier.dossier_id, batch)
        .await
        .unwrap();

    // the latest choices become the project-wide defaults
    let prefs = h.preference_repo.get_for_project("P1").unwrap();
    let s1 = prefs.get("S1").expect("preference row for S1");
    assert_eq!(s1.subcontractor_id.as_deref(), Some("SUB-9"));
    assert_eq!(s1.reference_code.as_deref(), Some("FT-BET-99"));
    // untouched entries do not get a preference row
    assert!(!prefs.contains_key("S2"));
}

#[tokio::test]
async fn test_status_derivation_across_batches() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = entry_id_of(&created, "S1");
    let e2 = entry_id_of(&created, "S2");
    assert_eq!(created.dossier.status, DossierStatus::Draft);

    // one rejection flags the whole dossier
    let mut batch = MutationBatch::default();
    batch
        .status_changes
        .insert(e1.clone(), InclusionStatus::ToBeReplaced);
    batch
        .status_changes
        .insert(e2.clone(), InclusionStatus::Approved);
    let outcome = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap();
    assert_eq!(
        outcome.dossier.dossier.status,
        DossierStatus::PartiallyRejected
    );

    // full approval
    let mut batch = MutationBatch::default();
    batch.status_changes.insert(e1, InclusionStatus::Approved);
    let outcome = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap();
    assert_eq!(outcome.dossier.dossier.status, DossierStatus::Approved);
    assert_eq!(outcome.dossier.dossier.version, 3);
}

#[tokio::test]
async fn test_mark_sent_then_mutation_rederives() {
    let h = build_harness();
    let created = create(&h, &["S1"]).await;
    let dossier_id = created.dossier.dossier_id.clone();

    let sent = h.engine.mark_sent(&dossier_id).unwrap();
    assert_eq!(sent.status, DossierStatus::Sent);

    let e1 = entry_id_of(&created, "S1");
    let mut batch = MutationBatch::default();
    batch.status_changes.insert(e1, InclusionStatus::NewProposal);
    let outcome = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap();
    assert_eq!(
        outcome.dossier.dossier.status,
        DossierStatus::PartiallyRejected
    );
}

#[tokio::test]
async fn test_mutation_of_missing_dossier_fails() {
    let h = build_harness();
    let batch = MutationBatch {
        removals: vec!["E1".to_string()],
        ..Default::default()
    };
    match h.engine.mutate_dossier("ghost", batch).await.unwrap_err() {
        EngineError::DossierNotFound { dossier_id } => assert_eq!(dossier_id, "ghost"),
        other => panic!("expected DossierNotFound, got {:?}", other),
    }
}
