// ==========================================
// End-to-End Dossier Flow - Integration Tests
// ==========================================
// Full lifecycles exercised through the edit session and the API layer:
// client feedback, replacement, re-assembly and the send/delete tail.
// ==========================================


use std::collections::HashMap;

use chantier_dossier::api::DossierApi;
use chantier_dossier::domain::types::{DossierStatus, InclusionStatus};
use chantier_dossier::engine::assembly::CreateDossierRequest;
use chantier_dossier::engine::batch::{EntryAddition, MutationBatch};
use chantier_dossier::engine::session::DossierEditSession;
use chantier_dossier::engine::error::EngineError;

use test_helpers::{build_harness, parse_rendered, TestHarness};

async fn create(h: &TestHarness, sheet_ids: &[&str]) -> chantier_dossier::DossierWithEntries {
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

#[tokio::test]
async fn test_client_rejection_and_replacement_flow() {
    let h = build_harness();

    // create [S1, S2]; the client rejects S1 and asks for a new proposal
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = created.entries[0].entry_id.clone();

    let mut session = DossierEditSession::open(&created);
    session.set_status(&e1, InclusionStatus::NewProposal).unwrap();
    let batch = session.into_batch().unwrap();
    let outcome = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap();
    assert_eq!(
        outcome.dossier.dossier.status,
        DossierStatus::PartiallyRejected
    );

    // a later session picks S3 as the replacement
    let loaded = h.engine.get_dossier(&dossier_id).unwrap();
    let mut session = DossierEditSession::open(&loaded);
    session.pick_replacement(&e1, "S3").unwrap();
    let target = session.dossier_id().to_string();
    assert_eq!(target, dossier_id);
    let batch = session.into_batch().unwrap();
    let outcome = h.engine.mutate_dossier(&target, batch).await.unwrap();

    let entries = &outcome.dossier.entries;
    let sheet_ids: Vec<&str> = entries.iter().map(|e| e.sheet_id.as_str()).collect();
    assert_eq!(sheet_ids, vec!["S3", "S2"]);
    let s3 = &entries[0];
    assert_eq!(s3.replaces_sheet_id.as_deref(), Some("S1"));
    assert_eq!(s3.sheet_version, 2);

    // the rendered artifact reflects the supersession
    let doc = parse_rendered(&h.engine.fetch_artifact(&dossier_id).await.unwrap());
    assert_eq!(doc.dossier_version, 3);
    assert_eq!(doc.sheets[0].sheet_id, "S3");
    assert_eq!(doc.sheets[0].sheet_version, 2);
}

#[tokio::test]
async fn test_incremental_assembly_keeps_dense_order() {
    let h = build_harness();
    let created = create(&h, &["S1"]).await;
    let dossier_id = created.dossier.dossier_id.clone();

    let mut session = DossierEditSession::open(&created);
    session.add_sheet(EntryAddition::new("S2")).unwrap();
    session.add_sheet(EntryAddition::new("S3")).unwrap();
    let batch = session.into_batch().unwrap();
    let outcome = h.engine.mutate_dossier(&dossier_id, batch).await.unwrap();

    let entries = &outcome.dossier.entries;
    assert_eq!(entries.len(), 3);
    let orders: Vec<i32> = entries.iter().map(|e| e.order_no).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(entries[0].sheet_id, "S1");
}

#[tokio::test]
async fn test_cancelled_session_has_no_effect() {
    let h = build_harness();
    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();
    let e1 = created.entries[0].entry_id.clone();

    let mut session = DossierEditSession::open(&created);
    session.set_status(&e1, InclusionStatus::Approved).unwrap();
    session.remove_entry(&created.entries[1].entry_id).unwrap();
    session.cancel();

    let reloaded = h.engine.get_dossier(&dossier_id).unwrap();
    assert_eq!(reloaded.dossier.version, 1);
    assert_eq!(reloaded.entries.len(), 2);
    assert_eq!(
        reloaded.entry_by_id(&e1).unwrap().inclusion_status,
        InclusionStatus::Draft
    );
}

#[tokio::test]
async fn test_full_lifecycle_send_approve_delete() {
    let h = build_harness();
    let api = DossierApi::new(h.engine.clone());

    let created = create(&h, &["S1", "S2"]).await;
    let dossier_id = created.dossier.dossier_id.clone();

    // send to the client
    let sent = api.mark_sent(&dossier_id).unwrap();
    assert_eq!(sent.status, "SENT");

    // client approves everything
    let mut batch = MutationBatch::default();
    for entry in &created.entries {
        batch
            .status_changes
            .insert(entry.entry_id.clone(), InclusionStatus::Approved);
    }
    let response = api.mutate_dossier(&dossier_id, batch).await.unwrap();
    assert!(!response.regeneration_pending);
    assert_eq!(response.dossier.dossier.status, "APPROVED");
    assert_eq!(response.dossier.dossier.version, 2);

    // listing reflects the approved dossier
    let listed = api.list_dossiers("P1").unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, "APPROVED");
    assert_eq!(listed[0].entry_count, 2);

    // deletion cascades; preferences written by the approval batch stay
    api.delete_dossier(&dossier_id).unwrap();
    assert!(api.list_dossiers("P1").unwrap().is_empty());
    match h.engine.get_dossier(&dossier_id).unwrap_err() {
        EngineError::DossierNotFound { .. } => {}
        other => panic!("expected DossierNotFound, got {:?}", other),
    }
    assert!(h
        .preference_repo
        .find("P1", "S1")
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_binary_loss_recovery_via_api() {
    let h = build_harness();
    let api = DossierApi::new(h.engine.clone());
    let created = create(&h, &["S1", "S4"]).await;
    let dossier_id = created.dossier.dossier_id.clone();

    h.storage.evict(created.dossier.artifact_url.as_deref().unwrap());

    // download succeeds anyway; the binary is rebuilt on the fly
    let doc = parse_rendered(&api.fetch_artifact(&dossier_id).await.unwrap());
    assert_eq!(doc.sheets.len(), 2);
    assert_eq!(doc.dossier_version, 1);

    // explicit regeneration also works and updates the reference
    let url = api.regenerate_artifact(&dossier_id).await.unwrap();
    let detail = api.get_dossier(&dossier_id).unwrap();
    assert_eq!(detail.dossier.artifact_url.as_deref(), Some(url.as_str()));
}
