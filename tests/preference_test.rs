// ==========================================
// Sheet Preferences - Integration Tests
// ==========================================
// The preference store is project-wide default state: created lazily,
// updated in place, cleared field by field, and fully independent of
// dossier lifecycles.
// ==========================================


use std::collections::HashMap;
use std::sync::Arc;

use chantier_dossier::api::{ApiError, PreferenceApi};
use chantier_dossier::domain::catalog::Subcontractor;
use chantier_dossier::domain::types::PreferenceField;
use chantier_dossier::engine::assembly::CreateDossierRequest;
use chantier_dossier::external::directory::InMemoryDirectory;

use test_helpers::{build_harness, TestHarness};

fn preference_api(h: &TestHarness) -> PreferenceApi {
    let directory = Arc::new(InMemoryDirectory::new(vec![
        Subcontractor {
            subcontractor_id: "SUB-1".to_string(),
            name: "Béton Services SARL".to_string(),
        },
        Subcontractor {
            subcontractor_id: "SUB-2".to_string(),
            name: "Étanchéité Dupont".to_string(),
        },
    ]));
    PreferenceApi::new(h.preference_repo.clone(), directory)
}

#[test]
fn test_lazy_create_then_update_in_place() {
    let h = build_harness();
    let api = preference_api(&h);

    assert!(api.get_preferences("P1").unwrap().is_empty());

    api.set_preference("P1", "S1", PreferenceField::SubcontractorId, Some("SUB-1"))
        .unwrap();
    let prefs = api.get_preferences("P1").unwrap();
    let s1 = prefs.get("S1").expect("row created lazily");
    assert_eq!(s1.subcontractor_id.as_deref(), Some("SUB-1"));
    assert_eq!(s1.reference_code, None);

    // second write updates the same row
    api.set_preference("P1", "S1", PreferenceField::SubcontractorId, Some("SUB-2"))
        .unwrap();
    api.set_preference("P1", "S1", PreferenceField::ReferenceCode, Some("FT-BET-02"))
        .unwrap();
    let prefs = api.get_preferences("P1").unwrap();
    assert_eq!(prefs.len(), 1);
    let s1 = prefs.get("S1").unwrap();
    assert_eq!(s1.subcontractor_id.as_deref(), Some("SUB-2"));
    assert_eq!(s1.reference_code.as_deref(), Some("FT-BET-02"));
}

#[test]
fn test_empty_value_clears_field() {
    let h = build_harness();
    let api = preference_api(&h);

    api.set_preference("P1", "S1", PreferenceField::Remarks, Some("version NF"))
        .unwrap();
    api.set_preference("P1", "S1", PreferenceField::Remarks, Some("   "))
        .unwrap();

    let prefs = api.get_preferences("P1").unwrap();
    let s1 = prefs.get("S1").unwrap();
    assert_eq!(s1.remarks, None);
}

#[test]
fn test_preferences_are_scoped_per_project() {
    let h = build_harness();
    let api = preference_api(&h);

    api.set_preference("P1", "S1", PreferenceField::SubcontractorId, Some("SUB-1"))
        .unwrap();
    api.set_preference("P2", "S1", PreferenceField::SubcontractorId, Some("SUB-2"))
        .unwrap();

    let p1 = api.get_preferences("P1").unwrap();
    let p2 = api.get_preferences("P2").unwrap();
    assert_eq!(p1.get("S1").unwrap().subcontractor_id.as_deref(), Some("SUB-1"));
    assert_eq!(p2.get("S1").unwrap().subcontractor_id.as_deref(), Some("SUB-2"));
}

#[test]
fn test_blank_identifiers_rejected() {
    let h = build_harness();
    let api = preference_api(&h);

    match api
        .set_preference("", "S1", PreferenceField::Remarks, Some("x"))
        .unwrap_err()
    {
        ApiError::InvalidInput(_) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
    match api.get_preferences("  ").unwrap_err() {
        ApiError::InvalidInput(_) => {}
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

#[tokio::test]
async fn test_preferences_survive_dossier_deletion() {
    let h = build_harness();
    let api = preference_api(&h);

    api.set_preference("P1", "S1", PreferenceField::ReferenceCode, Some("FT-BET-09"))
        .unwrap();

    let created = h
        .engine
        .create_dossier(CreateDossierRequest {
            project_id: "P1".to_string(),
            name: "Dossier lot 2".to_string(),
            sheet_ids: vec!["S1".to_string()],
            overrides: HashMap::new(),
            include_toc: None,
        })
        .await
        .unwrap();
    h.engine.delete_dossier(&created.dossier.dossier_id).unwrap();

    let prefs = api.get_preferences("P1").unwrap();
    assert_eq!(
        prefs.get("S1").unwrap().reference_code.as_deref(),
        Some("FT-BET-09")
    );
}

#[tokio::test]
async fn test_directory_listing_maps_to_dtos() {
    let h = build_harness();
    let api = preference_api(&h);

    let active = api.list_active_subcontractors().await.unwrap();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].subcontractor_id, "SUB-1");
    assert_eq!(active[1].name, "Étanchéité Dupont");
}
