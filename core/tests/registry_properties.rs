use std::fs;
use std::path::Path;
use std::sync::Arc;

use intel_core::Dispatcher;
use intel_core::InferenceOptions;
use intel_core::IntelligenceTypeRegistry;
use intel_core::OutcomeStatus;
use intel_core::PortalBridge;
use intel_core::PortalType;
use intel_core::Priority;
use intel_core::SharedHandler;
use intel_core::TypeFilter;
use intel_core::config::DispatchConfig;
use intel_core::naming::infer_type_name;
use pretty_assertions::assert_eq;
use serde_json::Value as JsonValue;
use serde_json::json;
use tempfile::TempDir;
use tempfile::tempdir;

fn write_json(dir: &Path, name: &str, value: &JsonValue) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create evidence dir");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("encode")).expect("write evidence");
}

fn evidence_dir(files: &[(&str, JsonValue)]) -> TempDir {
    let dir = tempdir().expect("tempdir");
    for (name, value) in files {
        write_json(dir.path(), name, value);
    }
    dir
}

fn echo_handler() -> SharedHandler {
    Arc::new(
        |payload: &JsonValue, _: &InferenceOptions| -> anyhow::Result<JsonValue> {
            Ok(json!({"echo": payload.clone()}))
        },
    )
}

#[test]
fn rediscovery_is_idempotent() {
    let dir = evidence_dir(&[
        ("a.json", json!({"company_intelligence": {"name": "Acme"}, "skill_gaps": [{"skill": "go"}]})),
        ("nested/b.json", json!({"salary_data": {"median": "$90,000"}})),
    ]);
    let registry = IntelligenceTypeRegistry::new();

    let first = registry.discover_from_directory(dir.path());
    let before: Vec<_> = registry.list_types(&TypeFilter::default());
    let second = registry.discover_from_directory(dir.path());
    let after: Vec<_> = registry.list_types(&TypeFilter::default());

    assert_eq!(first.files_scanned, 2);
    assert_eq!(second.files_scanned, 2);
    assert_eq!(second.new_types, 0);
    assert_eq!(before.len(), after.len());
    for (old, new) in before.iter().zip(&after) {
        assert_eq!(old.source_keys, new.source_keys);
        assert_eq!(old.evidence_files, new.evidence_files);
        assert_eq!(old.schema, new.schema);
    }
    assert_eq!(registry.discovery_log().len(), 2);
}

#[test]
fn schema_merge_is_additive_and_last_write_wins_per_field() {
    let dir = evidence_dir(&[
        ("1.json", json!({"market_intelligence": {"sector": "fintech", "growth": "12%"}})),
        ("2.json", json!({"market_intelligence": {"size": 4, "growth": "$3B"}})),
    ]);
    let registry = IntelligenceTypeRegistry::new();
    registry.discover_from_directory(dir.path());

    let info = registry.get_type_info("market_intelligence").expect("type");
    assert_eq!(
        serde_json::to_value(&info.schema).expect("schema json"),
        json!({"sector": "string", "size": "integer", "growth": "currency"})
    );
    assert_eq!(
        info.evidence_files.into_iter().collect::<Vec<_>>(),
        vec!["1.json", "2.json"]
    );
}

#[test]
fn synonym_keys_consolidate_into_one_type() {
    let dir = evidence_dir(&[
        ("1.json", json!({"career_progression": {"next": "lead"}})),
        ("2.json", json!({"career_path": {"steps": 3}})),
    ]);
    let registry = IntelligenceTypeRegistry::new();
    registry.discover_from_directory(dir.path());
    let info = registry.get_type_info("career_path").expect("type");
    assert_eq!(info.category, "Career Development");
    assert_eq!(
        info.source_keys.into_iter().collect::<Vec<_>>(),
        vec!["career_path", "career_progression"]
    );
}

#[test]
fn first_sighting_in_file_order_fixes_the_category() {
    let candidates = json!({"candidate_matches": [{"score": 0.8}]});
    let jobs = json!({"job_match": {"score": 0.5}});

    let dir = evidence_dir(&[("a.json", candidates.clone()), ("b.json", jobs.clone())]);
    let registry = IntelligenceTypeRegistry::new();
    registry.discover_from_directory(dir.path());
    let info = registry.get_type_info("job_match").expect("type");
    assert_eq!(info.category, "Profile & Candidate Data");
    assert_eq!(
        info.evidence_files.into_iter().collect::<Vec<_>>(),
        vec!["a.json", "b.json"]
    );

    let dir = evidence_dir(&[("a.json", jobs), ("b.json", candidates)]);
    let registry = IntelligenceTypeRegistry::new();
    registry.discover_from_directory(dir.path());
    let info = registry.get_type_info("job_match").expect("type");
    assert_eq!(info.category, "Job Matching & Compatibility");
    assert_eq!(
        info.source_keys.into_iter().collect::<Vec<_>>(),
        vec!["candidate_matches", "job_match"]
    );
}

#[test]
fn handlers_registered_after_discovery_keep_the_discovered_entry() {
    let dir = evidence_dir(&[("e.json", json!({"skill_gaps": {"missing": ["go"]}}))]);
    let registry = IntelligenceTypeRegistry::new();
    registry.discover_from_directory(dir.path());
    intel_core::handlers::register_builtin_handlers(&registry);

    let info = registry.get_type_info("skill_gap_analysis").expect("type");
    assert!(info.is_implemented);
    assert_eq!(info.category, "Skills & Capabilities");
    assert_eq!(
        info.evidence_files.into_iter().collect::<Vec<_>>(),
        vec!["e.json"]
    );
    assert_eq!(
        serde_json::to_value(&info.schema).expect("schema json"),
        json!({"missing": "array"})
    );
}

#[test]
fn whitespace_keys_are_still_named() {
    let dir = evidence_dir(&[("w.json", json!({"   ": {"x": 1}, "Job  Match": {"y": 2}}))]);
    let registry = IntelligenceTypeRegistry::new();
    let stats = registry.discover_from_directory(dir.path());
    assert_eq!(stats.types_discovered, 2);
    assert!(registry.contains("___"));
    assert!(registry.contains("job__match"));
}

#[test]
fn naming_is_deterministic() {
    for _ in 0..3 {
        assert_eq!(
            infer_type_name("web_company_intelligence").as_deref(),
            Some("company_intelligence")
        );
        assert_eq!(infer_type_name("foo_analysis").as_deref(), Some("foo_analysis"));
    }
}

#[test]
fn dispatch_selects_exactly_one_state() {
    let dir = evidence_dir(&[(
        "evidence.json",
        json!({"company_intelligence": {"name": "Acme", "revenue": "$5M"}}),
    )]);
    let registry = Arc::new(IntelligenceTypeRegistry::new());
    registry.discover_from_directory(dir.path());
    registry.register_handler("career_path", echo_handler(), Priority::High, "Career");
    let dispatcher = Dispatcher::new(Arc::clone(&registry), DispatchConfig::default());
    let options = InferenceOptions::new();

    let success = dispatcher.run_inference(&json!({"x": 1}), "career_path", &options);
    assert_eq!(success.to_value(), json!({"echo": {"x": 1}}));

    let stub = dispatcher.run_inference(&json!({}), "company_intelligence", &options);
    assert_eq!(stub.status(), OutcomeStatus::NotImplemented);
    let stub = stub.to_value();
    assert_eq!(stub["status"], json!("not_implemented"));
    assert!(stub["schema"].as_object().is_some_and(|schema| !schema.is_empty()));

    let unknown = dispatcher
        .run_inference(&json!({}), "totally_unknown_xyz", &options)
        .to_value();
    assert_eq!(unknown["status"], json!("unknown"));
    let available = unknown["available_types"].as_array().expect("available types");
    assert!(available.contains(&json!("career_path")));
    assert!(available.contains(&json!("company_intelligence")));
}

#[test]
fn handler_errors_never_escape() {
    let registry = Arc::new(IntelligenceTypeRegistry::new());
    let failing: SharedHandler = Arc::new(
        |_: &JsonValue, _: &InferenceOptions| -> anyhow::Result<JsonValue> {
            anyhow::bail!("invalid value")
        },
    );
    registry.register_handler("job_match", failing, Priority::High, "");
    let dispatcher = Dispatcher::new(registry, DispatchConfig::default());

    let value = dispatcher
        .run_inference(&json!({}), "job_match", &InferenceOptions::new())
        .to_value();
    assert_eq!(
        value,
        json!({"status": "error", "error": "invalid value", "intelligence_type": "job_match"})
    );
}

#[test]
fn usage_counts_grow_by_lookup() {
    let registry = IntelligenceTypeRegistry::new();
    registry.register_handler("career_path", echo_handler(), Priority::High, "");
    registry.register_handler("job_match", echo_handler(), Priority::High, "");

    for _ in 0..4 {
        registry.get_handler("job_match");
    }
    registry.get_handler("career_path");

    assert_eq!(registry.get_type_info("job_match").map(|info| info.usage_count), Some(4));
    let top = registry.get_usage_stats(1);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].name, "job_match");
}

#[test]
fn evidence_file_scenario() {
    let dir = evidence_dir(&[(
        "evidence.json",
        json!({"company_intelligence": {"name": "Acme", "revenue": "$5M"}}),
    )]);
    let registry = Arc::new(IntelligenceTypeRegistry::new());
    let stats = registry.discover_from_directory(dir.path());
    assert_eq!(stats.files_scanned, 1);
    assert_eq!(stats.errors, 0);

    let types = registry.list_types(&TypeFilter::default());
    let company = types
        .iter()
        .find(|info| info.name == "company_intelligence")
        .expect("company_intelligence discovered");
    assert_eq!(company.category, "Company & Market Intelligence");
    assert_eq!(
        serde_json::to_value(&company.schema).expect("schema json"),
        json!({"name": "string", "revenue": "currency"})
    );

    let dispatcher = Dispatcher::new(registry, DispatchConfig::default());
    let value = dispatcher
        .run_inference(&json!({}), "company_intelligence", &InferenceOptions::new())
        .to_value();
    assert_eq!(value["status"], json!("not_implemented"));
    assert_eq!(value["schema"]["revenue"], json!("currency"));
}

#[test]
fn bridge_attaches_portal_metadata() {
    let registry = Arc::new(IntelligenceTypeRegistry::new());
    registry.register_handler("career_path", echo_handler(), Priority::High, "");
    let bridge = PortalBridge::new(Arc::new(Dispatcher::new(
        registry,
        DispatchConfig::default(),
    )));

    for name in ["career_path", "missing_type"] {
        let value = bridge
            .get_intelligence(name, &json!({}), PortalType::Admin, &InferenceOptions::new())
            .to_value();
        assert_eq!(value["portal_bridge_metadata"]["portal_type"], json!("admin"));
        assert_eq!(value["portal_bridge_metadata"]["intelligence_type"], json!(name));
    }
    assert_eq!(bridge.metrics().total_requests, 2);
}

#[test]
fn export_then_import_rebuilds_catalog() {
    let dir = evidence_dir(&[("e.json", json!({"skill_gaps": {"missing": ["go"]}}))]);
    let registry = IntelligenceTypeRegistry::new();
    registry.discover_from_directory(dir.path());
    let export_path = dir.path().join("out/registry.json");
    registry.export_registry(&export_path).expect("export");

    let rebuilt = IntelligenceTypeRegistry::new();
    let imported = rebuilt.import_registry(&export_path).expect("import");
    assert_eq!(imported, 1);
    assert_eq!(rebuilt.type_names(), vec!["skill_gap_analysis"]);
    assert_eq!(
        rebuilt.get_type_info("skill_gap_analysis").map(|info| info.is_implemented),
        Some(false)
    );
}
