use std::fs;

use page_scribe::pipeline::artifacts::ArtifactStore;
use page_scribe::pipeline::error::PipelineError;

use crate::common::utils::temp_store;

mod common;

#[test]
fn artifact_paths_follow_subject() {
    let store = ArtifactStore::new("out");
    assert_eq!(store.locators_path("login"), std::path::Path::new("out/locators/login_locators.json"));
    assert_eq!(store.page_object_path("login"), std::path::Path::new("out/pages/login_page.ts"));
    assert_eq!(store.feature_path("login_form"), std::path::Path::new("out/features/LoginForm.feature"));
    assert_eq!(store.spec_path("login"), std::path::Path::new("out/specs/login.spec.ts"));
    assert_eq!(store.report_dir("login"), std::path::Path::new("out/reports/login"));
    assert_eq!(store.page_object_import("login"), "../pages/login_page");
}

#[test]
fn write_creates_directories_and_leaves_no_temp_file() {
    let (_dir, store) = temp_store();
    let path = store.spec_path("login");

    store.write_text(&path, "first").unwrap();
    store.write_text(&path, "second").unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn write_failure_is_a_persistence_error() {
    let (dir, _) = temp_store();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let store = ArtifactStore::new(&blocker);

    let err = store.write_text(&store.spec_path("login"), "x").unwrap_err();
    assert!(matches!(err, PipelineError::Persistence { .. }));
    assert_eq!(err.kind(), "persistence");
}

#[test]
fn clear_removes_generated_files_but_keeps_preserved_one() {
    let (_dir, store) = temp_store();
    store.write_text(&store.locators_path("a"), "[]").unwrap();
    store.write_text(&store.page_object_path("a"), "class").unwrap();
    store.write_text(&store.feature_path("a"), "Feature: a").unwrap();
    store.write_text(&store.report_dir("a").join("index.html"), "<html>").unwrap();

    let keep = store.feature_path("a");
    let removed = store.clear(Some(&keep)).unwrap();

    assert_eq!(removed, 3);
    assert!(keep.exists());
    assert!(!store.locators_path("a").exists());
    assert!(!store.report_dir("a").exists());
    assert!(store.root().join("specs").is_dir());
}
