use std::path::PathBuf;

use page_scribe::locator::locator_model::{Category, LocatorRecord};
use page_scribe::pipeline::artifacts::ArtifactStore;
use tempfile::TempDir;

pub fn fixture(name: &str) -> PathBuf {
    let base = std::env::current_dir().unwrap();
    base.join("tests").join("fixtures").join(name)
}

pub fn fixture_text(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

/// Artifact store rooted in a fresh temp dir. Keep the `TempDir` alive.
pub fn temp_store() -> (TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("generated"));
    (dir, store)
}

pub fn record(identifier: &str, category: &str, xpath: &str) -> LocatorRecord {
    LocatorRecord::new(identifier, Category::parse(category), xpath, "").unwrap()
}

pub const LOGIN_LOCATORS: &str = r#"[
  {"identifier": "username", "category": "input_field", "xpath": "//input[@id='u']", "css_selector": "input#u"},
  {"identifier": "submit", "category": "button", "xpath": "//button", "css_selector": "button"}
]"#;

pub const LOGIN_FEATURE: &str = "Feature: Login Feature

  Scenario: Successful login
    Given the user is on the login page
    When the user enters \"alice\" in the username field
    And the user clicks the submit button
    Then the dashboard is shown

  Scenario: Empty username
    Given the user is on the login page
    When the user clicks the submit button
    Then an error message is shown
";

pub const LOGIN_SPEC: &str = "import { test, expect } from '@playwright/test';
import { LoginPage } from '../pages/login_page';

test('successful login', async ({ page }) => {
  const login = new LoginPage(page);
  await login.enter_username('alice');
  await login.click_submit();
});
";
