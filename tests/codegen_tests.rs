use page_scribe::codegen::accessor::{
    AccessorBuilder, AccessorMethod, ActionKind, BuilderRegistry, Readiness, WAIT_TIMEOUT_MS,
    ts_string,
};
use page_scribe::codegen::page_object::{
    build_page_object, generate_page_object, generate_page_object_from_records,
};
use page_scribe::locator::extractor::ExtractionSettings;
use page_scribe::locator::locator_model::{Category, LocatorRecord};
use page_scribe::oracle::mock::MockTextInference;
use page_scribe::pipeline::error::PipelineError;
use page_scribe::trace::logger::RunLog;

use crate::common::utils::{LOGIN_LOCATORS, record, temp_store};

mod common;

// ============================================================================
// Accessor shapes
// ============================================================================

#[test]
fn colliding_identifiers_get_distinct_names() {
    let records = vec![
        record("Email!", "input_field", "//input[1]"),
        record("email ", "input_field", "//input[2]"),
    ];
    let page = build_page_object(&records, "signup", &BuilderRegistry::standard());
    assert_eq!(page.method_names(), vec!["enter_email", "enter_email_1"]);
}

#[test]
fn method_names_stay_unique_across_categories() {
    let records = vec![
        record("country", "dropdown", "//select[@id='country']"),
        record("option_from_country", "radio", "//input[@value='c']"),
    ];
    let registry = BuilderRegistry::standard();
    let page = build_page_object(&records, "address", &registry);

    assert_eq!(
        page.method_names(),
        vec!["select_option_from_country", "select_option_from_country_1"]
    );
    assert_eq!(page.methods[1].element_name, "option_from_country_1");

    let source = page.render(&registry);
    assert_eq!(source.matches("async select_option_from_country(").count(), 1);
}

#[test]
fn checkbox_accessor_is_guarded_by_selection_state() {
    let records = vec![record("Remember me", "checkbox", "//input[@type='checkbox']")];
    let registry = BuilderRegistry::standard();
    let page = build_page_object(&records, "login", &registry);

    let method = &page.methods[0];
    assert_eq!(method.method_name, "check_remember_me");
    assert_eq!(method.action_kind, ActionKind::ToggleIfUnchecked);
    assert!(method.parameter.is_none());

    let source = page.render(&registry);
    assert!(source.contains("async check_remember_me(): Promise<void>"));
    assert!(source.contains("if (!(await element.isChecked())) {"));
    assert!(source.contains("await element.click();"));
}

#[test]
fn dropdown_accessor_takes_one_parameter() {
    let records = vec![record("country", "dropdown", "//select[@id='country']")];
    let registry = BuilderRegistry::standard();
    let page = build_page_object(&records, "address", &registry);

    let method = &page.methods[0];
    assert_eq!(method.signature(), "select_option_from_country(option_text)");
    assert_eq!(method.action_kind, ActionKind::SelectByVisibleText);

    let source = page.render(&registry);
    assert!(source.contains("async select_option_from_country(option_text: string): Promise<void>"));
    assert!(source.contains("selectOption({ label: option_text })"));
}

#[test]
fn radio_and_button_wait_until_interactable() {
    let records = vec![
        record("male", "radio", "//input[@value='male']"),
        record("save", "button", "//button"),
    ];
    let registry = BuilderRegistry::standard();
    let page = build_page_object(&records, "profile", &registry);

    assert_eq!(page.methods[0].method_name, "select_male");
    assert_eq!(page.methods[0].readiness, Readiness::Interactable);
    assert_eq!(page.methods[1].method_name, "click_save");

    let source = page.render(&registry);
    assert!(source.contains("state: 'visible', timeout: ProfilePage.WAIT_TIMEOUT_MS"));
    assert!(source.contains("await element.click({ timeout: ProfilePage.WAIT_TIMEOUT_MS });"));
    assert!(source.contains(&format!("static readonly WAIT_TIMEOUT_MS = {};", WAIT_TIMEOUT_MS)));
}

#[test]
fn input_accessor_clears_then_fills() {
    let records = vec![record("username", "input_field", "//input[@id='u']")];
    let registry = BuilderRegistry::standard();
    let source = build_page_object(&records, "login", &registry).render(&registry);

    let clear = source.find("await element.clear();").unwrap();
    let fill = source.find("await element.fill(value);").unwrap();
    assert!(clear < fill);
    assert!(source.contains("state: 'attached'"));
}

#[test]
fn locator_values_are_escaped_string_literals() {
    let records = vec![record(
        "confirm",
        "button",
        r#"//button[text()="Say \"hi\""]"#,
    )];
    let registry = BuilderRegistry::standard();
    let source = build_page_object(&records, "x", &registry).render(&registry);

    assert!(source.contains(&format!("this.locate({})", ts_string(r#"//button[text()="Say \"hi\""]"#))));
    assert_eq!(ts_string("a\"b"), r#""a\"b""#);
}

// ============================================================================
// Skips and name reservation
// ============================================================================

#[test]
fn records_without_xpath_or_builder_are_skipped() {
    let records = vec![
        LocatorRecord::new("search", Category::InputField, "", "input#search").unwrap(),
        record("help", "link", "//a[@id='help']"),
        record("search", "button", "//button[@id='search']"),
    ];
    let page = build_page_object(&records, "home", &BuilderRegistry::standard());

    // The css-only record still claimed "search".
    assert_eq!(page.method_names(), vec!["click_search_1"]);
}

#[test]
fn custom_builders_can_be_registered() {
    struct FollowLinkBuilder;

    impl AccessorBuilder for FollowLinkBuilder {
        fn action_kind(&self) -> ActionKind {
            ActionKind::Click
        }

        fn readiness(&self) -> Readiness {
            Readiness::Interactable
        }

        fn method_name(&self, element_name: &str) -> String {
            format!("follow_{}", element_name)
        }

        fn action_lines(&self, _method: &AccessorMethod) -> Vec<String> {
            vec!["await element.click();".to_string()]
        }
    }

    let registry =
        BuilderRegistry::standard().with(Category::Other("link".into()), FollowLinkBuilder);
    let records = vec![record("help", "link", "//a[@id='help']")];
    let page = build_page_object(&records, "home", &registry);

    assert_eq!(page.signatures(), vec!["follow_help()"]);
    assert!(page.render(&registry).contains("async follow_help(): Promise<void>"));
}

// ============================================================================
// Accessor generation stage
// ============================================================================

#[test]
fn login_page_has_exactly_two_accessors() {
    let (_dir, store) = temp_store();
    let oracle = MockTextInference::new(LOGIN_LOCATORS);
    let registry = BuilderRegistry::standard();

    let path = generate_page_object(
        &oracle,
        "<form><input id='u'><button>Go</button></form>",
        "login",
        &store,
        &ExtractionSettings::default(),
        &registry,
        &RunLog::in_memory(),
    )
    .unwrap();

    assert_eq!(path, store.page_object_path("login"));
    let source = std::fs::read_to_string(&path).unwrap();
    assert!(source.contains("export class LoginPage {"));

    let methods: Vec<&str> = source
        .lines()
        .filter_map(|l| l.trim().strip_prefix("async "))
        .map(|l| l.split(':').next().unwrap())
        .collect();
    assert_eq!(methods, vec!["enter_username(value", "click_submit()"]);

    let records: Vec<LocatorRecord> = serde_json::from_str(LOGIN_LOCATORS).unwrap();
    let page = build_page_object(&records, "login", &registry);
    assert_eq!(page.signatures(), vec!["enter_username(value)", "click_submit()"]);
}

#[test]
fn empty_record_list_fails_without_writing() {
    let (_dir, store) = temp_store();
    let err = generate_page_object_from_records(
        &[],
        "login",
        &store,
        &BuilderRegistry::standard(),
        &RunLog::in_memory(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Validation { stage: "accessors", .. }));
    assert!(!store.page_object_path("login").exists());
}
