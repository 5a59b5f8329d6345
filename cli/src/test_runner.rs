use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use viewer::{KeyEvent, NavLink, Session, Viewer, ViewerError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Human-readable scenario description.
    #[serde(default)]
    pub description: Option<String>,

    /// Address fragment the deck is opened at, without the `#`.
    #[serde(default)]
    pub fragment: Option<String>,

    /// Steps performed after loading, in order: `key:<KEY>`, `click:<href>`,
    /// `open:<fragment>`, `show:<index>`, `back`, `forward`.
    #[serde(default)]
    pub actions: Vec<String>,

    /// Index of the section that must be shown at the end.
    #[serde(default)]
    pub expect_section: Option<usize>,

    /// Expected document title.
    #[serde(default)]
    pub expect_title: Option<String>,

    /// Expected address fragment. Empty means no fragment.
    #[serde(default)]
    pub expect_fragment: Option<String>,

    /// Expected previous link as `Text (#n)`. Empty means no link.
    #[serde(default)]
    pub expect_prev: Option<String>,

    /// Expected next link as `Text (#n)`. Empty means no link.
    #[serde(default)]
    pub expect_next: Option<String>,

    /// Expected number of session history entries.
    #[serde(default)]
    pub expect_history_len: Option<usize>,

    /// If true, the scenario expects the deck to be rejected.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Address a followed link must have left the page for.
    #[serde(default)]
    pub expect_left_page: Option<String>,
}

/// Parse a `.test.md` file into its TOML config and deck source.
fn parse_scenario_file(content: &str) -> Result<(ScenarioConfig, &str), String> {
    let split = deck::parser::frontmatter::split(content)?;
    let header = split
        .header
        .ok_or("missing opening --- frontmatter delimiter")?;

    let config: ScenarioConfig =
        toml::from_str(header).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, split.body))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    // 1. Read file
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    // 2. Parse frontmatter
    let (config, source) = match parse_scenario_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let description = config.description.clone();
    let outcome = match run_scenario(path, &config, source) {
        Ok(()) => TestOutcome::Pass,
        Err(reason) => TestOutcome::Fail(reason),
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

fn run_scenario(path: &Path, config: &ScenarioConfig, source: &str) -> Result<(), String> {
    // 3. Parse the deck
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("deck.md");
    let parse_result = viewer::parse_page(name, source.to_string());

    // 4. Handle expect_parse_error
    if config.expect_parse_error {
        return match parse_result {
            Err(ViewerError::Parse { .. }) => Ok(()),
            Err(e) => Err(format!("expected parse error, got: {}", e)),
            Ok(_) => Err("expected parse error, but parsing succeeded".into()),
        };
    }

    let page = match parse_result {
        Ok(page) => page,
        Err(ViewerError::Parse { errors, .. }) => {
            let msgs: Vec<String> = errors.iter().map(|e| e.message.clone()).collect();
            return Err(format!("unexpected parse error: {}", msgs.join("; ")));
        }
        Err(e) => return Err(format!("unexpected error: {}", e)),
    };

    // 5. Load and perform the actions
    let url = match &config.fragment {
        Some(fragment) => format!("{}#{}", name, fragment.trim_start_matches('#')),
        None => name.to_string(),
    };
    let mut viewer = Viewer::load(page, Session::open(&url));
    for action in &config.actions {
        perform(&mut viewer, action).map_err(|e| format!("action '{}': {}", action, e))?;
    }

    // 6. Check expectations
    let mut mismatches = Vec::new();

    if let Some(expected) = config.expect_section {
        check(&mut mismatches, "section", expected, viewer.current_index());
    }
    if let Some(expected) = &config.expect_title {
        check(&mut mismatches, "title", expected.as_str(), viewer.title());
    }
    if let Some(expected) = &config.expect_fragment {
        let actual = viewer.host().current().fragment.as_deref().unwrap_or("");
        check(&mut mismatches, "fragment", expected.as_str(), actual);
    }
    if let Some(expected) = &config.expect_prev {
        check(&mut mismatches, "prev link", expected.clone(), describe_link(viewer.prev_link()));
    }
    if let Some(expected) = &config.expect_next {
        check(&mut mismatches, "next link", expected.clone(), describe_link(viewer.next_link()));
    }
    if let Some(expected) = config.expect_history_len {
        check(&mut mismatches, "history length", expected, viewer.host().history().len());
    }
    if let Some(expected) = &config.expect_left_page {
        check(
            &mut mismatches,
            "left page",
            expected.as_str(),
            viewer.host().left_page().unwrap_or(""),
        );
    }

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(mismatches.join("\n"))
    }
}

fn perform(viewer: &mut Viewer<Session>, action: &str) -> Result<(), String> {
    let (verb, argument) = match action.split_once(':') {
        Some((verb, argument)) => (verb.trim(), Some(argument.trim())),
        None => (action.trim(), None),
    };
    debug!(verb, ?argument, "scenario action");

    match (verb, argument) {
        ("key", Some(key)) => {
            let key: KeyEvent = key.parse().map_err(|e: ViewerError| e.to_string())?;
            viewer.key(key);
        }
        ("click", Some(href)) => {
            viewer.click_link(href).map_err(|e| e.to_string())?;
        }
        ("open", Some(fragment)) => {
            viewer.open_fragment(fragment);
        }
        ("show", Some(index)) => {
            let index: i64 = index
                .parse()
                .map_err(|_| format!("'{}' is not an index", index))?;
            viewer.show_section(index);
        }
        ("back", None) => {
            viewer.back();
        }
        ("forward", None) => {
            viewer.forward();
        }
        _ => return Err("unknown action".into()),
    }
    Ok(())
}

fn describe_link(link: Option<NavLink>) -> String {
    match link {
        Some(NavLink { text, href }) => format!("{} ({})", text, href),
        None => String::new(),
    }
}

fn check<T: PartialEq + std::fmt::Debug>(
    mismatches: &mut Vec<String>,
    what: &str,
    expected: T,
    actual: T,
) {
    if expected != actual {
        mismatches.push(format!(
            "{} mismatch\n  expected: {:?}\n  actual:   {:?}",
            what, expected, actual
        ));
    }
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".test.md") {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given scenario path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn ok_label(no_color: bool) -> &'static str {
    if no_color { "ok" } else { "\x1b[32mok\x1b[0m" }
}

fn failed_label(no_color: bool) -> &'static str {
    if no_color { "FAILED" } else { "\x1b[31mFAILED\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}

fn label_for<'a>(result: &'a TestResult) -> &'a str {
    result.description.as_deref().unwrap_or_else(|| {
        result
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("?")
    })
}

fn print_failures(failures: &[TestResult]) {
    eprintln!();
    eprintln!("failures:");
    for f in failures {
        eprintln!();
        eprintln!("  --- {} ---", f.path.display());
        if let TestOutcome::Fail(reason) = &f.outcome {
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run scenarios in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let run_categories: BTreeMap<String, Vec<PathBuf>> = if path.is_file() {
        // single file mode ignores categories
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        if categories.is_empty() {
            all_categories
        } else {
            filter_categories(all_categories, categories)
        }
    };

    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !path.is_file() {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", bold(header, no_color));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", pass_label(no_color), label_for(&result));
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", fail_label(no_color), label_for(&result));
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        print_failures(&failures);
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", ok_label(no_color), passed);
        0
    } else {
        let failed = failures.len();
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            failed_label(no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

fn filter_categories(
    all_categories: BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<String, Vec<PathBuf>> {
    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let mut found = false;
        for (cat, files) in &all_categories {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.clone(), files.clone());
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all_categories
                    .keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}
