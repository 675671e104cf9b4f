// tests/hmr_flag.rs

use std::error::Error;
use std::fs;
use std::path::Path;

use themedev::hmr::hmr_enabled;

type TestResult = Result<(), Box<dyn Error>>;

fn write_package_json(dir: &Path, dependencies: &[&str]) -> TestResult {
    let deps: Vec<String> = dependencies
        .iter()
        .map(|d| format!("\"{d}\": \"^1.0.0\""))
        .collect();
    let contents = format!(
        "{{ \"name\": \"air-light\", \"dependencies\": {{ {} }} }}",
        deps.join(", ")
    );
    fs::write(dir.join("package.json"), contents)?;
    Ok(())
}

#[test]
fn disable_flag_wins_over_everything() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_package_json(dir.path(), &["react", "react-dom"])?;

    assert!(!hmr_enabled(true, true, dir.path()));
    assert!(!hmr_enabled(true, false, dir.path()));
    Ok(())
}

#[test]
fn enable_flag_wins_without_disable() -> TestResult {
    let dir = tempfile::tempdir()?;
    // No package.json at all.
    assert!(hmr_enabled(false, true, dir.path()));
    Ok(())
}

#[test]
fn reactive_framework_dependency_enables_hmr() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_package_json(dir.path(), &["jquery", "react"])?;
    assert!(hmr_enabled(false, false, dir.path()));

    write_package_json(dir.path(), &["react-dom"])?;
    assert!(hmr_enabled(false, false, dir.path()));
    Ok(())
}

#[test]
fn no_flags_and_no_matching_dependency_disables_hmr() -> TestResult {
    let dir = tempfile::tempdir()?;
    write_package_json(dir.path(), &["jquery", "lodash"])?;
    assert!(!hmr_enabled(false, false, dir.path()));
    Ok(())
}

#[test]
fn missing_or_malformed_package_json_counts_as_no_dependency() -> TestResult {
    let dir = tempfile::tempdir()?;
    assert!(!hmr_enabled(false, false, dir.path()));

    fs::write(dir.path().join("package.json"), "not json {")?;
    assert!(!hmr_enabled(false, false, dir.path()));
    Ok(())
}

#[test]
fn dev_dependencies_do_not_count() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::write(
        dir.path().join("package.json"),
        "{ \"devDependencies\": { \"react\": \"^18.0.0\" } }",
    )?;
    assert!(!hmr_enabled(false, false, dir.path()));
    Ok(())
}
