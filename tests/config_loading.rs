// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use themedev::config::loader::{load_and_validate, project_root};

type TestResult = Result<(), Box<dyn Error>>;

const MINIMAL: &str = r#"
[proxy]
target = "https://airdev.test"

[pipeline.styles]
cmd = "npx parcel watch sass/global.scss --dist-dir dist/sass"
reload_target = "dist/sass/global.css"

[pipeline.scripts]
cmd = "npx parcel watch js/front-end.js --dist-dir dist/js"
"#;

fn write_config(contents: &str) -> Result<(tempfile::TempDir, PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Themedev.toml");
    fs::write(&path, contents)?;
    Ok((dir, path))
}

#[test]
fn minimal_config_loads_with_defaults() -> TestResult {
    let (_dir, path) = write_config(MINIMAL)?;
    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.proxy.target, "https://airdev.test");
    assert_eq!(cfg.proxy.port, 3000);
    assert_eq!(cfg.proxy.startup_timeout_secs, 30);
    assert_eq!(
        cfg.pipeline.styles.reload_target.as_deref(),
        Some("dist/sass/global.css")
    );
    assert!(cfg.pipeline.scripts.reload_target.is_none());
    assert_eq!(cfg.lint.quiet_period_ms, 1000);
    assert_eq!(cfg.templates.watch, "**/*.php");
    Ok(())
}

#[test]
fn full_config_round_trips() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[project]
root = "theme"

[proxy]
target = "https://airdev.test"
port = 3001
https_key = "/var/www/certs/localhost-key.pem"
https_cert = "/var/www/certs/localhost.pem"
startup_timeout_secs = 10

[pipeline.styles]
cmd = "npx parcel watch sass/global.scss --dist-dir dist/sass"
reload_target = "dist/sass/global.css"

[pipeline.scripts]
cmd = "npx parcel watch js/front-end.js --dist-dir dist/js"
hmr_args = "--hmr-port 3005"

[lint]
cmd = "npx stylelint 'sass/**/*.scss' --formatter string"
quiet_period_ms = 500

[templates]
watch = "templates/**/*.php"
"#,
    )?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.proxy.port, 3001);
    assert_eq!(cfg.proxy.https_key.as_deref(), Some("/var/www/certs/localhost-key.pem"));
    assert_eq!(cfg.pipeline.scripts.hmr_args.as_deref(), Some("--hmr-port 3005"));
    assert_eq!(cfg.lint.quiet_period_ms, 500);
    assert_eq!(cfg.templates.watch, "templates/**/*.php");

    let root = project_root(&path, &cfg);
    assert!(root.ends_with("theme"));
    Ok(())
}

#[test]
fn missing_proxy_section_is_rejected() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[pipeline.styles]
cmd = "echo styles"

[pipeline.scripts]
cmd = "echo scripts"
"#,
    )?;
    assert!(load_and_validate(&path).is_err());
    Ok(())
}

#[test]
fn empty_pipeline_command_is_rejected() -> TestResult {
    let (_dir, path) = write_config(
        r#"
[proxy]
target = "https://airdev.test"

[pipeline.styles]
cmd = "  "

[pipeline.scripts]
cmd = "echo scripts"
"#,
    )?;
    let err = load_and_validate(&path).unwrap_err();
    assert!(err.to_string().contains("pipeline.styles"));
    Ok(())
}

#[test]
fn invalid_pattern_overrides_are_rejected() -> TestResult {
    let (_dir, path) = write_config(&format!(
        "{MINIMAL}\n[templates]\nwatch = \"[unclosed\"\n"
    ))?;
    assert!(load_and_validate(&path).is_err());

    let (_dir, path) = write_config(&MINIMAL.replace(
        "[pipeline.scripts]",
        "success_pattern = \"(unclosed\"\n\n[pipeline.scripts]",
    ))?;
    assert!(load_and_validate(&path).is_err());
    Ok(())
}

#[test]
fn zero_quiet_period_is_rejected() -> TestResult {
    let (_dir, path) = write_config(&format!("{MINIMAL}\n[lint]\nquiet_period_ms = 0\n"))?;
    let err = load_and_validate(&path).unwrap_err();
    assert!(err.to_string().contains("quiet_period_ms"));
    Ok(())
}
