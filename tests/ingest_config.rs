// tests/ingest_config.rs
use news_sentiment_ingest::ingest::config::{
    default_sources, load_config_default, load_config_from, load_sources_default,
    load_sources_from, IngestConfig, ENV_CONFIG_PATH, ENV_SOURCES_PATH,
};
use news_sentiment_ingest::ingest::types::Category;
use std::path::Path;
use std::{env, fs};

// Reads repo-relative paths, so it must not overlap the CWD-switching test.
#[serial_test::serial]
#[test]
fn repo_config_files_parse() {
    let cfg = load_config_from(Path::new("config/ingest.toml")).unwrap();
    assert_eq!(cfg, IngestConfig::default());

    let sources = load_sources_from(Path::new("config/sources.toml")).unwrap();
    assert_eq!(sources, default_sources());
}

#[test]
fn parse_toml_and_json_paths() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("sources.toml");
    fs::write(
        &p_toml,
        r#"
[[sources]]
name = " Wire "
url = "https://wire.test/rss"
category = "Exclusive Sources"

[[sources]]
name = ""
url = "https://blank.test/rss"
"#,
    )
    .unwrap();
    let v = load_sources_from(&p_toml).unwrap();
    assert_eq!(v.len(), 1);
    assert_eq!(v[0].name, "Wire");
    assert_eq!(v[0].category, Category::ExclusiveSources);

    let p_json = dir.path().join("ingest.json");
    fs::write(
        &p_json,
        r#"{"strategies": ["direct"], "interval_secs": 0, "max_concurrent_sources": 0}"#,
    )
    .unwrap();
    let cfg = load_config_from(&p_json).unwrap();
    assert_eq!(cfg.strategies, vec!["direct"]);
    assert_eq!(cfg.interval_secs, 0);
    assert_eq!(cfg.max_concurrent_sources, 1);

    let bad = dir.path().join("broken.toml");
    fs::write(&bad, "excerpt_len = \"long\"").unwrap();
    assert!(load_config_from(&bad).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the test does not read the repo's config/.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();

    env::remove_var(ENV_SOURCES_PATH);
    env::remove_var(ENV_CONFIG_PATH);

    // 1) Nothing on disk → built-in seed.
    assert_eq!(load_sources_default().unwrap(), default_sources());
    assert_eq!(load_config_default().unwrap(), IngestConfig::default());

    // 2) Fallback TOML in ./config/
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(
        cfg_dir.join("sources.toml"),
        "[[sources]]\nname = \"Only\"\nurl = \"https://only.test/rss\"\n",
    )
    .unwrap();
    let vt = load_sources_default().unwrap();
    assert_eq!(vt.len(), 1);
    assert_eq!(vt[0].name, "Only");

    // 3) ENV wins
    let p_env = tmp.path().join("sources.json");
    fs::write(&p_env, r#"[{"name": "X", "url": "https://x.test/rss"}]"#).unwrap();
    env::set_var(ENV_SOURCES_PATH, p_env.display().to_string());
    let ve = load_sources_default().unwrap();
    assert_eq!(ve[0].name, "X");
    env::remove_var(ENV_SOURCES_PATH);

    env::set_current_dir(&old).unwrap();
}
