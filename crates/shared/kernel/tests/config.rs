use wm_kernel::config::{ConfigError, load_config};
use wm_kernel::prelude::MirrorConfig;

#[test]
fn loads_layered_file_config() {
    let tmp = tempfile::tempdir().expect("temp dir");
    let path = tmp.path().join("server.toml");
    std::fs::write(
        &path,
        r#"
[server]
port = 9090

[database]
url = "rocksdb://data/db"

[rewrite]
local_domains = ["hivrisk.cdc.gov"]
"#,
    )
    .expect("write config");

    let cfg: MirrorConfig = load_config(Some(&path)).expect("load config");
    assert_eq!(cfg.server.port, 9090);
    assert_eq!(cfg.database.url, "rocksdb://data/db");
    assert_eq!(cfg.rewrite.home_domain(), Some("hivrisk.cdc.gov"));
    // Untouched sections keep their defaults.
    assert_eq!(cfg.database.namespace, "webmirror");
}

#[test]
fn missing_config_file_is_an_error() {
    let err =
        load_config::<MirrorConfig>(Some("definitely/not/a/config")).expect_err("expected failure");
    assert!(matches!(err, ConfigError::Config(_)));
}
