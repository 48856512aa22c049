use ember_dns_domain::config::{CliOverrides, Config};

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();

    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.server.port, 53);
    assert_eq!(config.dns.upstream, "8.8.8.8:53");
    assert_eq!(config.dns.query_timeout_secs, 5);
    assert_eq!(config.cache.snapshot_path, "dns_cache.snapshot");
    assert_eq!(config.logging.level, "info");
}

#[test]
fn partial_toml_fills_missing_sections_with_defaults() {
    let toml_str = r#"
        [server]
        port = 5353

        [dns]
        upstream = "1.1.1.1:53"
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.server.port, 5353);
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert_eq!(config.dns.upstream, "1.1.1.1:53");
    assert_eq!(config.dns.query_timeout_secs, 5);
    assert_eq!(config.cache.snapshot_path, "dns_cache.snapshot");
}

#[test]
fn cli_overrides_win_over_file_values() {
    let overrides = CliOverrides {
        port: Some(10053),
        bind_address: Some("0.0.0.0".to_string()),
        upstream: Some("9.9.9.9:53".to_string()),
        snapshot_path: Some("/tmp/cache.snapshot".to_string()),
        log_level: Some("debug".to_string()),
    };

    let config = Config::load(None, overrides).unwrap();

    assert_eq!(config.server.port, 10053);
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.dns.upstream, "9.9.9.9:53");
    assert_eq!(config.cache.snapshot_path, "/tmp/cache.snapshot");
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let result = Config::load(
        Some("/nonexistent/ember-dns.toml"),
        CliOverrides::default(),
    );
    assert!(result.is_err());
}
