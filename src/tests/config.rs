use std::error::Error;

use crate::{
    config::{BackendKind, BackendOptions, ServerConfig, DEFAULT_MAX_BODY_BYTES},
    errors::{ConfigError, GantryError},
};

#[test]
fn test_default_config() {
    let config = ServerConfig::default();
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.port(), 8080);
    assert_eq!(config.mount_path(), "/");
    assert_eq!(config.backend(), BackendKind::Hyper);
    assert_eq!(config.options().max_body_bytes(), Some(DEFAULT_MAX_BODY_BYTES));
    assert!(config.options().keep_alive());
    assert!(config.options().tcp_nodelay());
}

#[test]
fn test_server_config_builder() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::builder()
        .host("0.0.0.0")
        .port(9000)
        .mount_path("/api")
        .backend(BackendKind::Hyper)
        .options(
            BackendOptions::builder()
                .max_body_bytes(64 * 1024)
                .keep_alive(false)
                .tcp_nodelay(false)
                .build(),
        )
        .build()?;

    assert_eq!(config.host(), "0.0.0.0");
    assert_eq!(config.port(), 9000);
    assert_eq!(config.mount_path(), "/api");
    assert_eq!(config.options().max_body_bytes(), Some(64 * 1024));
    assert!(!config.options().keep_alive());
    assert!(!config.options().tcp_nodelay());

    Ok(())
}

#[test]
fn test_empty_host_rejected() {
    let config = ServerConfig::builder()
        .host("")
        .build();

    assert_eq!(config.err(), Some(GantryError::Config(ConfigError::EmptyHost)));
}

#[test]
fn test_invalid_mount_path_rejected() {
    let config = ServerConfig::builder()
        .mount_path("api")
        .build();

    assert_eq!(
        config.err(),
        Some(GantryError::Config(ConfigError::InvalidMountPath("api".to_string())))
    );
}

#[test]
fn test_zero_body_limit_rejected() {
    let config = ServerConfig::builder()
        .options(
            BackendOptions::builder()
                .max_body_bytes(0)
                .build(),
        )
        .build();

    assert_eq!(
        config.err(),
        Some(GantryError::Config(ConfigError::BackendOption(
            "max_body_bytes must be greater than zero".to_string()
        )))
    );
}

#[test]
fn test_unlimited_body_option() -> Result<(), Box<dyn Error>> {
    let config = ServerConfig::builder()
        .options(
            BackendOptions::builder()
                .unlimited_body()
                .build(),
        )
        .build()?;

    assert_eq!(config.options().max_body_bytes(), None);

    Ok(())
}

#[test]
fn test_config_from_toml() -> Result<(), Box<dyn Error>> {
    let config: ServerConfig = toml::from_str(
        r#"
host = "0.0.0.0"
port = 9000
mount_path = "/api"
backend = "hyper"

[options]
keep_alive = false
"#,
    )?;

    assert_eq!(config.host(), "0.0.0.0");
    assert_eq!(config.port(), 9000);
    assert_eq!(config.mount_path(), "/api");
    assert_eq!(config.backend(), BackendKind::Hyper);
    assert!(!config.options().keep_alive());
    // Unspecified options keep their defaults.
    assert_eq!(config.options().max_body_bytes(), Some(DEFAULT_MAX_BODY_BYTES));
    assert!(config.options().tcp_nodelay());

    Ok(())
}

#[test]
fn test_partial_toml_uses_defaults() -> Result<(), Box<dyn Error>> {
    let config: ServerConfig = toml::from_str("port = 1234")?;

    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.port(), 1234);
    assert_eq!(config.mount_path(), "/");

    Ok(())
}
