use std::fs;
use std::path::PathBuf;

use orbfield::config::{AppConfig, OutputGuardSetting};

fn unique_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "orbfield_config_restore_{}_{}",
        name,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    path
}

#[test]
fn missing_file_writes_defaults() {
    let path = unique_path("missing");
    let path_str = path.to_string_lossy().into_owned();

    let cfg = AppConfig::load_or_default(&path_str);
    assert_eq!(cfg.audio.sample_rate, 48_000);
    assert_eq!(cfg.collision.min_velocity, 10);
    assert!(path.exists(), "defaults not persisted");

    let reread = AppConfig::load_or_default(&path_str);
    assert_eq!(reread.collision.impulse_scale, cfg.collision.impulse_scale);
    let _ = fs::remove_file(&path);
}

#[test]
fn saved_values_survive_a_round_trip() {
    let path = unique_path("roundtrip");
    let path_str = path.to_string_lossy().into_owned();

    fs::write(
        &path,
        r#"
[audio]
latency_ms = 30.0
output_guard = "soft-clip"

[collision]
impulse_scale = 100000.0
min_velocity = 20
"#,
    )
    .unwrap();

    let cfg = AppConfig::load_or_default(&path_str);
    assert_eq!(cfg.audio.latency_ms, 30.0);
    assert_eq!(cfg.audio.output_guard, OutputGuardSetting::SoftClip);
    assert_eq!(cfg.collision.impulse_scale, 100_000.0);
    assert_eq!(cfg.collision.min_velocity, 20);
    // Omitted field falls back.
    assert_eq!(cfg.audio.sample_rate, 48_000);
    let _ = fs::remove_file(&path);
}

#[test]
fn garbage_file_falls_back_to_defaults() {
    let path = unique_path("garbage");
    let path_str = path.to_string_lossy().into_owned();
    fs::write(&path, "not = [valid").unwrap();

    let cfg = AppConfig::load_or_default(&path_str);
    assert_eq!(cfg.collision.min_velocity, 10);
    let _ = fs::remove_file(&path);
}
