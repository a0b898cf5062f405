// Integration tests for configuration loading

use anyhow::Result;
use ephemeral_audio::Config;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_missing_file_uses_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("absent");

    let cfg = Config::load(&path.display().to_string())?;

    assert_eq!(cfg.service.http.port, 5000);
    assert_eq!(cfg.storage.audio_dir, "./audio");
    assert_eq!(cfg.degradation.segment_duration, 0.5);
    assert_eq!(cfg.degradation.decay_rate, 1.0);

    let stream = cfg.degradation.stream_config();
    assert_eq!(stream.lock_timeout, Duration::from_secs(5));

    Ok(())
}

#[test]
fn test_file_overrides_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("service.toml");
    std::fs::write(
        &path,
        "[degradation]\nsegment_duration = 2.0\ndecay_rate = 10.0\n\n[service.http]\nport = 8123\n",
    )?;

    let cfg = Config::load(&path.display().to_string())?;

    assert_eq!(cfg.service.http.port, 8123);
    assert_eq!(cfg.service.http.bind, "0.0.0.0");
    assert_eq!(cfg.degradation.segment_duration, 2.0);
    assert_eq!(cfg.degradation.stream_config().decay_rate, 10.0);
    assert_eq!(cfg.degradation.lock_timeout_ms, 5000);

    Ok(())
}

#[test]
fn test_non_positive_region_duration_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[degradation]\nsegment_duration = 0.0\n")?;

    assert!(Config::load(&path.display().to_string()).is_err());

    Ok(())
}
