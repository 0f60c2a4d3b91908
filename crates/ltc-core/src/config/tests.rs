use super::*;

fn base_generator_config() -> GeneratorConfig {
    GeneratorConfig {
        use_current_time: false,
        use_utc: false,
        drop_frame: true,
        use_float_samples: false,
        sample_rate: 48_000,
        bit_depth: 16,
    }
}

#[test]
fn test_valid_generator_config_passes() {
    assert!(base_generator_config().validated().is_ok());
}

#[test]
fn test_generator_config_rejects_zero_sample_rate() {
    let config = GeneratorConfig { sample_rate: 0, ..base_generator_config() };
    assert!(config.validated().is_err());
}

#[test]
fn test_generator_config_rejects_unsupported_bit_depth() {
    let config = GeneratorConfig { bit_depth: 12, ..base_generator_config() };
    assert!(config.validated().is_err());
}

#[test]
fn test_valid_audio_core_config_passes() {
    let config = AudioCoreConfig { block_size: 256, queue_length: 4 };
    assert!(config.validated().is_ok());
}

#[test]
fn test_audio_core_config_rejects_zero_block_size() {
    let config = AudioCoreConfig { block_size: 0, queue_length: 4 };
    assert!(config.validated().is_err());
}

#[test]
fn test_audio_core_config_rejects_zero_queue_length() {
    let config = AudioCoreConfig { block_size: 256, queue_length: 0 };
    assert!(config.validated().is_err());
}
