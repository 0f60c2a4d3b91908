use std::time::Duration;

use super::*;
use crate::config::AudioCoreConfig;
use crate::framerate::FrameRate;

fn pal_25_ndf() -> FrameFormat {
    FrameFormat::new(FrameRate::new(25, 1).unwrap(), false).unwrap()
}

fn core_config(block_size: u32, queue_length: u32) -> ValidAudioCoreConfig {
    AudioCoreConfig { block_size, queue_length }.validated().unwrap()
}

fn drain_until_ready(core: &AudioCore, block_size: usize) {
    // Simulates the host's audio callback running a few times, which is what the producer's
    // start-up handshake is waiting on.
    for _ in 0..5 {
        let mut buf = vec![0.0f32; block_size];
        core.on_process(&mut buf);
        std::thread::sleep(Duration::from_millis(5));
    }
}

// One PAL LTC frame is 1920 samples at 48kHz; the ring buffer must comfortably outsize that, so
// tests use a larger block_size/queue_length than a real host callback would typically pick.

#[test]
fn test_start_and_stop_do_not_panic() {
    let core = AudioCore::new(pal_25_ndf(), 48_000, core_config(1024, 4));
    assert!(!core.is_running());
    core.start();
    assert!(core.is_running());
    drain_until_ready(&core, 1024);
    core.stop();
    assert!(!core.is_running());
}

#[test]
fn test_start_is_idempotent() {
    let core = AudioCore::new(pal_25_ndf(), 48_000, core_config(1024, 4));
    core.start();
    core.start();
    assert!(core.is_running());
    core.stop();
}

#[test]
fn test_stop_before_ready_does_not_hang() {
    let core = AudioCore::new(pal_25_ndf(), 48_000, core_config(1024, 4));
    core.start();
    // No on_process call at all: the producer is parked in the start-up handshake.
    core.stop();
    assert!(!core.is_running());
}

#[test]
fn test_on_process_fills_output_once_data_is_available() {
    let core = AudioCore::new(pal_25_ndf(), 48_000, core_config(1024, 4));
    core.start();
    drain_until_ready(&core, 1024);
    std::thread::sleep(Duration::from_millis(20));

    let mut buf = vec![0.5f32; 1024];
    core.on_process(&mut buf);
    assert!(buf.iter().any(|&s| s != 0.5), "expected real samples to replace the sentinel fill value");
    core.stop();
}

#[test]
fn test_on_process_updates_timestamp() {
    let core = AudioCore::new(pal_25_ndf(), 48_000, core_config(1024, 4));
    assert_eq!(core.last_process_timestamp_millis(), 0);
    let mut buf = vec![0.0f32; 1024];
    core.on_process(&mut buf);
    assert!(core.last_process_timestamp_millis() > 0);
}

#[test]
fn test_block_size_change_does_not_panic_while_running() {
    let core = AudioCore::new(pal_25_ndf(), 48_000, core_config(1024, 4));
    core.start();
    drain_until_ready(&core, 1024);
    core.on_block_size_changed(2048);

    let mut buf = vec![0.0f32; 2048];
    core.on_process(&mut buf);
    core.stop();
}

#[test]
fn test_block_size_change_to_same_size_is_a_no_op() {
    let core = AudioCore::new(pal_25_ndf(), 48_000, core_config(1024, 4));
    core.on_block_size_changed(1024);
    assert_eq!(core.queued_samples(), 0);
}
