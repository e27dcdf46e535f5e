// Integration tests for streaming capture
//
// These tests replay synthetic raw streams through the capturer and check
// calibration, conversion, clamping and stream lifecycle handling.

mod common;

use anyhow::Result;
use common::{word, ScriptedInput, Step};
use std::sync::atomic::Ordering;
use voice_drop::{AudioCapturer, CaptureError, CaptureSettings, InputConfig};

fn capturer() -> AudioCapturer {
    AudioCapturer::new(CaptureSettings {
        bit_shift: 15,
        chunk_samples: 1024,
        calibration_chunks: 20,
    })
}

/// 20 calibration chunks whose first word is `first`, rest noise
fn calibration_steps(first: impl Fn(usize) -> i32) -> Vec<Step> {
    (0..20)
        .map(|i| {
            let mut chunk = vec![word(9999); 1024];
            chunk[0] = first(i);
            Step::Chunk(chunk)
        })
        .collect()
}

#[tokio::test]
async fn test_dc_offset_from_first_sample_of_each_chunk() -> Result<()> {
    let k = 1234;
    let mut steps = calibration_steps(|_| word(k));
    steps.push(Step::Chunk(vec![word(k + 100); 1024]));
    let mut input = ScriptedInput::new(steps, word(k - 50));

    let recording = capturer()
        .capture(&mut input, &InputConfig::default(), 2000)
        .await?;

    assert_eq!(recording.dc_offset, k);
    assert_eq!(recording.samples.len(), 2000);
    assert!(recording.samples.as_slice()[..1024].iter().all(|&s| s == 100));
    assert!(recording.samples.as_slice()[1024..].iter().all(|&s| s == -50));

    Ok(())
}

#[tokio::test]
async fn test_negative_dc_offset() -> Result<()> {
    let mut input = ScriptedInput::new(calibration_steps(|_| word(-777)), word(-777));

    let recording = capturer()
        .capture(&mut input, &InputConfig::default(), 100)
        .await?;

    assert_eq!(recording.dc_offset, -777);
    assert!(recording.samples.as_slice().iter().all(|&s| s == 0));

    Ok(())
}

#[tokio::test]
async fn test_dc_offset_rounds_toward_negative_infinity() -> Result<()> {
    // Alternating 1 and 2 averages to 1.5
    let mut input = ScriptedInput::new(calibration_steps(|i| word(1 + (i % 2) as i32)), 0);
    let recording = capturer().capture(&mut input, &InputConfig::default(), 10).await?;
    assert_eq!(recording.dc_offset, 1);

    // Alternating -1 and -2 averages to -1.5
    let mut input = ScriptedInput::new(calibration_steps(|i| word(-1 - (i % 2) as i32)), 0);
    let recording = capturer().capture(&mut input, &InputConfig::default(), 10).await?;
    assert_eq!(recording.dc_offset, -2);

    Ok(())
}

#[tokio::test]
async fn test_out_of_range_samples_saturate() -> Result<()> {
    let mut steps = calibration_steps(|_| 0);
    steps.push(Step::Chunk(vec![
        word(40_000),
        word(-40_000),
        word(32_767),
        word(-32_768),
        word(5),
        i32::MAX,
        i32::MIN,
    ]));
    let mut input = ScriptedInput::new(steps, 0);

    let recording = capturer().capture(&mut input, &InputConfig::default(), 7).await?;

    assert_eq!(
        recording.samples.as_slice(),
        &[32_767, -32_768, 32_767, -32_768, 5, 32_767, -32_768]
    );

    Ok(())
}

#[tokio::test]
async fn test_offset_pushes_sample_into_saturation() -> Result<()> {
    let mut steps = calibration_steps(|_| word(-1000));
    steps.push(Step::Chunk(vec![word(32_000), word(-32_000)]));
    let mut input = ScriptedInput::new(steps, 0);

    let recording = capturer().capture(&mut input, &InputConfig::default(), 2).await?;

    // 32000 + 1000 overflows, -32000 + 1000 does not
    assert_eq!(recording.samples.as_slice(), &[32_767, -31_000]);

    Ok(())
}

#[tokio::test]
async fn test_zero_length_reads_are_retried() -> Result<()> {
    let mut steps = vec![Step::Empty, Step::Empty];
    steps.extend(calibration_steps(|_| 0));
    steps.push(Step::Empty);
    steps.push(Step::Chunk(vec![word(1), word(2)]));
    steps.push(Step::Empty);
    steps.push(Step::Empty);
    steps.push(Step::Chunk(vec![word(3), word(4)]));
    let mut input = ScriptedInput::new(steps, word(9));

    let recording = capturer().capture(&mut input, &InputConfig::default(), 5).await?;

    assert_eq!(recording.dc_offset, 0);
    assert_eq!(recording.samples.as_slice(), &[1, 2, 3, 4, 9]);

    Ok(())
}

#[tokio::test]
async fn test_final_chunk_truncated_to_capacity() -> Result<()> {
    let mut steps = calibration_steps(|_| 0);
    for value in 1..=4 {
        steps.push(Step::Chunk(vec![word(value); 1024]));
    }
    let mut input = ScriptedInput::new(steps, 0);

    let recording = capturer().capture(&mut input, &InputConfig::default(), 2500).await?;

    let samples = recording.samples.as_slice();
    assert_eq!(samples.len(), 2500);
    assert!(samples[..1024].iter().all(|&s| s == 1));
    assert!(samples[1024..2048].iter().all(|&s| s == 2));
    assert!(samples[2048..].iter().all(|&s| s == 3));

    // The fourth chunk is never read
    assert_eq!(input.remaining_steps(), 1);

    Ok(())
}

#[tokio::test]
async fn test_input_closed_after_success() -> Result<()> {
    let mut input = ScriptedInput::constant(0);
    let stats = input.stats.clone();

    capturer().capture(&mut input, &InputConfig::default(), 3000).await?;

    assert_eq!(stats.starts.load(Ordering::SeqCst), 1);
    assert_eq!(stats.stops.load(Ordering::SeqCst), 1);
    assert!(!voice_drop::AudioInput::is_capturing(&input));

    Ok(())
}

#[tokio::test]
async fn test_stream_error_closes_input() {
    let mut steps = calibration_steps(|_| 0);
    steps.push(Step::Chunk(vec![0; 1024]));
    steps.push(Step::Fail("bus error".to_string()));
    let mut input = ScriptedInput::new(steps, 0);
    let stats = input.stats.clone();

    let result = capturer().capture(&mut input, &InputConfig::default(), 4000).await;

    match result {
        Err(CaptureError::Stream(message)) => assert_eq!(message, "bus error"),
        other => panic!("expected stream error, got {:?}", other),
    }
    assert_eq!(stats.stops.load(Ordering::SeqCst), 1);
    assert!(!voice_drop::AudioInput::is_capturing(&input));
}

#[tokio::test]
async fn test_stream_error_during_calibration() {
    let mut input = ScriptedInput::new(vec![Step::Fail("overrun".to_string())], 0);

    let result = capturer().capture(&mut input, &InputConfig::default(), 10).await;

    assert!(matches!(result, Err(CaptureError::Stream(_))));
    assert_eq!(input.stats.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_open_failure_is_capture_error() {
    let mut input = ScriptedInput::failing_start();

    let result = capturer().capture(&mut input, &InputConfig::default(), 10).await;

    assert!(matches!(result, Err(CaptureError::Stream(_))));
    assert_eq!(input.stats.reads.load(Ordering::SeqCst), 0);
    // Closing a stream that never opened is harmless
    assert_eq!(input.stats.stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_allocation_failure_never_opens_input() {
    let mut input = ScriptedInput::constant(0);
    let impossible = u32::MAX as u64 * u32::MAX as u64;

    let result = capturer()
        .capture(&mut input, &InputConfig::default(), impossible)
        .await;

    match result {
        Err(CaptureError::OutOfMemory { samples, bytes }) => {
            assert_eq!(samples, impossible);
            assert_eq!(bytes, u64::MAX);
        }
        other => panic!("expected OutOfMemory, got {:?}", other),
    }
    assert_eq!(input.stats.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sample_rate_carried_into_recording() -> Result<()> {
    let mut input = ScriptedInput::constant(0);
    let config = InputConfig {
        sample_rate: 8000,
        ..InputConfig::default()
    };

    let recording = capturer().capture(&mut input, &config, 8000).await?;

    assert_eq!(recording.sample_rate, 8000);
    assert_eq!(recording.samples.byte_len(), 16000);

    Ok(())
}

#[tokio::test]
async fn test_degenerate_settings_still_capture() -> Result<()> {
    let capturer = AudioCapturer::new(CaptureSettings {
        bit_shift: 40,
        chunk_samples: 0,
        calibration_chunks: 0,
    });
    assert_eq!(capturer.settings().bit_shift, 31);
    assert_eq!(capturer.settings().chunk_samples, 1);

    let mut input = ScriptedInput::constant(i32::MIN);
    let recording = capturer.capture(&mut input, &InputConfig::default(), 64).await?;

    // Sign bit only survives a 31-bit shift; it calibrates away
    assert_eq!(recording.dc_offset, -1);
    assert_eq!(recording.samples.len(), 64);
    assert!(recording.samples.as_slice().iter().all(|&s| s == 0));
    assert_eq!(input.stats.stops.load(Ordering::SeqCst), 1);

    Ok(())
}
