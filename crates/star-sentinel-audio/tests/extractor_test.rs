//! Integration tests for the audio extractor public API.

use star_sentinel_audio::{
    AudioConfig, AudioFeatureExtractor, AudioSnapshot, SpeechGate, SpeechGateConfig, MFCC_LEN,
};

fn square(half_period: usize, len: usize, amp: i16) -> Vec<i16> {
    (0..len)
        .map(|i| if (i / half_period) % 2 == 0 { amp } else { -amp })
        .collect()
}

#[test]
fn constant_intensity_converges_to_zero_db() {
    let mut ex = AudioFeatureExtractor::new(AudioConfig::default());

    // One loud outlier followed by a long run of identical frames.
    ex.process_buffer(&square(40, 1600, 9000), 16_000);
    for _ in 0..60 {
        ex.process_buffer(&square(40, 1600, 2500), 16_000);
    }

    let db = ex.snapshot().intensity_variance_db;
    assert!(db.abs() < 1e-3, "expected ~0 dB once the outlier is evicted, got {db}");
    assert_eq!(ex.intensity().len(), 50);
}

#[test]
fn scream_like_frames_pass_scream_thresholds() {
    let mut ex = AudioFeatureExtractor::default();
    ex.process_buffer(&square(40, 1600, 200), 16_000);
    ex.process_buffer(&square(20, 1600, 12_000), 16_000);

    let snap = ex.snapshot();
    assert!(snap.intensity_variance_db > 15.0);
    assert!(snap.mfcc_like[0].abs() > 5.0);
    assert!(snap.pitch_hz > 0.0 && snap.pitch_hz <= 400.0);
}

#[test]
fn gate_filters_quiet_frames_before_extraction() {
    let mut gate = SpeechGate::new(SpeechGateConfig::default());
    let mut ex = AudioFeatureExtractor::default();

    let frames = [
        (0_u64, square(40, 1600, 300)),
        (100, square(40, 1600, 4000)),
        (200, square(40, 1600, 100)),
        (300, square(40, 1600, 5000)),
    ];
    for (t, frame) in &frames {
        if gate.observe(frame, *t) {
            ex.process_buffer(frame, 16_000);
        }
    }

    assert_eq!(ex.intensity().len(), 2);
    assert!(gate.is_speech());
}

#[test]
fn custom_band_rejects_default_voice() {
    let config = AudioConfig {
        pitch_min_hz: 300.0,
        pitch_max_hz: 350.0,
        ..AudioConfig::default()
    };
    let mut ex = AudioFeatureExtractor::new(config);
    let f = ex.process_buffer(&square(40, 1600, 3000), 16_000).unwrap();
    assert!((f.pitch_hz - 0.0).abs() < f32::EPSILON);
}

#[test]
fn snapshot_serializes_as_json() {
    let mut ex = AudioFeatureExtractor::default();
    ex.process_buffer(&square(40, 1600, 3000), 16_000);
    let snap = ex.snapshot();

    let json = serde_json::to_string(&snap).unwrap();
    let back: AudioSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.mfcc_like.len(), MFCC_LEN);
    assert!((back.pitch_hz - snap.pitch_hz).abs() < 1e-3);
}
