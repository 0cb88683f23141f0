use ecgmon::constants::SAMPLING_FREQUENCY;
use ecgmon::simulation::pulse_train;
use ecgmon::{EcgProcessor, MonitorConfig, QrsDetector, RhythmAssessment, SampleResult};

fn run_detector(trace: &[u16]) -> Vec<SampleResult> {
    let mut detector = QrsDetector::new(&MonitorConfig::default()).unwrap();
    trace
        .iter()
        .enumerate()
        .map(|(i, &s)| detector.process(i as u64, s))
        .collect()
}

#[test]
fn test_rr_average_appears_on_eighth_beat() {
    let period = SAMPLING_FREQUENCY as usize;
    let trace = pulse_train(13000, 650, period, 800.0);
    let results = run_detector(&trace);

    let mut beat_number = 0;
    for result in &results {
        if result.is_qrs {
            beat_number += 1;
            if beat_number < 8 {
                assert_eq!(
                    result.rr_average, 0.0,
                    "beat {beat_number} must still be inside the startup skip"
                );
                assert_eq!(result.assessment, RhythmAssessment::Undetermined);
            } else {
                assert!(
                    result.rr_average > 0.0,
                    "beat {beat_number} must carry an RR average"
                );
            }
        }
    }
    assert!(beat_number >= 8, "not enough beats to exercise the skip");
}

#[test]
fn test_assessment_codes_are_stable() {
    assert_eq!(RhythmAssessment::Undetermined as u8, 0);
    assert_eq!(RhythmAssessment::Regular as u8, 1);
    assert_eq!(RhythmAssessment::Irregular as u8, 2);
}

#[test]
fn test_acceleration_relaxes_thresholds() {
    // Steady minute at 60 bpm, then an abrupt jump to 75 bpm.
    let mut trace = pulse_train(12000, 650, 200, 800.0);
    let fast = pulse_train(8000, 110, 160, 800.0);
    trace.extend_from_slice(&fast);

    let results = run_detector(&trace);

    // Locate the regular -> irregular flip.
    let mut flip = None;
    let mut was_regular = true;
    for (i, result) in results.iter().enumerate() {
        if result.is_qrs {
            if was_regular && !result.is_regular {
                flip = Some(i);
                break;
            }
            was_regular = result.is_regular;
        }
    }
    let flip = flip.expect("rhythm never turned irregular");

    // The flip halves the primary threshold, so the post-beat threshold
    // must sit clearly below the pre-beat one.
    let before = results[flip - 1].threshold_i1;
    let after = results[flip].threshold_i1;
    assert!(
        after < before,
        "threshold did not drop on the irregular flip ({before} -> {after})"
    );

    // And the stream stays irregular from there on.
    let last = results.iter().rev().find(|r| r.is_qrs).unwrap();
    assert_eq!(last.assessment, RhythmAssessment::Irregular);
}

#[test]
fn test_steady_stream_reports_regular_evaluation() {
    let period = SAMPLING_FREQUENCY as usize;
    let trace = pulse_train(13000, 650, period, 800.0);

    let mut processor = EcgProcessor::new(&MonitorConfig::default()).unwrap();
    let beats = processor.process_buffer(&trace);

    let settled: Vec<_> = beats.iter().filter(|b| b.sample_index >= 4000).collect();
    assert!(!settled.is_empty());
    for beat in &settled {
        assert!(beat.regular, "beat at {} not regular", beat.sample_index);
        assert_eq!(beat.assessment, RhythmAssessment::Regular);
    }
}
