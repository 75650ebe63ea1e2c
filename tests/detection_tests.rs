//! Rotation detection and the signal gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vrlg::config::SignalConfig;
use vrlg::detector::{DetectorState, RotationDetector, SignalDetector};
use vrlg::domain::FeatureSnapshot;
use vrlg::testkit::config;
use vrlg::testkit::data::{flat, PeriodicSeries};

fn feed(det: &mut RotationDetector, samples: &[vrlg::testkit::data::Sample]) {
    for s in samples {
        det.update(s.t, s.dob, s.spread_ticks);
    }
}

#[test]
fn periodic_depth_and_spread_activate_rotation() {
    let mut det = RotationDetector::from_config(&config::signal());
    feed(&mut det, &PeriodicSeries::default().samples(120));

    assert!(det.is_active(), "state: {:?}", det.state());
    let period = det.current_period().expect("period");
    assert!((1.6..=2.4).contains(&period), "period {period}");

    let est = det.last_estimation();
    assert!(est.n_boundary >= 200);
    assert!(est.n_off >= 50);
    assert!(est.p_dob.unwrap() < 0.01);
    assert!(est.p_spread.unwrap() < 0.01);
}

#[test]
fn constant_data_never_activates() {
    let mut det = RotationDetector::from_config(&config::signal());
    feed(&mut det, &flat(120, 1_000.0, 1.0));

    assert!(!det.is_active());
    assert_ne!(det.state(), DetectorState::Active);
}

#[test]
fn phase_tracks_estimated_period() {
    let mut det = RotationDetector::from_config(&config::signal());
    feed(&mut det, &PeriodicSeries::default().samples(120));
    let period = det.current_period().unwrap();

    let t = 1_000.5;
    let phase = det.current_phase(t);
    assert!((0.0..1.0).contains(&phase));
    let later = det.current_phase(t + period);
    assert!((phase - later).abs() < 1e-6);
}

#[test]
fn rotation_needs_both_partitions_populated() {
    let cfg = SignalConfig {
        min_boundary_samples: 10_000,
        ..config::signal()
    };
    let mut det = RotationDetector::from_config(&cfg);
    feed(&mut det, &PeriodicSeries::default().samples(120));

    assert!(!det.is_active());
    assert_eq!(det.state(), DetectorState::InsufficientSamples);
    assert!(det.current_period().is_some());
}

fn gate_config() -> SignalConfig {
    SignalConfig {
        n: 10,
        x: 0.25,
        y: 2.0,
        z: 0.15,
        obi_limit: 0.6,
        ..SignalConfig::default()
    }
}

/// Detector whose depth baseline is a full window of 1000.
fn warmed_gate() -> SignalDetector {
    let mut det = SignalDetector::new(&gate_config());
    for i in 0..10_u32 {
        let snap = FeatureSnapshot::new(f64::from(i) * 0.1, 100.0, 1.0, 1_000.0, 0.0).with_phase(0.5);
        assert!(det.update_and_maybe_signal(snap.t, &snap).is_none());
    }
    assert_eq!(det.dob_baseline(), Some(1_000.0));
    det
}

fn passing() -> FeatureSnapshot {
    FeatureSnapshot::new(5.0, 100.0, 3.0, 600.0, 0.1).with_phase(0.05)
}

#[test]
fn all_four_conditions_emit_one_signal() {
    let mut det = warmed_gate();
    let snap = passing();
    let signal = det.update_and_maybe_signal(snap.t, &snap).expect("signal");
    assert_eq!(signal.mid, 100.0);
    assert_eq!(signal.t, 5.0);
    assert_eq!(signal.trace_id.as_str().len(), 12);
}

#[test]
fn any_single_failing_condition_suppresses_signal() {
    let base = passing();
    let cases = [
        ("phase", base.with_phase(0.5)),
        ("dob", FeatureSnapshot::new(5.0, 100.0, 3.0, 900.0, 0.1).with_phase(0.05)),
        ("spread", FeatureSnapshot::new(5.0, 100.0, 1.5, 600.0, 0.1).with_phase(0.05)),
        ("obi", FeatureSnapshot::new(5.0, 100.0, 3.0, 600.0, -0.7).with_phase(0.05)),
    ];
    for (name, snap) in cases {
        let mut det = warmed_gate();
        assert!(
            det.update_and_maybe_signal(snap.t, &snap).is_none(),
            "{name} failure should suppress the signal"
        );
    }
}

#[test]
fn phase_window_wraps_around_one() {
    let mut det = warmed_gate();
    let snap = FeatureSnapshot::new(5.0, 100.0, 3.0, 600.0, 0.0).with_phase(0.9);
    assert!(det.update_and_maybe_signal(snap.t, &snap).is_some());
}

#[test]
fn missing_phase_fails_gate() {
    let mut det = warmed_gate();
    let snap = FeatureSnapshot::new(5.0, 100.0, 3.0, 600.0, 0.0);
    assert!(det.update_and_maybe_signal(snap.t, &snap).is_none());
}

#[test]
fn each_qualifying_snapshot_emits_its_own_signal() {
    let mut det = warmed_gate();
    let first = det.update_and_maybe_signal(5.0, &passing()).unwrap();
    let second = det.update_and_maybe_signal(5.1, &passing()).unwrap();
    assert_ne!(first.trace_id, second.trace_id);
}

#[test]
fn observer_sees_every_evaluation() {
    let seen = Arc::new(AtomicUsize::new(0));
    let missing_dob = Arc::new(AtomicUsize::new(0));
    let (s, m) = (Arc::clone(&seen), Arc::clone(&missing_dob));
    let mut det = SignalDetector::new(&gate_config()).with_observer(Box::new(move |eval| {
        s.fetch_add(1, Ordering::SeqCst);
        if eval.missing().contains(&"dob_thin") {
            m.fetch_add(1, Ordering::SeqCst);
        }
    }));

    for i in 0..12_u32 {
        let snap = FeatureSnapshot::new(f64::from(i), 100.0, 3.0, 1_000.0, 0.0).with_phase(0.05);
        det.update_and_maybe_signal(snap.t, &snap);
    }
    assert_eq!(seen.load(Ordering::SeqCst), 12);
    assert_eq!(missing_dob.load(Ordering::SeqCst), 12);
}
