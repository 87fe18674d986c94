//! Integration tests for the animation module.

use cardflow_core::animation::*;
use proptest::prelude::*;
use std::time::Duration;

const MS_100: Duration = Duration::from_millis(100);
const SEC_1: Duration = Duration::from_secs(1);

#[test]
fn tween_reaches_end_at_duration() {
    let tween = Tween::new(0.0, 1.0, SEC_1).easing(Easing::Linear);
    assert!(tween.value_at(Duration::from_millis(999)) < 1.0);
    assert_eq!(tween.value_at(SEC_1), 1.0);
}

#[test]
fn tween_overshoot_clamps() {
    let tween = Tween::new(24.0, 0.0, MS_100);
    assert_eq!(tween.value_at(Duration::from_secs(5)), 0.0);
}

#[test]
fn easing_functions_are_monotonic() {
    for easing in [
        linear,
        ease_in,
        ease_out,
        ease_in_out,
        ease_in_cubic,
        ease_out_cubic,
        ease_in_out_cubic,
    ] {
        let mut prev = 0.0f32;
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            let v = easing(t);
            assert!(v >= prev - 0.001, "easing should be monotonic at t={}", t);
            prev = v;
        }
    }
}

#[test]
fn named_easing_matches_function() {
    for easing in Easing::all() {
        let f = easing.function();
        assert_eq!(f(0.3), easing.apply(0.3));
    }
}

proptest! {
    #[test]
    fn tween_stays_between_endpoints(
        from in -500.0f32..500.0,
        samples in proptest::collection::vec(0u64..600, 0..20),
    ) {
        let tween = Tween::new(from, 0.0, Duration::from_millis(300)).easing(Easing::EaseInOut);
        let (lo, hi) = if from < 0.0 { (from, 0.0) } else { (0.0, from) };
        for ms in samples {
            let v = tween.value_at(Duration::from_millis(ms));
            prop_assert!(v >= lo - 1e-3 && v <= hi + 1e-3, "value {} escaped [{}, {}]", v, lo, hi);
        }
    }
}
