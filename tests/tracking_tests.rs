//! Point extraction and track-loss hysteresis

use gesture_tracking::arbiter::PointSmoother;
use gesture_tracking::config::{FilterConfig, TrackingConfig};
use gesture_tracking::constants::{INDEX_FINGER_TIP, NUM_HAND_LANDMARKS, PALM_LANDMARKS};
use gesture_tracking::landmarks::{extract_point, ControlPoint, GestureTag, HandLandmarks, Landmark, NormalizedPoint};
use proptest::prelude::*;

fn smoother() -> PointSmoother {
    PointSmoother::new(&FilterConfig::default(), &TrackingConfig::default()).unwrap()
}

fn detection(x: f64, y: f64) -> Option<ControlPoint> {
    Some(ControlPoint {
        point: NormalizedPoint { x, y },
        gesture: GestureTag::Point,
    })
}

#[test]
fn test_mirroring() {
    let left = HandLandmarks::new(vec![Landmark::new(0.0, 0.25); NUM_HAND_LANDMARKS]);
    let right = HandLandmarks::new(vec![Landmark::new(1.0, 0.75); NUM_HAND_LANDMARKS]);

    let left = extract_point(&left).unwrap().point;
    let right = extract_point(&right).unwrap().point;
    assert_eq!((left.x, left.y), (1.0, 0.25));
    assert_eq!((right.x, right.y), (0.0, 0.75));
}

#[test]
fn test_palm_only_hand() {
    let points = (0..NUM_HAND_LANDMARKS)
        .map(|i| PALM_LANDMARKS.contains(&i).then(|| Landmark::new(0.2, 0.4)))
        .collect();
    let cp = extract_point(&HandLandmarks::from_partial(points)).unwrap();
    assert_eq!(cp.gesture, GestureTag::Palm);
    assert!((cp.point.x - 0.8).abs() < 1e-6);
    assert!((cp.point.y - 0.4).abs() < 1e-6);
}

#[test]
fn test_empty_hand_is_absent() {
    assert!(extract_point(&HandLandmarks::default()).is_none());
}

#[test]
fn test_short_gaps_never_blank() {
    let mut smoother = smoother();
    let mut t = 0.0;
    for _ in 0..20 {
        assert!(smoother.update(t, detection(0.5, 0.5)).is_some());
        // Gap of three missed frames at ~30 fps, under the hold window
        for _ in 0..3 {
            t += 33.0;
            assert!(smoother.update(t, None).is_some());
        }
        t += 33.0;
    }
}

#[test]
fn test_held_point_is_unchanged() {
    let mut smoother = smoother();
    smoother.update(0.0, detection(0.2, 0.3));
    let tracked = smoother.update(16.0, detection(0.6, 0.7)).unwrap();
    let held = smoother.update(100.0, None).unwrap();
    assert_eq!(tracked.point, held.point);
    assert_eq!(tracked.gesture, Some(GestureTag::Point));
    assert_eq!(held.gesture, None);
}

#[test]
fn test_long_gap_blanks_and_restarts_fresh() {
    let mut smoother = smoother();
    smoother.update(0.0, detection(0.2, 0.2));
    smoother.update(33.0, detection(0.25, 0.25));

    assert!(smoother.update(120.0, None).is_some());
    assert!(smoother.update(160.0, None).is_none());
    assert!(!smoother.is_primed());

    // The next detection is the first sample of a fresh filter
    let restarted = smoother.update(200.0, detection(0.9, 0.1)).unwrap();
    assert_eq!(restarted.point, NormalizedPoint { x: 0.9, y: 0.1 });
}

proptest! {
    #[test]
    fn prop_valid_fingertip_always_points(
        tip in (0.0f32..1.0, 0.0f32..1.0),
        others in prop::collection::vec(prop::option::of((0.0f32..1.0, 0.0f32..1.0)), NUM_HAND_LANDMARKS)
    ) {
        let mut points: Vec<Option<Landmark>> = others.into_iter().map(|p| p.map(|(x, y)| Landmark::new(x, y))).collect();
        points[INDEX_FINGER_TIP] = Some(Landmark::new(tip.0, tip.1));

        let cp = extract_point(&HandLandmarks::from_partial(points)).unwrap();
        prop_assert_eq!(cp.gesture, GestureTag::Point);
        prop_assert!((cp.point.x - (1.0 - f64::from(tip.0))).abs() < 1e-6);
        prop_assert!((cp.point.y - f64::from(tip.1)).abs() < 1e-6);
    }

    #[test]
    fn prop_gaps_within_hold_keep_point(gaps in prop::collection::vec(1.0f64..119.0, 1..30)) {
        let mut smoother = smoother();
        let mut t = 0.0;
        smoother.update(t, detection(0.5, 0.5));
        for gap in gaps {
            prop_assert!(smoother.update(t + gap, None).is_some());
            t += gap;
            smoother.update(t, detection(0.5, 0.5));
        }
    }
}
