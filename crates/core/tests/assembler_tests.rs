use rand::{Rng, SeedableRng, rngs::StdRng};
use spoiler_core::{
    Assembler, NarrativeArc, OverlapPolicy, Segment, SpoilerError, TargetDuration, Timeline,
};

fn random_segments(rng: &mut StdRng) -> Vec<Segment> {
    let count = rng.gen_range(1..25usize);
    (0..count)
        .map(|i| {
            let start = rng.gen_range(0..3000u32) as f64;
            let len = rng.gen_range(1..120u32) as f64;
            Segment::new(start, start + len, format!("sentence {i}")).unwrap()
        })
        .collect()
}

fn assemble(
    assembler: &Assembler,
    segments: Vec<Segment>,
    target: TargetDuration,
) -> (Result<Timeline, SpoilerError>, Vec<f64>) {
    let mut seen = Vec::new();
    let result = assembler.assemble(segments, target, None, &mut |p| seen.push(p));
    (result, seen)
}

#[test]
fn chronological_output_is_ordered_and_bounded() {
    let mut rng = StdRng::seed_from_u64(7);
    let assembler = Assembler::default();

    for _ in 0..200 {
        let segments = random_segments(&mut rng);
        let target = TargetDuration::seconds(rng.gen_range(10..600u32) as f64);
        let (result, progress) = assemble(&assembler, segments.clone(), target);

        let Ok(timeline) = result else {
            // Only possible when no single candidate fits.
            assert!(segments.iter().all(|s| s.duration() > target.value));
            continue;
        };

        assert!(timeline.total_duration <= timeline.target_duration);
        let sum: f64 = timeline.segments.iter().map(Segment::duration).sum();
        assert!((sum - timeline.total_duration).abs() < 1e-9);
        assert!(
            timeline
                .segments
                .windows(2)
                .all(|w| w[0].start() <= w[1].start())
        );
        assert_eq!(progress.len(), timeline.len());
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert!(progress.iter().all(|p| *p > 0.0 && *p <= 100.0));
    }
}

#[test]
fn every_included_segment_came_from_the_input() {
    let mut rng = StdRng::seed_from_u64(42);
    let assembler = Assembler::new(Box::new(NarrativeArc), OverlapPolicy::SkipOverlapping);

    for _ in 0..100 {
        let segments = random_segments(&mut rng);
        let target = TargetDuration::percentage(rng.gen_range(5..90u32) as f64);
        let (result, _) = assemble(&assembler, segments.clone(), target);
        let Ok(timeline) = result else { continue };

        assert!(timeline.total_duration <= timeline.target_duration);
        for included in &timeline.segments {
            assert!(segments.contains(included));
        }
        for (i, a) in timeline.segments.iter().enumerate() {
            for b in &timeline.segments[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }
}

#[test]
fn assembling_twice_gives_the_same_timeline() {
    let mut rng = StdRng::seed_from_u64(1234);
    let assembler = Assembler::default();

    for _ in 0..50 {
        let segments = random_segments(&mut rng);
        let target = TargetDuration::seconds(300.0);
        let (first, _) = assemble(&assembler, segments.clone(), target);
        let (second, _) = assemble(&assembler, segments, target);
        match (first, second) {
            (Ok(a), Ok(b)) => assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            _ => panic!("re-run changed the outcome"),
        }
    }
}

#[test]
fn half_of_estimated_length() {
    let segments = vec![
        Segment::new(0.0, 40.0, "opening").unwrap(),
        Segment::new(60.0, 120.0, "middle").unwrap(),
        Segment::new(150.0, 200.0, "ending").unwrap(),
    ];
    let (result, progress) = assemble(
        &Assembler::default(),
        segments,
        TargetDuration::percentage(50.0),
    );
    let timeline = result.unwrap();

    assert_eq!(timeline.target_duration, 100.0);
    assert_eq!(timeline.total_duration, 100.0);
    let sentences: Vec<&str> = timeline.segments.iter().map(|s| s.sentence()).collect();
    assert_eq!(sentences, vec!["opening", "middle"]);
    assert_eq!(progress, vec![40.0, 100.0]);
}

#[test]
fn reported_length_overrides_estimate() {
    let segments = vec![Segment::new(0.0, 30.0, "only").unwrap()];
    let timeline = Assembler::default()
        .assemble(segments, TargetDuration::percentage(10.0), Some(600.0), &mut |_| {})
        .unwrap();
    assert_eq!(timeline.target_duration, 60.0);
}

#[test]
fn invalid_targets_are_rejected() {
    let segments = || vec![Segment::new(0.0, 10.0, "only").unwrap()];
    for target in [
        TargetDuration::seconds(0.0),
        TargetDuration::seconds(-5.0),
        TargetDuration::seconds(f64::NAN),
        TargetDuration::percentage(150.0),
    ] {
        let (result, progress) = assemble(&Assembler::default(), segments(), target);
        assert!(matches!(result, Err(SpoilerError::InvalidTarget { .. })));
        assert!(progress.is_empty());
    }
}
