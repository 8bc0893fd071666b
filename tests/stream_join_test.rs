//! End-to-end tests for the windowed stream-stream join engine.
//!
//! Drives the coordinator the way a transport layer would: two ordered
//! record sequences interleaved into one processing order, with outputs
//! sequenced into a collecting sink.

use std::time::Duration;

use stream_join::{
    CollectingSink, FallbackPolicy, JoinConfig, JoinCoordinator, JoinMode, JoinOutput, JoinSide,
    OutputEmitter, Record,
};

fn run(
    coordinator: &mut JoinCoordinator,
    inputs: &[(JoinSide, Record)],
) -> Vec<JoinOutput> {
    let mut emitter = OutputEmitter::new(CollectingSink::new());
    for (side, record) in inputs {
        let results = coordinator.process(*side, record.clone()).unwrap();
        emitter.forward(results);
    }
    emitter.into_sink().into_outputs()
}

fn ad_scenario_inputs() -> Vec<(JoinSide, Record)> {
    let impressions = [
        Record::new("car-advertisement", "shown", 1000),
        Record::new("newspaper-advertisement", "shown", 1001),
        Record::new("gadget-advertisement", "shown", 1002),
    ];
    let clicks = [
        Record::new("newspaper-advertisement", "clicked", 2000),
        Record::new("gadget-advertisement", "clicked", 2001),
        Record::new("newspaper-advertisement", "clicked", 2002),
    ];

    impressions
        .into_iter()
        .map(|r| (JoinSide::Left, r))
        .chain(clicks.into_iter().map(|r| (JoinSide::Right, r)))
        .collect()
}

/// The classic ad impressions / ad clicks outer join: every impression that
/// has no click at arrival emits an immediate "not-clicked-yet" result, and
/// every click inside the 5 second window emits a combined result. Repeated
/// clicks against the same impression each produce a new output.
#[test]
fn test_outer_join_ad_impressions_and_clicks() {
    let config = JoinConfig::new(Duration::from_secs(5)).with_mode(JoinMode::Outer);
    let mut coordinator = JoinCoordinator::new(config).unwrap();

    let outputs = run(&mut coordinator, &ad_scenario_inputs());

    let expected = vec![
        JoinOutput::new("car-advertisement", "shown/not-clicked-yet"),
        JoinOutput::new("newspaper-advertisement", "shown/not-clicked-yet"),
        JoinOutput::new("gadget-advertisement", "shown/not-clicked-yet"),
        JoinOutput::new("newspaper-advertisement", "shown/clicked"),
        JoinOutput::new("gadget-advertisement", "shown/clicked"),
        JoinOutput::new("newspaper-advertisement", "shown/clicked"),
    ];
    assert_eq!(outputs, expected);
}

/// Re-running the same input interleaving produces an identical output
/// sequence.
#[test]
fn test_output_is_deterministic() {
    let inputs = ad_scenario_inputs();

    let mut first = JoinCoordinator::new(
        JoinConfig::new(Duration::from_secs(5)).with_mode(JoinMode::Outer),
    )
    .unwrap();
    let mut second = JoinCoordinator::new(
        JoinConfig::new(Duration::from_secs(5)).with_mode(JoinMode::Outer),
    )
    .unwrap();

    assert_eq!(run(&mut first, &inputs), run(&mut second, &inputs));
}

/// Under the deferred policy, an impression that never matches emits its
/// fallback exactly once, only after the opposite stream's time has passed
/// its window; matched impressions never fall back.
#[test]
fn test_deferred_outer_join_fallback_after_window_close() {
    let config = JoinConfig::new(Duration::from_secs(5))
        .with_mode(JoinMode::Outer)
        .with_policy(FallbackPolicy::Deferred);
    let mut coordinator = JoinCoordinator::new(config).unwrap();

    let inputs = vec![
        (JoinSide::Left, Record::new("car-advertisement", "shown", 1000)),
        (JoinSide::Left, Record::new("newspaper-advertisement", "shown", 1001)),
        (JoinSide::Right, Record::new("newspaper-advertisement", "clicked", 2000)),
    ];
    let mut outputs = run(&mut coordinator, &inputs);

    // Only the match has been emitted so far
    assert_eq!(
        outputs,
        vec![JoinOutput::new("newspaper-advertisement", "shown/clicked")]
    );

    // The click stream's watermark passes the impressions' window
    outputs.extend(coordinator.advance_stream_time(JoinSide::Right, 10_000));
    assert_eq!(
        outputs,
        vec![
            JoinOutput::new("newspaper-advertisement", "shown/clicked"),
            JoinOutput::new("car-advertisement", "shown/not-clicked-yet"),
        ]
    );

    // Advancing further produces nothing more
    assert!(coordinator
        .advance_stream_time(JoinSide::Right, 60_000)
        .is_empty());
    assert_eq!(coordinator.stats().fallbacks_emitted, 1);
}

/// Inner join emits nothing for unmatched records, ever.
#[test]
fn test_inner_join_drops_unmatched() {
    let mut coordinator = JoinCoordinator::new(JoinConfig::new(Duration::from_secs(5))).unwrap();

    let outputs = run(&mut coordinator, &ad_scenario_inputs());

    let expected = vec![
        JoinOutput::new("newspaper-advertisement", "shown/clicked"),
        JoinOutput::new("gadget-advertisement", "shown/clicked"),
        JoinOutput::new("newspaper-advertisement", "shown/clicked"),
    ];
    assert_eq!(outputs, expected);

    // Closing all windows still emits nothing extra
    assert!(coordinator
        .advance_stream_time(JoinSide::Right, 60_000)
        .is_empty());
    assert!(coordinator
        .advance_stream_time(JoinSide::Left, 60_000)
        .is_empty());
}

/// A custom combiner and fallback flow through unchanged.
#[test]
fn test_custom_combiner_and_fallback() {
    let config = JoinConfig::new(Duration::from_secs(5))
        .with_mode(JoinMode::Outer)
        .with_combiner(|impression, click| format!("{impression}+{click}"))
        .with_left_fallback(|impression| format!("{impression}+none"));
    let mut coordinator = JoinCoordinator::new(config).unwrap();

    let inputs = vec![
        (JoinSide::Left, Record::new("ad", "shown", 1000)),
        (JoinSide::Right, Record::new("ad", "clicked", 2000)),
    ];
    let outputs = run(&mut coordinator, &inputs);

    assert_eq!(
        outputs,
        vec![
            JoinOutput::new("ad", "shown+none"),
            JoinOutput::new("ad", "shown+clicked"),
        ]
    );
}
