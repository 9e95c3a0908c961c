// Copyright 2026 the Frametimeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for token retention, classification, and history bounds.

use std::sync::Arc;

use frametimeline_core::clock::ManualClock;
use frametimeline_core::fence::FenceCell;
use frametimeline_core::snapshot::DumpFilter;
use frametimeline_core::surface_frame::PresentState;
use frametimeline_core::time::{Duration, HostTime};
use frametimeline_core::timeline::{FrameTimeline, TimelineConfig};
use frametimeline_core::timing::{
    FramePresentMetadata, FrameReadyMetadata, FrameStartMetadata, PredictionState, TimelineItem,
    classify_present, classify_ready, classify_start,
};
use frametimeline_core::token::{Token, TokenManager, TokenStore};
use proptest::prelude::*;

type TestTimeline = FrameTimeline<TokenStore<Arc<ManualClock>>>;

fn timeline(config: TimelineConfig) -> TestTimeline {
    let clock = Arc::new(ManualClock::new(HostTime::from_millis(1_000)));
    FrameTimeline::with_token_manager(config, TokenStore::with_clock(clock))
}

fn prediction_strategy() -> impl Strategy<Value = TimelineItem> {
    (0i64..1_000_000, 0i64..50_000_000, 0i64..50_000_000).prop_map(|(start, work, latency)| {
        TimelineItem::new(
            HostTime(start),
            HostTime(start + work),
            HostTime(start + work + latency),
        )
    })
}

// -- Tokens --

proptest! {
    #[test]
    fn tokens_increase_and_resolve_exactly(
        predictions in prop::collection::vec(prediction_strategy(), 1..64),
    ) {
        let store = TokenStore::with_clock(ManualClock::new(HostTime::from_millis(5)));
        let mut last: Option<Token> = None;
        for prediction in predictions {
            let token = store.generate_token(prediction);
            if let Some(last) = last {
                prop_assert!(token > last, "{token:?} after {last:?}");
            }
            last = Some(token);
            prop_assert_eq!(store.resolve_state(Some(token)), (PredictionState::Valid, prediction));
            prop_assert_eq!(store.resolve(token), store.resolve(token));
        }
    }

    #[test]
    fn tokens_expire_after_retention(
        prediction in prediction_strategy(),
        extra_ms in 0i64..1_000,
    ) {
        let clock = Arc::new(ManualClock::new(HostTime::ZERO));
        let store = TokenStore::with_clock(Arc::clone(&clock));
        let token = store.generate_token(prediction);
        clock.advance(TokenStore::RETENTION + Duration::from_millis(extra_ms));
        prop_assert_eq!(store.resolve(token), None);
        prop_assert_eq!(store.resolve_state(Some(token)).0, PredictionState::Expired);
    }

    #[test]
    fn never_issued_tokens_do_not_resolve(issued in 0usize..16, probe in 16i64..10_000) {
        let store = TokenStore::new();
        for _ in 0..issued {
            store.generate_token(TimelineItem::default());
        }
        prop_assert_eq!(store.resolve(Token(probe)), None);
        prop_assert_eq!(store.resolve_state(Some(Token(probe))).0, PredictionState::None);
    }
}

// -- Classification --

proptest! {
    #[test]
    fn exact_timestamps_are_on_time(t in any::<i64>(), threshold in 0i64..100_000_000) {
        let t = HostTime(t);
        let threshold = Duration(threshold);
        prop_assert_eq!(classify_start(t, t, threshold), FrameStartMetadata::OnTimeStart);
        prop_assert_eq!(classify_ready(t, t, threshold), FrameReadyMetadata::OnTimeFinish);
        prop_assert_eq!(classify_present(t, t, threshold), FramePresentMetadata::OnTimePresent);
    }

    #[test]
    fn layer_frames_carry_cycle_jank(
        cycle in prediction_strategy(),
        layer in prediction_strategy(),
        end_offset in -5_000_000i64..30_000_000,
        present_offset in 0i64..120_000_000,
        layer_ready_offset in -5_000_000i64..30_000_000,
        dropped in any::<bool>(),
        gpu in any::<bool>(),
    ) {
        let timeline = timeline(TimelineConfig::new());
        let cycle_token = timeline.token_manager().generate_token(cycle);
        let layer_token = timeline.token_manager().generate_token(layer);
        timeline.wake(cycle_token, cycle.start_time, Duration::from_millis(16));

        let frame = timeline.create_surface_frame(Some(layer_token), 7, 7, "L#0", "L");
        frame.set_actual_start_time(layer.start_time);
        frame.set_actual_queue_time(layer.end_time + Duration(layer_ready_offset));
        let state = if dropped { PresentState::Dropped } else { PresentState::Presented };
        frame.set_present_state(state, HostTime::ZERO);
        timeline.attach(Arc::clone(&frame));
        timeline.set_gpu_composition(gpu);

        let fence = FenceCell::signaled(cycle.start_time + Duration(present_offset));
        timeline.present(cycle.end_time + Duration(end_offset), Some(Arc::new(fence)));

        let snapshot = timeline.snapshot(DumpFilter::All);
        let cycle_jank = snapshot.frames[0].record.jank;
        prop_assert!(cycle_jank.is_some(), "cycle was finalized");
        let cycle_jank = cycle_jank.unwrap_or_default();
        let layer_jank = frame.jank_type();
        prop_assert!(layer_jank.is_some(), "layer frame was finalized");
        prop_assert!(
            layer_jank.unwrap_or_default().contains(cycle_jank),
            "{:?} does not contain {:?}",
            layer_jank,
            cycle_jank
        );
    }
}

// -- History --

fn run_cycle(timeline: &TestTimeline) -> Token {
    let token = timeline
        .token_manager()
        .generate_token(TimelineItem::from_millis(0, 10, 20));
    timeline.wake(token, HostTime::ZERO, Duration::from_millis(11));
    timeline.present(HostTime::from_millis(20), None);
    token
}

proptest! {
    #[test]
    fn history_never_exceeds_capacity(capacity in 0usize..16, cycles in 0usize..48) {
        let timeline = timeline(TimelineConfig::new().with_max_display_frames(capacity));
        for _ in 0..cycles {
            run_cycle(&timeline);
            prop_assert!(timeline.history_len() <= capacity);
        }
    }

    #[test]
    fn reduced_capacity_keeps_most_recent(
        initial in 1usize..32,
        filled in 0usize..32,
        k in 1usize..8,
    ) {
        let timeline = timeline(TimelineConfig::new().with_max_display_frames(initial));
        for _ in 0..filled {
            run_cycle(&timeline);
        }
        timeline.set_history_capacity(k);
        let recent: Vec<Token> = (0..=k).map(|_| run_cycle(&timeline)).collect();

        let retained: Vec<Token> = timeline
            .snapshot(DumpFilter::All)
            .frames
            .iter()
            .map(|f| f.record.token)
            .collect();
        prop_assert_eq!(retained.as_slice(), &recent[1..]);
    }
}
