// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters

//! HISTORY retention integration tests
//!
//! KEEP_LAST bound, KEEP_ALL saturation and runtime policy switches.

use std::collections::VecDeque;

use qos_track::{ErrorKind, HistoryPolicy, HistoryWindow, InboundChannel, QosProfile, Sample};

#[test]
fn test_keep_last_matches_model() {
    let mut rng = fastrand::Rng::with_seed(7);
    for depth in [1u32, 2, 5, 17] {
        let mut window = HistoryWindow::new(HistoryPolicy::KeepLast(depth));
        let mut model: VecDeque<u32> = VecDeque::new();

        for _ in 0..500 {
            let value = rng.u32(..);
            let evicted = window.append(value).expect("keep_last never rejects");
            model.push_back(value);
            let expected = if model.len() > depth as usize { model.pop_front() } else { None };
            assert_eq!(evicted, expected);
            assert!(window.len() <= depth as usize);
        }
        assert_eq!(window.snapshot(None), model.iter().copied().collect::<Vec<_>>());
        assert_eq!(window.total_appended(), 500);
    }
}

#[test]
fn test_keep_all_saturates_without_mutation() {
    let mut window = HistoryWindow::new(HistoryPolicy::KeepAll(30));
    for seq in 0..30 {
        assert_eq!(window.append(Sample::new(seq, "HistoryPublisher")).expect("room"), None);
    }
    let full = window.snapshot(None);

    for seq in 30..40 {
        let err = window
            .append(Sample::new(seq, "HistoryPublisher"))
            .expect_err("capacity exhausted");
        assert_eq!(err.kind(), ErrorKind::CapacityExhausted);
    }
    assert_eq!(window.snapshot(None), full);
    assert_eq!(window.total_rejected(), 10);
    assert_eq!(window.total_appended(), 30);
}

#[test]
fn test_display_limit_returns_most_recent() {
    let mut window = HistoryWindow::new(HistoryPolicy::KeepAll(30));
    for seq in 0..12u32 {
        window.append(seq).expect("room");
    }
    assert_eq!(window.snapshot(Some(3)), vec![9, 10, 11]);
    assert_eq!(window.snapshot(Some(100)).len(), 12);
    assert!(window.snapshot(Some(0)).is_empty());
}

#[test]
fn test_switch_keep_all_to_keep_last_and_back() {
    let mut window = HistoryWindow::new(HistoryPolicy::KeepAll(30));
    for seq in 0..20u32 {
        window.append(seq).expect("room");
    }
    assert_eq!(window.set_policy(HistoryPolicy::KeepLast(5)), 15);
    assert_eq!(window.snapshot(None), vec![15, 16, 17, 18, 19]);

    // Growing the limit keeps everything buffered
    assert_eq!(window.set_policy(HistoryPolicy::KeepAll(30)), 0);
    assert_eq!(window.len(), 5);
    window.append(20).expect("room");
    assert_eq!(window.snapshot(Some(2)), vec![19, 20]);
}

#[test]
fn test_inbound_keep_all_counts_rejections() {
    let mut channel = InboundChannel::new("HistoryTopic", QosProfile::reliable().keep_all(3));
    let retained: Vec<bool> = (0..5)
        .map(|seq| channel.on_sample(Sample::new(seq, "HistoryPublisher")).retained)
        .collect();
    assert_eq!(retained, vec![true, true, true, false, false]);
    assert_eq!(channel.window().total_rejected(), 2);

    // Gap audit still covers the rejected samples
    let report = channel.tracker("HistoryPublisher").and_then(|t| t.report()).expect("tracked");
    assert_eq!(report.last_seen, 4);
    assert!(!report.has_gaps());
}
