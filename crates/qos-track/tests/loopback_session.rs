// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability over pedantic

//! End-to-end sessions over the loopback transport
//!
//! Producer and consumer run on separate threads the way an application
//! would drive them: one consumer thread per channel, stopped either by
//! the producers hanging up or by a shutdown signal.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::Receiver;
use qos_track::{
    run_consumer, ConsumerExit, InboundChannel, LoopbackTransport, OutboundChannel,
    OwnershipArbiter, QosProfile, Sample, Shutdown,
};

fn spawn_consumer(
    mut channel: InboundChannel,
    rx: Receiver<Sample>,
    shutdown: Shutdown,
) -> thread::JoinHandle<(InboundChannel, ConsumerExit)> {
    thread::spawn(move || {
        let exit = run_consumer(&rx, &shutdown, |sample| {
            channel.on_sample(sample);
        });
        (channel, exit)
    })
}

#[test]
fn test_lossy_reliable_session_reports_gaps() {
    let transport = Arc::new(LoopbackTransport::new());
    transport.set_drop_filter(|_, s| matches!(s.sequence_number, 0 | 3 | 6));

    let consumer = spawn_consumer(
        InboundChannel::new("ReliableTopic", QosProfile::reliable().keep_all(30)),
        transport.subscribe("ReliableTopic"),
        Shutdown::new(),
    );

    let mut producer =
        OutboundChannel::new("ReliableTopic", QosProfile::reliable(), Arc::clone(&transport));
    for _ in 0..8 {
        producer.publish_next("Reliability_Publisher", Vec::new()).expect("published");
    }
    drop(producer);
    drop(transport);

    let (channel, exit) = consumer.join().expect("consumer thread");
    assert_eq!(exit, ConsumerExit::Disconnected);

    let report = channel.tracker("Reliability_Publisher").and_then(|t| t.report()).expect("tracked");
    assert_eq!(report.first_seen, 1);
    assert_eq!(report.last_seen, 7);
    assert_eq!(report.missing().collect::<Vec<_>>(), vec![3, 6]);
    assert_eq!(channel.history(None).len(), 5);
}

#[test]
fn test_best_effort_gap_audit_sees_lost_samples() {
    let transport = Arc::new(LoopbackTransport::new());
    transport.set_drop_filter(|_, s| (s.sequence_number + 1) % 3 == 0);

    let consumer = spawn_consumer(
        InboundChannel::new("BestEffortTopic", QosProfile::best_effort().keep_last(9))
            .with_gap_audit(),
        transport.subscribe("BestEffortTopic"),
        Shutdown::new(),
    );

    let mut producer = OutboundChannel::new(
        "BestEffortTopic",
        QosProfile::best_effort(),
        Arc::clone(&transport),
    );
    for _ in 0..9 {
        producer.publish_next("BestEffort_Publisher", Vec::new()).expect("published");
    }
    drop(producer);
    drop(transport);

    let (channel, _) = consumer.join().expect("consumer thread");
    assert_eq!(channel.accepted_count(), 6);
    let report = channel
        .tracker("BestEffort_Publisher")
        .and_then(|t| t.report())
        .expect("audited");
    // #8 is the last one lost, so only the interior losses show up
    assert_eq!(report.missing().collect::<Vec<_>>(), vec![2, 5]);
    assert_eq!(report.last_seen, 7);
}

#[test]
fn test_exclusive_gaps_are_per_producer() {
    let transport = Arc::new(LoopbackTransport::new());
    // ADAS loses #1; Manual delivers its own #1
    transport.set_drop_filter(|_, s| s.producer_id == "ADAS Controller" && s.sequence_number == 1);
    let rx = transport.subscribe("SteeringControl");
    let arbiter = Arc::new(OwnershipArbiter::new());
    arbiter.activate("Manual Steering", 10);
    let mut consumer = InboundChannel::with_arbiter(
        "SteeringControl",
        QosProfile::reliable().keep_last(5).exclusive(0),
        Arc::clone(&arbiter),
    );

    let mut manual = OutboundChannel::new(
        "SteeringControl",
        QosProfile::reliable().exclusive(10),
        Arc::clone(&transport),
    );
    let mut adas = OutboundChannel::new(
        "SteeringControl",
        QosProfile::reliable().exclusive(20),
        Arc::clone(&transport),
    );
    for _ in 0..3 {
        manual.publish_next("Manual Steering", Vec::new()).expect("published");
        adas.publish_next("ADAS Controller", Vec::new()).expect("published");
    }
    for sample in rx.try_iter() {
        consumer.on_sample(sample);
    }

    let manual_report = consumer.tracker("Manual Steering").and_then(|t| t.report());
    assert!(!manual_report.expect("tracked").has_gaps());
    // Tracked even though ADAS is not authoritative
    let adas_report = consumer.tracker("ADAS Controller").and_then(|t| t.report());
    assert_eq!(adas_report.expect("tracked").missing().collect::<Vec<_>>(), vec![1]);
    assert_eq!(consumer.accepted_count(), 3);
}

#[test]
fn test_paused_producer_leaves_gaps_but_delivers_criticals() {
    let transport = Arc::new(LoopbackTransport::new());
    let consumer = spawn_consumer(
        InboundChannel::new("ReliableTopic", QosProfile::reliable().keep_all(30)),
        transport.subscribe("ReliableTopic"),
        Shutdown::new(),
    );

    let mut producer =
        OutboundChannel::new("ReliableTopic", QosProfile::reliable(), Arc::clone(&transport));
    for seq in 0..12 {
        if seq == 3 {
            producer.pause();
        }
        if seq == 8 {
            let pending = producer.resume();
            assert_eq!(pending.iter().map(|s| s.sequence_number).collect::<Vec<_>>(), vec![5]);
        }
        producer.publish_next("Reliability_Publisher", Vec::new()).expect("offer");
    }
    drop(producer);
    drop(transport);

    let (channel, _) = consumer.join().expect("consumer thread");
    let arrived: Vec<u32> = channel.history(None).iter().map(|s| s.sequence_number).collect();
    assert_eq!(arrived, vec![0, 1, 2, 5, 8, 9, 10, 11]);

    let tracker = channel.tracker("Reliability_Publisher").expect("reliable");
    let report = tracker.report().expect("tracked");
    assert_eq!(report.missing().collect::<Vec<_>>(), vec![3, 4, 6, 7]);
    assert_eq!(tracker.critical_received().collect::<Vec<_>>(), vec![0, 5, 10]);
}

#[test]
fn test_exclusive_steering_follows_active_set() {
    let transport = Arc::new(LoopbackTransport::new());
    let rx = transport.subscribe("SteeringControl");
    let arbiter = Arc::new(OwnershipArbiter::new());
    let mut consumer = InboundChannel::with_arbiter(
        "SteeringControl",
        QosProfile::reliable().keep_last(10).exclusive(0),
        Arc::clone(&arbiter),
    );

    let mut producers: Vec<_> = [("Manual Steering", 10), ("ADAS Controller", 20)]
        .into_iter()
        .map(|(name, strength)| {
            let channel = OutboundChannel::new(
                "SteeringControl",
                QosProfile::reliable().exclusive(strength),
                Arc::clone(&transport),
            );
            (name, channel)
        })
        .collect();

    let mut round = |consumer: &mut InboundChannel| -> Vec<String> {
        for (name, producer) in &mut producers {
            producer.publish_next(*name, Vec::new()).expect("published");
        }
        rx.try_iter()
            .map(|s| consumer.on_sample(s))
            .zip(["Manual Steering", "ADAS Controller"])
            .filter(|(d, _)| d.authoritative)
            .map(|(_, name)| name.to_string())
            .collect()
    };

    arbiter.activate("Manual Steering", 10);
    assert_eq!(round(&mut consumer), vec!["Manual Steering"]);

    arbiter.activate("ADAS Controller", 20);
    assert_eq!(round(&mut consumer), vec!["Manual Steering", "ADAS Controller"]);

    arbiter.deactivate("Manual Steering", 10);
    arbiter.deactivate("ADAS Controller", 20);
    assert!(round(&mut consumer).is_empty());

    assert_eq!(consumer.accepted_count(), 3);
}

#[test]
fn test_shutdown_stops_idle_consumer() {
    let transport = Arc::new(LoopbackTransport::new());
    let shutdown = Shutdown::new();
    let consumer = spawn_consumer(
        InboundChannel::new("HistoryTopic", QosProfile::default()),
        transport.subscribe("HistoryTopic"),
        shutdown.clone(),
    );

    let mut producer =
        OutboundChannel::new("HistoryTopic", QosProfile::default(), Arc::clone(&transport));
    producer.publish_next("HistoryPublisher", Vec::new()).expect("published");

    // Give the consumer a chance to drain before stopping it
    assert!(!shutdown.wait_timeout(Duration::from_millis(50)));
    shutdown.trigger();

    let (channel, exit) = consumer.join().expect("consumer thread");
    assert_eq!(exit, ConsumerExit::Shutdown);
    assert!(channel.accepted_count() <= 1);
    // Producer side is still alive
    assert_eq!(transport.subscriber_count("HistoryTopic"), 1);
}
