// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability over pedantic

//! OWNERSHIP arbitration integration tests
//!
//! Random activate/deactivate/toggle interleavings against a set model, plus
//! a command thread racing a data thread.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use qos_track::{Activation, ErrorKind, OwnershipArbiter, Sample};

const CONTROLLERS: [(&str, u32); 3] = [
    ("Manual Steering", 10),
    ("ADAS Controller", 20),
    ("Emergency Controller", 30),
];

#[test]
fn test_random_interleavings_match_set_model() {
    let mut rng = fastrand::Rng::with_seed(0xA5);
    let arbiter = OwnershipArbiter::new();
    for (name, strength) in CONTROLLERS {
        arbiter.register_producer(name, strength);
    }
    let mut model = BTreeSet::new();

    for step in 0..2_000 {
        let (name, strength) = CONTROLLERS[rng.usize(..CONTROLLERS.len())];
        match rng.u8(0..3) {
            0 => {
                assert_eq!(arbiter.activate(name, strength), Activation::Known);
                model.insert(strength);
            }
            1 => {
                arbiter.deactivate(name, strength);
                model.remove(&strength);
            }
            _ => {
                let now_active = arbiter.toggle(name, strength);
                if !model.remove(&strength) {
                    model.insert(strength);
                }
                assert_eq!(now_active, model.contains(&strength), "step {}", step);
            }
        }

        assert_eq!(arbiter.active_strengths(), model.iter().copied().collect::<Vec<_>>());
        for (id, s) in CONTROLLERS {
            assert_eq!(arbiter.is_authoritative(id, s), model.contains(&s));
        }
        assert_eq!(arbiter.highest_active_strength(), model.last().copied());
    }
}

#[test]
fn test_empty_active_set_admits_nothing() {
    let arbiter = OwnershipArbiter::new();
    for (name, strength) in CONTROLLERS {
        let sample = Sample::new(0, name).with_strength(strength);
        assert!(!arbiter.is_sample_authoritative(&sample));
    }
}

#[test]
fn test_multiple_active_strengths_all_admitted() {
    let arbiter = OwnershipArbiter::new();
    arbiter.activate("Manual Steering", 10);
    arbiter.activate("Emergency Controller", 30);

    assert!(arbiter.is_authoritative("Manual Steering", 10));
    assert!(arbiter.is_authoritative("Emergency Controller", 30));
    assert!(!arbiter.is_authoritative("ADAS Controller", 20));
}

#[test]
fn test_unknown_producer_is_not_an_error_until_escalated() {
    let arbiter = OwnershipArbiter::new();
    let outcome = arbiter.activate("Ghost Controller", 40);
    assert_eq!(outcome, Activation::UnknownProducer("Ghost Controller".into()));
    assert!(arbiter.is_authoritative("anyone", 40));

    let err = outcome.into_result().expect_err("escalated");
    assert_eq!(err.kind(), ErrorKind::UnknownProducer);
}

#[test]
fn test_sample_strength_resolved_from_producer_table() {
    let arbiter = OwnershipArbiter::new();
    arbiter.register_producer("ADAS Controller", 20);
    arbiter.activate("ADAS Controller", 20);

    assert!(arbiter.is_sample_authoritative(&Sample::new(1, "ADAS Controller")));
    assert!(!arbiter.is_sample_authoritative(&Sample::new(1, "Unregistered")));
}

#[test]
fn test_command_thread_races_data_thread() {
    let arbiter = Arc::new(OwnershipArbiter::new());
    arbiter.activate("Manual Steering", 10);
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let arbiter = Arc::clone(&arbiter);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut checks = 0u64;
            while !done.load(Ordering::Acquire) {
                // Strength 10 is never touched by the command thread
                assert!(arbiter.is_authoritative("Manual Steering", 10));
                let _ = arbiter.is_authoritative("ADAS Controller", 20);
                checks += 1;
            }
            checks
        })
    };

    for _ in 0..1_000 {
        arbiter.toggle("ADAS Controller", 20);
    }
    done.store(true, Ordering::Release);
    reader.join().expect("reader thread");

    // Even number of toggles: back to the initial state
    assert_eq!(arbiter.active_strengths(), vec![10]);
}
