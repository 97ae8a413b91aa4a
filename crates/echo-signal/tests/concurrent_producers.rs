// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
use std::thread;

use echo_signal::{BoundSphere, BroadcastBatch, Handle, SignalDesc, Vec3};
use echo_signal_dry_tests::SceneBuilder;

const WORKERS: u64 = 8;
const PER_WORKER: u64 = 50;

#[test]
fn scoped_producers_then_dispatch() {
    let (mut bus, log) = SceneBuilder::new().line(1, 4, 1.0).build().unwrap();

    thread::scope(|s| {
        for w in 0..WORKERS {
            let bus = &bus;
            s.spawn(move || {
                for i in 0..PER_WORKER {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    let desc = SignalDesc::new("work/item").with_priority((w * 100 + i) as i32);
                    match i % 3 {
                        0 => bus.broadcast_global(&desc),
                        1 => bus.broadcast_targeted(&desc, Handle::new(1 + i % 4).unwrap()),
                        _ => bus.broadcast_spatial(&desc, BoundSphere::new(Vec3::ZERO, 1.0)),
                    }
                }
            });
        }
    });

    let pending = bus.pending();
    assert_eq!(pending.total() as u64, WORKERS * PER_WORKER);

    let report = bus.dispatch();
    assert_eq!(report.dropped, 0);
    assert_eq!(report.delivered, log.len());
    let priorities: Vec<i32> = log.snapshot().iter().map(|d| d.priority).collect();
    assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn worker_batches_merge_under_one_lock_each() {
    let (mut bus, log) = SceneBuilder::new().placed(1, Vec3::ZERO).build().unwrap();

    thread::scope(|s| {
        for _ in 0..WORKERS {
            let bus = &bus;
            s.spawn(move || {
                let mut batch = BroadcastBatch::new();
                for _ in 0..PER_WORKER {
                    batch.targeted(&SignalDesc::new("hit"), Handle::new(1).unwrap());
                }
                bus.submit(&mut batch);
            });
        }
    });

    let report = bus.dispatch();
    assert_eq!(report.entries as u64, WORKERS * PER_WORKER);
    assert_eq!(log.len() as u64, WORKERS * PER_WORKER);
}
