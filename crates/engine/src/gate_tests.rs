// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn increase_takes_and_decrease_returns_slots() {
    let gate = ParallelismGate::new(2);
    assert_eq!(gate.current_parallelism(), 0);

    gate.increase().await;
    gate.increase().await;
    assert_eq!(gate.current_parallelism(), 2);

    gate.decrease();
    assert_eq!(gate.current_parallelism(), 1);
    assert_eq!(gate.counters(), (2, 1));
}

#[tokio::test]
async fn increase_blocks_at_capacity() {
    let gate = ParallelismGate::new(1);
    gate.increase().await;

    let blocked = {
        let gate = gate.clone();
        tokio::spawn(async move {
            gate.increase().await;
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!blocked.is_finished(), "second increase should block");

    gate.decrease();
    tokio::time::timeout(Duration::from_secs(1), blocked)
        .await
        .expect("unblocked after decrease")
        .expect("task completes");
    assert_eq!(gate.current_parallelism(), 1);
}

#[tokio::test]
async fn zero_parallelism_is_clamped_to_one() {
    let gate = ParallelismGate::new(0);
    assert_eq!(gate.capacity(), 1);
    gate.increase().await;
    assert_eq!(gate.current_parallelism(), 1);
}
