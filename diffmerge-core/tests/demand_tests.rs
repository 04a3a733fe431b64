// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use diffmerge_core::DemandTracker;

#[test]
fn test_new_tracker_has_no_demand() {
    let demand = DemandTracker::new();
    assert!(!demand.has_demand());
    assert_eq!(demand.outstanding(), Some(0));
}

#[test]
fn test_consume_stops_at_zero() {
    let mut demand = DemandTracker::new();
    demand.add(3);

    assert!(demand.try_consume());
    assert!(demand.try_consume());
    assert!(demand.try_consume());
    assert!(!demand.try_consume());
    assert_eq!(demand.outstanding(), Some(0));
}

#[test]
fn test_add_accumulates() {
    let mut demand = DemandTracker::new();
    demand.add(2);
    assert_eq!(demand.add(5), 7);
    assert_eq!(demand.outstanding(), Some(7));
}

#[test]
fn test_add_saturates_to_unbounded() {
    let mut demand = DemandTracker::new();
    demand.add(10);
    demand.add(u64::MAX - 5);

    assert!(demand.is_unbounded());
    assert_eq!(demand.outstanding(), None);
}

#[test]
fn test_unbounded_is_never_consumed() {
    let mut demand = DemandTracker::unbounded();

    for _ in 0..1_000 {
        assert!(demand.try_consume());
    }

    assert!(demand.is_unbounded());
}

#[test]
fn test_unbounded_stays_unbounded_after_add() {
    let mut demand = DemandTracker::unbounded();
    demand.add(1);
    assert!(demand.is_unbounded());
}

#[test]
fn test_add_zero_is_noop() {
    let mut demand = DemandTracker::new();
    demand.add(0);
    assert!(!demand.has_demand());
}

#[test]
fn test_display() {
    let mut demand = DemandTracker::new();
    demand.add(4);
    assert_eq!(demand.to_string(), "4");
    assert_eq!(DemandTracker::unbounded().to_string(), "unbounded");
}
