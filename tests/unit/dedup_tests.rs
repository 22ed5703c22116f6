//! Unit tests for the seen-event set.

use std::sync::Arc;
use std::thread;

use grocer_bot::gateway::dedup::SeenEvents;

#[test]
fn first_delivery_is_admitted_once() {
    let seen = SeenEvents::new();
    assert!(seen.is_empty());
    assert!(seen.first_delivery("Ev01"));
    assert!(!seen.first_delivery("Ev01"));
    assert!(!seen.first_delivery("Ev01"));
    assert_eq!(seen.len(), 1);
}

#[test]
fn distinct_events_are_tracked_separately() {
    let seen = SeenEvents::new();
    assert!(seen.first_delivery("Ev01"));
    assert!(seen.first_delivery("Ev02"));
    assert!(seen.contains("Ev01"));
    assert!(seen.contains("Ev02"));
    assert!(!seen.contains("Ev03"));
    assert_eq!(seen.len(), 2);
}

#[test]
fn clones_share_the_same_set() {
    let seen = SeenEvents::new();
    let other = seen.clone();
    assert!(seen.first_delivery("Ev01"));
    assert!(!other.first_delivery("Ev01"));
    assert_eq!(other.len(), 1);
}

#[test]
fn concurrent_deliveries_admit_exactly_one() {
    let seen = Arc::new(SeenEvents::new());
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let seen = Arc::clone(&seen);
            thread::spawn(move || seen.first_delivery("EvRace"))
        })
        .collect();

    let admitted = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread"))
        .filter(|admitted| *admitted)
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(seen.len(), 1);
}
