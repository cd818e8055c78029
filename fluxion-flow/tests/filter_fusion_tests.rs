// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use fluxion_flow::{PublisherArray, PublisherCallable, PublisherFilterFuseable};
use fluxion_flow_core::{Fatal, FluxionError, Publisher};
use fluxion_flow_test_utils::{ManualPublisher, TestProbe, TestSubscriber};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Barrier};
use std::thread;

fn push_all<P: Publisher<u32>>(publisher: &P, rng: &mut fastrand::Rng) -> TestProbe<u32> {
    let subscriber = TestSubscriber::new().with_request(rng.u64(1..5));
    let probe = subscriber.probe();
    publisher.subscribe(subscriber.into_downstream());

    while probe.terminations() == 0 {
        probe.request(rng.u64(1..5));
    }
    probe
}

fn pull_all<P: Publisher<u32>>(publisher: &P) -> anyhow::Result<Vec<u32>> {
    let subscriber = TestSubscriber::new().request_sync_fusion();
    let probe = subscriber.probe();
    publisher.subscribe(subscriber.into_downstream());

    assert!(probe.is_fused());
    Ok(probe.poll_all()?)
}

#[test]
fn test_push_and_pull_deliver_the_same_values() -> anyhow::Result<()> {
    // Arrange
    let mut rng = fastrand::Rng::with_seed(0x5eed);

    for _ in 0..64 {
        let len = rng.usize(0..40);
        let values: Vec<u32> = (0..len).map(|_| rng.u32(0..100)).collect();
        let divisor = rng.u32(1..5);
        let expected: Vec<u32> = values.iter().copied().filter(|n| n % divisor == 0).collect();

        let filter = PublisherFilterFuseable::new(PublisherArray::new(values), move |n: &u32| {
            n % divisor == 0
        })?;

        // Act
        let pushed = push_all(&filter, &mut rng);
        let pulled = pull_all(&filter)?;

        // Assert
        assert_eq!(pushed.values(), expected);
        assert_eq!(pushed.completions(), 1);
        assert!(pushed.errors().is_empty());
        assert_eq!(pulled, expected);
    }
    Ok(())
}

#[test]
fn test_rejected_values_do_not_consume_array_demand() -> anyhow::Result<()> {
    // Arrange
    let filter =
        PublisherFilterFuseable::new(PublisherArray::new(vec![1, 3, 5, 6, 7, 8, 9, 10]), |n: &u32| {
            n % 2 == 0
        })?;
    let subscriber = TestSubscriber::new().with_request(2);
    let probe = subscriber.probe();

    // Act
    filter.subscribe(subscriber.into_downstream());

    // Assert
    assert_eq!(probe.values(), vec![6, 8]);
    assert_eq!(probe.completions(), 0);

    probe.request(1);
    assert_eq!(probe.values(), vec![6, 8, 10]);
    assert_eq!(probe.completions(), 1);
    Ok(())
}

#[test]
fn test_filters_can_be_stacked() -> anyhow::Result<()> {
    // Arrange
    let evens = PublisherFilterFuseable::new(PublisherArray::new((1..=20).collect::<Vec<u32>>()), |n: &u32| {
        n % 2 == 0
    })?;
    let by_three = PublisherFilterFuseable::new(evens, |n: &u32| n % 3 == 0)?;

    // Act
    let mut rng = fastrand::Rng::with_seed(3);
    let pushed = push_all(&by_three, &mut rng);
    let pulled = pull_all(&by_three)?;

    // Assert
    assert_eq!(pushed.values(), vec![6, 12, 18]);
    assert_eq!(pulled, vec![6, 12, 18]);
    Ok(())
}

#[test]
fn test_peek_skips_and_drops_rejected_values() -> anyhow::Result<()> {
    // Arrange
    let publisher = ManualPublisher::fuseable().grant_fusion();
    publisher.queue([1, 3, 4, 5, 6]);
    let filter = PublisherFilterFuseable::new(publisher.clone(), |n: &u32| n % 2 == 0)?;
    let subscriber = TestSubscriber::new().request_sync_fusion();
    let probe = subscriber.probe();
    filter.subscribe(subscriber.into_downstream());
    let handle = probe
        .subscription()
        .ok_or_else(|| anyhow::anyhow!("subscriber was not subscribed"))?;
    let queue = handle
        .as_fuseable()
        .ok_or_else(|| anyhow::anyhow!("filter must be fuseable"))?;

    // Act & Assert
    assert!(probe.is_fused());
    assert_eq!(queue.peek()?, Some(4));
    assert_eq!(queue.peek()?, Some(4));
    assert_eq!(queue.poll()?, Some(4));
    assert!(!queue.is_empty()?);
    queue.drop_peeked();
    assert!(queue.is_empty()?);
    assert_eq!(queue.poll()?, None);
    assert!(publisher.requests().is_empty());
    Ok(())
}

#[test]
fn test_fusion_is_refused_when_the_source_refuses() -> anyhow::Result<()> {
    // Arrange
    let publisher = ManualPublisher::fuseable();
    let filter = PublisherFilterFuseable::new(publisher.clone(), |n: &u32| n % 2 == 0)?;
    let subscriber = TestSubscriber::new().request_sync_fusion().with_request(4);
    let probe = subscriber.probe();

    // Act
    filter.subscribe(subscriber.into_downstream());

    // Assert
    assert!(!probe.is_fused());
    assert_eq!(publisher.requests(), vec![4]);
    Ok(())
}

#[test]
fn test_clear_discards_remaining_values() -> anyhow::Result<()> {
    // Arrange
    let filter = PublisherFilterFuseable::new(PublisherArray::new(vec![2_u32, 4, 6]), |_: &u32| true)?;
    let subscriber = TestSubscriber::new().request_sync_fusion();
    let probe = subscriber.probe();
    filter.subscribe(subscriber.into_downstream());
    let handle = probe
        .subscription()
        .ok_or_else(|| anyhow::anyhow!("subscriber was not subscribed"))?;
    let queue = handle
        .as_fuseable()
        .ok_or_else(|| anyhow::anyhow!("filter must be fuseable"))?;

    // Act
    let first = queue.poll()?;
    queue.clear();

    // Assert
    assert_eq!(first, Some(2));
    assert_eq!(queue.poll()?, None);
    Ok(())
}

#[test]
fn test_pull_returns_predicate_failures() -> anyhow::Result<()> {
    // Arrange
    let filter = PublisherFilterFuseable::new(PublisherArray::new(vec![2_u32, 4, 5, 6]), |n: &u32| {
        assert!(n % 2 == 0, "odd value {n}");
        true
    })?;
    let subscriber = TestSubscriber::new().request_sync_fusion();
    let probe = subscriber.probe();
    filter.subscribe(subscriber.into_downstream());

    // Act
    let outcome = probe.poll_all();

    // Assert
    assert!(matches!(
        outcome,
        Err(FluxionError::CallbackPanic { ref context }) if context == "odd value 5"
    ));
    assert!(probe.errors().is_empty());
    Ok(())
}

#[test]
fn test_pull_rethrows_fatal_failures() -> anyhow::Result<()> {
    // Arrange
    let filter = PublisherFilterFuseable::new(PublisherArray::new(vec![1_u32]), |_: &u32| -> bool {
        Fatal::raise("stack overflow")
    })?;
    let subscriber = TestSubscriber::new().request_sync_fusion();
    let probe = subscriber.probe();
    filter.subscribe(subscriber.into_downstream());

    // Act
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| probe.poll_all()));

    // Assert
    let payload = outcome.expect_err("fatal failures must unwind");
    assert_eq!(
        payload.downcast_ref::<Fatal>().map(Fatal::reason),
        Some("stack overflow")
    );
    Ok(())
}

#[test]
fn test_filter_over_callable_completes_after_rejection() -> anyhow::Result<()> {
    // Arrange
    let odd = PublisherCallable::new(|| Ok(Some(3_u32)));
    let filter = PublisherFilterFuseable::new(odd, |n: &u32| n % 2 == 0)?;
    let subscriber = TestSubscriber::new().with_request(1);
    let probe = subscriber.probe();

    // Act
    filter.subscribe(subscriber.into_downstream());

    // Assert
    assert!(probe.values().is_empty());
    assert_eq!(probe.completions(), 1);
    Ok(())
}

#[test]
fn test_concurrent_requests_through_filter_keep_order() -> anyhow::Result<()> {
    // Arrange
    let filter = PublisherFilterFuseable::new(
        PublisherArray::new((0..999).collect::<Vec<u32>>()),
        |n: &u32| n % 2 == 0,
    )?;
    let subscriber = TestSubscriber::new();
    let probe = subscriber.probe();
    filter.subscribe(subscriber.into_downstream());
    let barrier = Arc::new(Barrier::new(4));

    // Act
    let requesters: Vec<_> = (0..4)
        .map(|_| {
            let probe = probe.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..125 {
                    probe.request(1);
                }
            })
        })
        .collect();
    for requester in requesters {
        requester
            .join()
            .map_err(|_| anyhow::anyhow!("requester thread panicked"))?;
    }

    // Assert
    let evens: Vec<u32> = (0..999).filter(|n| n % 2 == 0).collect();
    assert_eq!(probe.values(), evens);
    assert_eq!(probe.completions(), 1);
    Ok(())
}
