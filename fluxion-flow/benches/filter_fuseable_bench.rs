// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use criterion::{BenchmarkId, Criterion, Throughput};
use fluxion_flow::{PublisherArray, PublisherFilterFuseable, PublisherStream};
use fluxion_flow_core::{FluxionError, Publisher, Subscriber, SubscriptionHandle};
use futures::executor::block_on_stream;
use std::hint::black_box;

/// Requests in fixed batches and only looks at the values.
struct Sink {
    batch: u64,
    subscription: Option<SubscriptionHandle<u64>>,
    received: u64,
}

impl Subscriber<u64> for Sink {
    fn on_subscribe(&mut self, subscription: SubscriptionHandle<u64>) {
        subscription.request(self.batch);
        self.subscription = Some(subscription);
    }

    fn on_next(&mut self, value: u64) {
        black_box(value);
        self.received += 1;
        if self.received % self.batch == 0 {
            if let Some(subscription) = &self.subscription {
                subscription.request(self.batch);
            }
        }
    }

    fn on_error(&mut self, error: FluxionError) {
        black_box(error);
    }

    fn on_complete(&mut self) {}
}

fn make_filter(
    size: usize,
    keep_every: u64,
) -> PublisherFilterFuseable<u64, PublisherArray<u64>, impl Fn(&u64) -> bool + Send + Sync> {
    let values: Vec<u64> = (0..size as u64).collect();
    PublisherFilterFuseable::new(PublisherArray::new(values), move |n: &u64| {
        n % keep_every == 0
    })
    .unwrap()
}

pub fn bench_filter_fuseable(c: &mut Criterion) {
    let sizes = [100usize, 1000usize, 10000];
    let keep_every = [1u64, 2u64, 10u64]; // 1 = nothing filtered, 10 = 90% filtered

    let mut group = c.benchmark_group("filter_fuseable_push");
    for &size in &sizes {
        for &keep in &keep_every {
            let id = BenchmarkId::from_parameter(format!("m{size}_keep{keep}"));
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(id, &(size, keep), |bencher, &(size, keep)| {
                let filter = make_filter(size, keep);
                bencher.iter(|| {
                    filter.subscribe(fluxion_flow_core::Downstream::plain(Sink {
                        batch: 32,
                        subscription: None,
                        received: 0,
                    }));
                });
            });
        }
    }
    group.finish();

    let mut group = c.benchmark_group("filter_fuseable_fused_stream");
    for &size in &sizes {
        for &keep in &keep_every {
            let id = BenchmarkId::from_parameter(format!("m{size}_keep{keep}"));
            group.throughput(Throughput::Elements(size as u64));
            group.bench_with_input(id, &(size, keep), |bencher, &(size, keep)| {
                let filter = make_filter(size, keep);
                bencher.iter(|| {
                    let stream = PublisherStream::new(&filter, 32).unwrap();
                    for item in block_on_stream(stream) {
                        black_box(item);
                    }
                });
            });
        }
    }
    group.finish();
}
