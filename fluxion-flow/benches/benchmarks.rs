// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod filter_fuseable_bench;

use callable_bench::bench_callable;
use criterion::{criterion_group, criterion_main};
use filter_fuseable_bench::bench_filter_fuseable;

criterion_group!(flow_benches, bench_filter_fuseable, bench_callable);
criterion_main!(flow_benches);
