// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![expect(missing_docs, reason = "Benchmark code")]

use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use poolbuf::{MemoryPool, PoolBuffer, SystemPool};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

const ONE_MB: usize = 1024 * 1024;

fn entrypoint(c: &mut Criterion) {
    let pool: Arc<dyn MemoryPool> = Arc::new(SystemPool::new());

    let mut group = c.benchmark_group("PoolBuffer");

    group.bench_function("resize_1mb_once", |b| {
        b.iter(|| {
            let mut buf = PoolBuffer::new(Arc::clone(&pool));
            buf.resize(ONE_MB).expect("allocation failed");
            buf.as_mut_slice().fill(66);
        });
    });

    group.bench_function("grow_1mb_doubling", |b| {
        b.iter(|| {
            let mut buf = PoolBuffer::new(Arc::clone(&pool));

            let mut len = 64;
            while len <= ONE_MB {
                buf.resize(len).expect("allocation failed");
                len *= 2;
            }
        });
    });

    group.bench_function("slice_1000_views", |b| {
        let mut buf = PoolBuffer::new(Arc::clone(&pool));
        buf.resize(ONE_MB).expect("allocation failed");
        let parent = Arc::new(buf.freeze());

        b.iter(|| {
            for i in 0..1000 {
                let slice = parent.slice(i, 64);
                std::hint::black_box(slice.as_slice());
            }
        });
    });

    group.finish();
}
