use std::{hint::black_box, time::Duration};

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use subpub::{Bus, Message};
use subpub_error::SubPubResult;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

fn noop(_msg: Message) -> std::future::Ready<()> {
    std::future::ready(())
}

fn bench_publish_0_subs(c: &mut Criterion) {
    let rt = runtime();
    let bus = Bus::builder().runtime(rt.handle().clone()).build().unwrap();
    let payload = Bytes::from_static(b"x");

    c.bench_function("publish_0_subs", |b| {
        b.iter(|| {
            let res: SubPubResult<()> = bus.publish("chan", black_box(payload.clone()));
            res.unwrap();
        })
    });
}

fn bench_publish_fan_out(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("publish_fan_out");
    group.throughput(Throughput::Elements(1));

    for subscribers in [1usize, 10, 100] {
        let bus = Bus::builder().runtime(rt.handle().clone()).build().unwrap();
        for _ in 0..subscribers {
            bus.subscribe("chan", noop).unwrap();
        }
        let payload = Bytes::from_static(b"payload");

        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                b.iter(|| bus.publish("chan", black_box(payload.clone())).unwrap());
            },
        );

        rt.block_on(bus.close(Duration::from_secs(10))).unwrap();
    }
    group.finish();
}

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let rt = runtime();
    let bus = Bus::builder().runtime(rt.handle().clone()).build().unwrap();

    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            let sub = bus.subscribe("chan", noop).unwrap();
            sub.unsubscribe();
        })
    });
}

fn bench_publish_and_close(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("publish_and_close");
    group.sample_size(20);

    for messages in [100usize, 1_000] {
        group.throughput(Throughput::Elements(messages as u64));
        group.bench_with_input(BenchmarkId::from_parameter(messages), &messages, |b, &n| {
            b.iter(|| {
                let bus = Bus::builder().runtime(rt.handle().clone()).build().unwrap();
                bus.subscribe("chan", noop).unwrap();
                for _ in 0..n {
                    bus.publish("chan", Bytes::from_static(b"m")).unwrap();
                }
                rt.block_on(bus.close(Duration::from_secs(10))).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_publish_0_subs,
    bench_publish_fan_out,
    bench_subscribe_unsubscribe,
    bench_publish_and_close
);
criterion_main!(benches);
