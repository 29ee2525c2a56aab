use std::fmt::Write;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grindtree::convert::{self, Options};
use grindtree::filter::Filter;

const HEADER: &str = "version: 1\ncmd: /bench.php\npart: 1\n\nevents: Time Memory Cycles Peakmemory\n\n";

/// Append the blocks of a call tree with `fanout` calls per level, `depth` levels deep, in
/// profile order (callees before callers).
fn blocks(out: &mut String, depth: usize, fanout: usize, name: &str) {
    let callees: Vec<String> = if depth == 0 {
        Vec::new()
    } else {
        (0..fanout).map(|i| format!("{}_{}", name, i)).collect()
    };
    for callee in &callees {
        blocks(out, depth - 1, fanout, callee);
    }

    let _ = write!(out, "fl=/srv/{}.php\nfn={}\n1 {} 128 0 256\n", depth % 7, name, 10 + depth);
    for callee in &callees {
        let _ = write!(out, "cfn={}\ncalls=1 0 0\n1 0 0 0 0\n", callee);
    }
    out.push('\n');
}

/// A profile of `parts` runs of the same request.
fn synthetic(parts: usize, depth: usize, fanout: usize) -> String {
    let mut out = String::new();
    for part in 0..parts {
        if part > 0 {
            out.push_str("==== NEW PROFILING FILE ==============================\n");
        }
        out.push_str(HEADER);
        blocks(&mut out, depth, fanout, "handler");
        out.push_str("fl=/srv/index.php\nfn={main}\n\nsummary: 1000000 1024 0 4096\n\n0 5 64 0 64\n");
        out.push_str("cfn=handler\ncalls=1 0 0\n1 0 0 0 0\n\n");
    }
    out
}

fn aggregate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    for &(id, parts, depth, fanout) in &[("wide", 1, 3, 12), ("deep", 1, 14, 2), ("parts", 8, 5, 4)] {
        let input = synthetic(parts, depth, fanout);
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("plain", id), &input, |b, input| {
            b.iter(|| convert::aggregate(input, &Options::default()).unwrap())
        });

        let filtered = Options {
            filters: vec![Filter::NoPhp, Filter::TimeThreshold(0.001), Filter::Depth(6)],
            ..Options::default()
        };
        group.bench_with_input(BenchmarkId::new("filtered", id), &input, |b, input| {
            b.iter(|| convert::aggregate(input, &filtered).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, aggregate_benchmark);
criterion_main!(benches);
