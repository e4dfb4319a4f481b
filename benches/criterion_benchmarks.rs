use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use lzmatch::codec::{CompressOptions, Format};
use lzmatch::matching::config::{FindOptions, LZ10};
use lzmatch::matching::{FinderKind, MatchFinder};
use lzmatch::parser::{MatchParser, ParserKind};
use lzmatch::price::Lz10PriceCalculator;
use std::fs;
use std::path::Path;

const FINDERS: [FinderKind; 3] = [
    FinderKind::SuffixTree,
    FinderKind::NeedleHaystack,
    FinderKind::HashChain,
];

const PARSERS: [ParserKind; 3] = [
    ParserKind::Greedy,
    ParserKind::Optimal,
    ParserKind::BackwardForward,
];

fn gen_data(size: usize, seed: u64) -> Vec<u8> {
    let mut s = seed;
    let mut out = Vec::with_capacity(size);
    for _ in 0..size {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((s >> 33) as u8);
    }
    out
}

/// Compressible data: 1 KiB of noise repeated with a mutation every `stride`.
fn gen_repetitive(size: usize, stride: usize, seed: u64) -> Vec<u8> {
    let block = gen_data(1024, seed);
    let mut out: Vec<u8> = block.iter().copied().cycle().take(size).collect();
    for i in (0..out.len()).step_by(stride.max(1)) {
        out[i] = out[i].wrapping_add(1);
    }
    out
}

fn write_ratio_snapshot() {
    let data = gen_repetitive(256 * 1024, 97, 5);
    let mut csv = String::from("format,parser,finder,packed_bytes,input_bytes,ratio\n");
    for format in Format::ALL {
        for parser in PARSERS {
            for finder in FINDERS {
                let opts = CompressOptions {
                    parser,
                    finder,
                    chain_depth: 0,
                };
                let Ok(packed) = format.compress(&data, &opts) else {
                    continue;
                };
                let ratio = packed.len() as f64 / data.len() as f64;
                csv.push_str(&format!(
                    "{format},{},{},{},{},{ratio}\n",
                    parser.name(),
                    finder.name(),
                    packed.len(),
                    data.len()
                ));
            }
        }
    }
    let out_dir = Path::new("target/criterion/custom_reports");
    let _ = fs::create_dir_all(out_dir);
    let _ = fs::write(out_dir.join("ratio_snapshot.csv"), csv);
}

fn bench_finders(c: &mut Criterion) {
    let mut g = c.benchmark_group("finder_longest_match");
    let size = 64 * 1024;
    let data = gen_repetitive(size, 61, 1);
    g.throughput(Throughput::Bytes(size as u64));
    for kind in FINDERS {
        g.bench_with_input(BenchmarkId::from_parameter(kind.name()), &kind, |b, kind| {
            b.iter(|| {
                let mut finder = MatchFinder::new(*kind, LZ10.limitations).unwrap();
                let mut covered = 0usize;
                let mut pos = 0;
                while pos < data.len() {
                    match finder.find_longest_match(black_box(&data), pos).unwrap() {
                        Some(m) => {
                            covered += m.length;
                            pos = m.end();
                        }
                        None => pos += 1,
                    }
                }
                black_box(covered);
            });
        });
    }
    g.finish();
}

fn bench_parsers(c: &mut Criterion) {
    let mut g = c.benchmark_group("parser_speed");
    let size = 64 * 1024;
    let data = gen_repetitive(size, 113, 2);
    g.throughput(Throughput::Bytes(size as u64));
    for kind in PARSERS {
        g.bench_with_input(BenchmarkId::from_parameter(kind.name()), &kind, |b, kind| {
            b.iter(|| {
                let finder = MatchFinder::new(FinderKind::SuffixTree, LZ10.limitations).unwrap();
                let mut parser = MatchParser::new(
                    kind.with_price(Box::new(Lz10PriceCalculator)),
                    vec![finder],
                    FindOptions::default(),
                )
                .unwrap();
                black_box(parser.parse(black_box(&data)).unwrap());
            });
        });
    }
    g.finish();
}

fn bench_compress(c: &mut Criterion) {
    write_ratio_snapshot();
    let mut g = c.benchmark_group("compress_speed");
    for size in [16 * 1024usize, 128 * 1024] {
        let data = gen_repetitive(size, 211, 3);
        g.throughput(Throughput::Bytes(size as u64));
        for format in Format::ALL {
            g.bench_with_input(
                BenchmarkId::new(format.name(), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let packed = format
                            .compress(black_box(&data), &CompressOptions::default())
                            .unwrap();
                        black_box(packed);
                    });
                },
            );
        }
    }
    g.finish();
}

fn bench_decompress(c: &mut Criterion) {
    let mut g = c.benchmark_group("decompress_speed");
    let size = 1024 * 1024;
    let data = gen_repetitive(size, 389, 4);
    g.throughput(Throughput::Bytes(size as u64));
    for format in Format::ALL {
        let opts = CompressOptions {
            parser: ParserKind::Greedy,
            finder: FinderKind::HashChain,
            chain_depth: 64,
        };
        let packed = format.compress(&data, &opts).unwrap();
        g.bench_function(format.name(), |b| {
            b.iter(|| {
                let out = format.decompress(black_box(&packed)).unwrap();
                black_box(out);
            });
        });
    }
    g.finish();
}

fn bench_incompressible(c: &mut Criterion) {
    let mut g = c.benchmark_group("incompressible_input");
    let size = 32 * 1024;
    let data = gen_data(size, 9);
    g.throughput(Throughput::Bytes(size as u64));
    for kind in FINDERS {
        g.bench_with_input(BenchmarkId::from_parameter(kind.name()), &kind, |b, kind| {
            let opts = CompressOptions {
                finder: *kind,
                ..CompressOptions::default()
            };
            b.iter(|| black_box(Format::Lz10.compress(black_box(&data), &opts).unwrap()));
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_finders,
    bench_parsers,
    bench_compress,
    bench_decompress,
    bench_incompressible
);
criterion_main!(benches);
