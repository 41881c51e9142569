//! Benchmarks for decoding and encoding whole documents.

use aas_codec::model::{DataTypeDefXsd, Value};
use aas_codec::{decode_document, encode_document, DecodeOptions, EncodeOptions, Environment, Format};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

const FULL: &str = include_str!("../tests/fixtures/full.json");

fn fixture() -> Environment {
    decode_document(Format::Json, FULL.as_bytes(), &DecodeOptions::strict()).unwrap_or_default()
}

fn encoded(format: Format, env: &Environment) -> Vec<u8> {
    let mut out = Vec::new();
    let _ = encode_document(format, env, &mut out, &EncodeOptions::new());
    out
}

fn bench_decode(c: &mut Criterion) {
    let env = fixture();
    let mut group = c.benchmark_group("decode");

    for format in Format::ALL {
        let bytes = encoded(format, &env);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        for (mode, options) in [
            ("failsafe", DecodeOptions::failsafe()),
            ("strict", DecodeOptions::strict()),
            ("stripped", DecodeOptions::strict().with_stripped(true)),
        ] {
            group.bench_function(format!("{format}_{mode}"), |b| {
                b.iter(|| black_box(decode_document(format, black_box(bytes.as_slice()), &options)));
            });
        }
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let env = fixture();
    let mut group = c.benchmark_group("encode");

    for format in Format::ALL {
        for (mode, options) in [
            ("pretty", EncodeOptions::new()),
            ("compact", EncodeOptions::new().with_pretty(false)),
        ] {
            group.bench_function(format!("{format}_{mode}"), |b| {
                b.iter(|| {
                    let mut out = Vec::with_capacity(FULL.len());
                    let _ = encode_document(format, black_box(&env), &mut out, &options);
                    black_box(out)
                });
            });
        }
    }

    group.finish();
}

fn bench_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("values");
    group.throughput(Throughput::Elements(1));

    for (data_type, text) in [
        (DataTypeDefXsd::Double, "23.5"),
        (DataTypeDefXsd::Long, "-9223372036854775808"),
        (DataTypeDefXsd::DateTime, "2020-01-01T12:30:00.250+00:00"),
        (DataTypeDefXsd::Duration, "P1Y2M3DT4H5M6.5S"),
        (DataTypeDefXsd::Base64Binary, "aGVsbG8gd29ybGQ="),
    ] {
        group.bench_function(format!("parse_{data_type}"), |b| {
            b.iter(|| black_box(Value::parse(data_type, black_box(text))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode, bench_values);
criterion_main!(benches);
