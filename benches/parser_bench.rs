use criterion::{black_box, criterion_group, criterion_main, Criterion};

use abi_codec::{decode, AbiSource, CallOptions, Input, Parser, SliceParser};

const ABI: &str = r#"{
    "version": "eosio::abi/1.1",
    "structs": [
        {"name": "foo", "base": "", "fields": [
            {"name": "one", "type": "string"},
            {"name": "two", "type": "int8"}
        ]},
        {"name": "bar", "base": "foo", "fields": [
            {"name": "three", "type": "name?"},
            {"name": "four", "type": "string[]?"}
        ]}
    ]
}"#;

const BAR: [u8; 24] = [
    0x03, 0x6f, 0x6e, 0x65, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x28, 0xcf, 0x01, 0x04,
    0x01, 0x66, 0x01, 0x6f, 0x01, 0x75, 0x01, 0x72,
];

const VARINTS: [u8; 15] = [
    0x00, 0x7f, 0x80, 0x01, 0xac, 0x02, 0xff, 0xff, 0x03, 0xff, 0xff, 0xff, 0xff, 0x0f, 0x01,
];

fn varuint_bench(c: &mut Criterion) {
    c.bench_function("sliceparser_varuint32", |b| {
        b.iter(|| {
            let mut p = SliceParser::new(black_box(&VARINTS));
            while let Ok(n) = p.take_varuint32() {
                black_box(n);
            }
        })
    });
}

fn struct_bench(c: &mut Criterion) {
    c.bench_function("decode_bar", |b| {
        b.iter(|| {
            decode(
                Input::Binary(black_box(&BAR)),
                "bar",
                CallOptions::with_abi(AbiSource::Json(ABI.to_owned())),
            )
        })
    });
}

criterion_group! {
    name = parser_benches;
    config = Criterion::default();
    targets = varuint_bench, struct_bench
}

criterion_main!(parser_benches);
