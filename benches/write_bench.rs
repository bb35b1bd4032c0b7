use criterion::{black_box, criterion_group, criterion_main, Criterion};
use op2tape::model::ResultModel;
use op2tape::result::RecordedResult;
use op2tape::table::TABLE_ORDER;
use op2tape::writer::{Op2Writer, WriteOptions};
use chrono::NaiveDate;

fn model(subcases: i32) -> ResultModel {
    let mut m = ResultModel::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    let payload = serde_json::json!([
        { "op": "markers", "values": [2] },
        { "op": "block", "fields": [{ "i": 8 }, { "s": "OUGV1   " }, { "i": 8 }] },
        { "op": "block", "fields": [{ "i": 16 }, { "d": 1.0 }, { "d": -2.5 }, { "i": 16 }] }
    ]);
    for table in TABLE_ORDER {
        for subcase in 1..=subcases {
            let mut r = RecordedResult::new(table, subcase);
            r.records = serde_json::from_value(payload.clone()).unwrap();
            m.add_result(table, Box::new(r));
        }
    }
    m
}

fn bench_write(c: &mut Criterion) {
    let writer = Op2Writer::default();
    let opts = WriteOptions::default();

    let small = model(1);
    c.bench_function("write_all_tables_1_subcase", |b| {
        b.iter(|| {
            let mut bin = Vec::new();
            let mut txt = Vec::new();
            writer.write_to(&mut bin, &mut txt, black_box(&small), &opts).unwrap();
        })
    });

    let large = model(50);
    c.bench_function("write_all_tables_50_subcases", |b| {
        b.iter(|| {
            let mut bin = Vec::new();
            let mut txt = Vec::new();
            writer.write_to(&mut bin, &mut txt, black_box(&large), &opts).unwrap();
        })
    });
}

criterion_group!(benches, bench_write);
criterion_main!(benches);
