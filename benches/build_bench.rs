use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::tempdir;
use wikidict::build::{full_build, incremental_build};
use wikidict::iterator::from_records;
use wikidict::{Options, Record};

const N: usize = 20_000;
const VAL_SIZE: usize = 64;

fn random_records(rng: &mut StdRng, n: usize) -> Vec<Record> {
    (0..n)
        .map(|_| {
            let key_len = rng.gen_range(4..16);
            let key: String = (0..key_len).map(|_| rng.sample(Alphanumeric) as char).collect();
            let value: String = (0..VAL_SIZE).map(|_| rng.sample(Alphanumeric) as char).collect();
            Record::new(key, value)
        })
        .collect()
}

fn bench_full_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let input = random_records(&mut rng, N);

    c.bench_function("full_build_20k", |b| {
        b.iter_batched(
            || (tempdir().unwrap(), input.clone()),
            |(dir, records)| {
                let options = Options {
                    chunk_size: 2_000,
                    ..Options::default()
                };
                full_build(&mut from_records(records), dir.path(), &options).unwrap();
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_incremental_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let dir = tempdir().unwrap();
    let options = Options::default();

    let base_dir = dir.path().join("base");
    let delta_dir = dir.path().join("delta");
    std::fs::create_dir_all(&base_dir).unwrap();
    std::fs::create_dir_all(&delta_dir).unwrap();
    let (base, _) = full_build(&mut from_records(random_records(&mut rng, N)), &base_dir, &options).unwrap();
    let (delta, _) =
        full_build(&mut from_records(random_records(&mut rng, N / 10)), &delta_dir, &options).unwrap();

    c.bench_function("incremental_build_20k_plus_2k", |b| {
        b.iter_batched(
            || tempdir().unwrap(),
            |out| {
                incremental_build(&base.table.path, &delta.table.path, out.path(), &options).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_full_build, bench_incremental_build);
criterion_main!(benches);
