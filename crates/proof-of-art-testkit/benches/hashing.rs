use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use proof_of_art_core::{content_hash, prompt_hash, ProofPackageBuilder};

const CREATOR: &str = "0x1111111111111111111111111111111111111111";

fn bench_content_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_hash");
    for size in [1024usize, 256 * 1024, 4 * 1024 * 1024] {
        let data = vec![0xa5u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| content_hash(black_box(data)))
        });
    }
    group.finish();
}

fn bench_prompt_hash(c: &mut Criterion) {
    let prompt = "  a red cube on a checkered floor, studio lighting  ".repeat(16);
    c.bench_function("prompt_hash", |b| b.iter(|| prompt_hash(black_box(&prompt))));
}

fn bench_package_digest(c: &mut Criterion) {
    let package = ProofPackageBuilder::new()
        .creator(proof_of_art_core::CreatorAddress::parse(CREATOR).unwrap())
        .prompt("a red cube")
        .content(vec![0x42u8; 64 * 1024])
        .ipfs_cid("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG")
        .model_used("dall-e-3")
        .timestamp(1_700_000_000_000)
        .build()
        .unwrap();
    c.bench_function("package_digest", |b| b.iter(|| black_box(&package).digest()));
}

criterion_group!(benches, bench_content_hash, bench_prompt_hash, bench_package_digest);
criterion_main!(benches);
