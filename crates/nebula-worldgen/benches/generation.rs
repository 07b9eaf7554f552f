use std::sync::atomic::AtomicBool;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use nebula_config::WorldGenConfig;
use nebula_worldgen::*;

fn generator() -> WorldGenerator {
    WorldGenerator::new(&WorldGenConfig::default()).expect("default config is valid")
}

fn bench_generate_chunk(c: &mut Criterion) {
    let generator = generator();
    let stop = AtomicBool::new(false);
    let mut chunk = Chunk::new(ChunkCoord::new(2, 2));
    // Warm the region cache so the bench measures per-chunk work.
    generator.generate(&mut chunk, &stop);
    c.bench_function("generate_chunk", |bencher| {
        bencher.iter(|| black_box(generator.generate(&mut chunk, &stop)))
    });
}

fn bench_generate_chunk_cold_region(c: &mut Criterion) {
    let generator = generator();
    let stop = AtomicBool::new(false);
    let mut i = 0;
    c.bench_function("generate_chunk_cold_region", |bencher| {
        bencher.iter(|| {
            i += 1;
            let mut chunk = Chunk::new(ChunkCoord::new(i * REGION_CHUNKS, 0));
            black_box(generator.generate(&mut chunk, &stop))
        })
    });
}

fn bench_column_info(c: &mut Criterion) {
    let generator = generator();
    generator.column_info(0, 0);
    c.bench_function("column_info_cached_region", |bencher| {
        bencher.iter(|| black_box(generator.column_info(black_box(37), black_box(41))))
    });
}

fn bench_lod_tile(c: &mut Criterion) {
    let generator = generator();
    let mut buffer = LodBuffer::new();
    let mut tile = 0;
    c.bench_function("lod_tile_level_2", |bencher| {
        bencher.iter(|| {
            // Cycles through nine tiles; after the first pass samples come from the LOD cache.
            tile += 1;
            generator.generate_heightmap_only(&mut buffer, tile % 3, tile / 3 % 3, 2);
            black_box(buffer.get(0, 0).height)
        })
    });
}

criterion_group!(
    benches,
    bench_generate_chunk,
    bench_generate_chunk_cold_region,
    bench_column_info,
    bench_lod_tile
);
criterion_main!(benches);
