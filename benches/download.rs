//! Benchmarks for in-memory downloads
//!
//! Measures the full pipeline (head probe, tail scan, fixup, content copy)
//! without network I/O, for both file layouts.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use faststart::config::DownloadConfig;
use faststart::{Downloader, MemorySource};
use faststart_media::mp4::writer::{container, ftyp_box, leaf, stco_box, track_with_table};
use faststart_media::BoxType;

fn moov(chunks: u32) -> Vec<u8> {
    let offsets: Vec<u32> = (0..chunks).map(|i| 32 + i * 1024).collect();
    container(
        BoxType::MOOV,
        &[
            leaf(BoxType::MVHD, &[0u8; 100]),
            track_with_table(stco_box(&offsets)),
        ],
    )
}

fn files(mdat_size: usize) -> [(&'static str, Vec<u8>); 2] {
    let ftyp = ftyp_box(b"isom", 0, &[*b"isom", *b"mp41"]);
    let mdat = leaf(BoxType::MDAT, &vec![0xA5; mdat_size]);
    let moov = moov((mdat_size / 1024) as u32);
    [
        ("fast_start", [ftyp.clone(), moov.clone(), mdat.clone()].concat()),
        ("relocated", [ftyp, mdat, moov].concat()),
    ]
}

fn bench_download(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("download");

    for mdat_mib in [1usize, 16] {
        for (layout, file) in files(mdat_mib * 1024 * 1024) {
            group.throughput(Throughput::Bytes(file.len() as u64));
            group.bench_with_input(BenchmarkId::new(layout, mdat_mib), &file, |b, file| {
                b.iter(|| {
                    rt.block_on(async {
                        let mut out = Vec::with_capacity(file.len());
                        Downloader::new(MemorySource::new(file.clone()), DownloadConfig::default())
                            .download_to_writer(&mut out)
                            .await
                            .unwrap();
                        out
                    })
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_download);
criterion_main!(benches);
