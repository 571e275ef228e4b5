//! Yuan 媒体源性能基准测试.
//!
//! 覆盖按时间定位与整段顺序拉取两条核心路径.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use yuan::source::{MemoryIndex, SamplePoll, VideoSource};

const MS: i64 = 1_000_000;
const VIDEO_TRACK: u64 = 1;

/// 构造大规模视频索引: `clusters` 个簇, 每簇 `blocks_per_cluster` 个块,
/// 块间隔 33ms, 每簇首块为关键帧
fn make_index(clusters: usize, blocks_per_cluster: usize) -> MemoryIndex {
    let mut idx = MemoryIndex::new();
    let cluster_span = blocks_per_cluster as i64 * 33 * MS;
    for ci in 0..clusters {
        let c = idx.push_cluster(ci as i64 * cluster_span);
        for bi in 0..blocks_per_cluster {
            idx.push_block(
                c,
                VIDEO_TRACK,
                bi as i64 * 33 * MS,
                bi == 0,
                &b"payload-bytes"[..],
            );
        }
    }
    idx.publish_all();
    idx.finalize();
    idx
}

fn bench_seek(c: &mut Criterion) {
    let idx = make_index(1000, 10);
    c.bench_function("seek_mid_10k_blocks", |b| {
        let mut video = VideoSource::video(VIDEO_TRACK);
        // 目标取流中段, 覆盖簇级二分 + 簇内扫描
        let target = 500 * 10 * 33 * MS;
        b.iter(|| {
            video.seek(&idx, black_box(target)).unwrap();
        });
    });
}

fn bench_pull_all(c: &mut Criterion) {
    let idx = make_index(100, 10);
    c.bench_function("pull_1k_samples", |b| {
        let mut video = VideoSource::video(VIDEO_TRACK);
        b.iter(|| {
            video.start(&idx, 0).unwrap();
            let mut count = 0usize;
            loop {
                match video.produce_sample(&idx).unwrap() {
                    SamplePoll::Sample(s) => {
                        black_box(s.time);
                        count += 1;
                    }
                    SamplePoll::EndOfStream => break,
                    SamplePoll::Underflow => unreachable!("整段已缓冲"),
                }
            }
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_seek, bench_pull_all);
criterion_main!(benches);
