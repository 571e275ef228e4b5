//! 内存容器索引.
//!
//! 在内存中构造簇/块层级并实现 [`ContainerIndex`], 服务于测试、
//! 基准与渐进下载的模拟: 簇先推入 (push) 再发布 (publish),
//! 未发布的区域对查询不可见, 表现为"数据不足"; `finalize()` 之后
//! 越过末尾的查询才会得到 EOS.

use bytes::Bytes;
use yuan_core::{YuanError, YuanResult};

use crate::index::{BlockEntry, BlockRef, ContainerIndex, CueHint, SeekInfo};

/// 内存簇: 一组共享基准时间的块
#[derive(Debug, Clone)]
struct MemCluster {
    /// 簇基准时间 (纳秒)
    base_time_ns: i64,
    /// 簇内块, 按时间顺序
    blocks: Vec<MemBlock>,
}

/// 内存块
#[derive(Debug, Clone)]
struct MemBlock {
    track: u64,
    /// 相对簇基准的时间 (纳秒)
    rel_time_ns: i64,
    is_key: bool,
    /// 模拟的容器内字节偏移
    offset: u64,
    payload: Bytes,
}

/// 内存容器索引
///
/// 簇与块一经推入便不可变 (只读索引), 唯一的状态变化是
/// 发布进度与终结标记.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    clusters: Vec<MemCluster>,
    /// 已发布 (对查询可见) 的簇数量
    published: usize,
    /// 终结后不再有新簇, 越过末尾即 EOS
    finalized: bool,
    /// 虚拟字节偏移分配游标
    next_offset: u64,
}

impl MemoryIndex {
    /// 创建空索引 (未发布任何簇, 未终结)
    pub fn new() -> Self {
        Self::default()
    }

    /// 推入一个新簇, 返回簇序号
    ///
    /// 簇基准时间必须单调不减 (与容器内簇的排列一致).
    pub fn push_cluster(&mut self, base_time_ns: i64) -> usize {
        self.clusters.push(MemCluster {
            base_time_ns,
            blocks: Vec::new(),
        });
        self.clusters.len() - 1
    }

    /// 向指定簇追加一个块
    ///
    /// 块时间 = 簇基准时间 + `rel_time_ns`.
    pub fn push_block(
        &mut self,
        cluster: usize,
        track: u64,
        rel_time_ns: i64,
        is_key: bool,
        payload: impl Into<Bytes>,
    ) {
        let payload = payload.into();
        let offset = self.next_offset;
        self.next_offset += payload.len() as u64;
        self.clusters[cluster].blocks.push(MemBlock {
            track,
            rel_time_ns,
            is_key,
            offset,
            payload,
        });
    }

    /// 发布前 `count` 个簇 (只增不减)
    pub fn publish(&mut self, count: usize) {
        self.published = self.published.max(count.min(self.clusters.len()));
    }

    /// 发布全部已推入的簇
    pub fn publish_all(&mut self) {
        self.published = self.clusters.len();
    }

    /// 终结流: 不再有新簇到达
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// 已发布的簇数量
    pub fn published(&self) -> usize {
        self.published
    }

    fn make_ref(&self, cluster: usize, block: usize) -> BlockRef {
        let c = &self.clusters[cluster];
        let b = &c.blocks[block];
        BlockRef {
            cluster,
            block,
            track: b.track,
            time_ns: c.base_time_ns + b.rel_time_ns,
            offset: b.offset,
            len: b.payload.len() as i64,
            is_key: b.is_key,
        }
    }

    /// 在已发布区域内, 从 (cluster, block) 起 (含) 顺序查找轨道的下一个块
    fn scan_from(&self, track: u64, cluster: usize, block: usize) -> Option<(usize, usize)> {
        let mut bi = block;
        for ci in cluster..self.published {
            let blocks = &self.clusters[ci].blocks;
            while bi < blocks.len() {
                if blocks[bi].track == track {
                    return Some((ci, bi));
                }
                bi += 1;
            }
            bi = 0;
        }
        None
    }
}

impl ContainerIndex for MemoryIndex {
    fn find_block_at_or_after(&self, track: u64, time_ns: i64) -> YuanResult<SeekInfo> {
        // 簇级定位: 最后一个基准时间 <= 目标时间的已发布簇
        let start_cluster = self
            .clusters[..self.published]
            .partition_point(|c| c.base_time_ns <= time_ns)
            .saturating_sub(1);

        let mut pos = self.scan_from(track, start_cluster, 0);
        while let Some((ci, bi)) = pos {
            let r = self.make_ref(ci, bi);
            if r.time_ns >= time_ns {
                let base = self.clusters[ci].base_time_ns;
                return Ok(SeekInfo {
                    cluster: Some(ci),
                    entry: BlockEntry::Block(r),
                    cue: Some(CueHint {
                        time_ns: base,
                        cluster: ci,
                    }),
                });
            }
            pos = self.scan_from(track, ci, bi + 1);
        }

        if self.finalized {
            Ok(SeekInfo {
                cluster: None,
                entry: BlockEntry::Eos,
                cue: None,
            })
        } else {
            Err(YuanError::NeedMoreData)
        }
    }

    fn next_block(&self, track: u64, current: &BlockRef) -> YuanResult<BlockEntry> {
        match self.scan_from(track, current.cluster, current.block + 1) {
            Some((ci, bi)) => Ok(BlockEntry::Block(self.make_ref(ci, bi))),
            None if self.finalized => Ok(BlockEntry::Eos),
            None => Err(YuanError::NeedMoreData),
        }
    }

    fn read_payload(&self, block: &BlockRef) -> YuanResult<Bytes> {
        let stored = self
            .clusters
            .get(block.cluster)
            .and_then(|c| c.blocks.get(block.block))
            .ok_or_else(|| YuanError::Read {
                track: block.track,
                offset: block.offset,
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "块引用越界"),
            })?;
        if stored.track != block.track {
            return Err(YuanError::Structural {
                track: block.track,
                reason: format!("块属于轨道 {}", stored.track),
            });
        }
        Ok(stored.payload.clone())
    }

    fn last_block_in_cluster(&self, cluster: usize, track: u64) -> Option<BlockRef> {
        if cluster >= self.published {
            return None;
        }
        let blocks = &self.clusters[cluster].blocks;
        blocks
            .iter()
            .rposition(|b| b.track == track)
            .map(|bi| self.make_ref(cluster, bi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: i64 = 1_000_000;

    /// 单轨道双簇索引: 簇 0 @0ms {0, 33}, 簇 1 @66ms {0, 33}
    fn two_cluster_index(track: u64) -> MemoryIndex {
        let mut idx = MemoryIndex::new();
        let c0 = idx.push_cluster(0);
        idx.push_block(c0, track, 0, true, &b"k0"[..]);
        idx.push_block(c0, track, 33 * MS, false, &b"b1"[..]);
        let c1 = idx.push_cluster(66 * MS);
        idx.push_block(c1, track, 0, false, &b"b2"[..]);
        idx.push_block(c1, track, 33 * MS, false, &b"b3"[..]);
        idx
    }

    #[test]
    fn test_find_命中与cue提示() {
        let mut idx = two_cluster_index(1);
        idx.publish_all();
        idx.finalize();

        let info = idx.find_block_at_or_after(1, 34 * MS).unwrap();
        let b = info.entry.as_block().unwrap();
        assert_eq!(b.time_ns, 66 * MS);
        assert_eq!(info.cluster, Some(1));
        assert_eq!(info.cue.unwrap().time_ns, 66 * MS);
    }

    #[test]
    fn test_find_超出末尾为eos() {
        let mut idx = two_cluster_index(1);
        idx.publish_all();
        idx.finalize();

        let info = idx.find_block_at_or_after(1, 10_000 * MS).unwrap();
        assert!(info.entry.is_eos());
        assert!(info.cue.is_none());
    }

    #[test]
    fn test_find_未发布区域为数据不足() {
        let mut idx = two_cluster_index(1);
        idx.publish(1);

        // 目标在第二个簇, 尚未发布
        let err = idx.find_block_at_or_after(1, 66 * MS).unwrap_err();
        assert!(matches!(err, YuanError::NeedMoreData));
    }

    #[test]
    fn test_next_跨簇推进() {
        let mut idx = two_cluster_index(1);
        idx.publish_all();
        idx.finalize();

        let first = *idx
            .find_block_at_or_after(1, 0)
            .unwrap()
            .entry
            .as_block()
            .unwrap();
        let second = match idx.next_block(1, &first).unwrap() {
            BlockEntry::Block(b) => b,
            BlockEntry::Eos => panic!("不应到达流末尾"),
        };
        assert_eq!(second.time_ns, 33 * MS);
        let third = match idx.next_block(1, &second).unwrap() {
            BlockEntry::Block(b) => b,
            BlockEntry::Eos => panic!("不应到达流末尾"),
        };
        // 跨入第二个簇
        assert_eq!(third.cluster, 1);
        assert_eq!(third.time_ns, 66 * MS);
    }

    #[test]
    fn test_next_区分数据不足与eos() {
        let mut idx = two_cluster_index(1);
        idx.publish(1);

        let last = idx.last_block_in_cluster(0, 1).unwrap();
        assert!(matches!(
            idx.next_block(1, &last),
            Err(YuanError::NeedMoreData)
        ));

        idx.publish_all();
        idx.finalize();
        let tail = idx.last_block_in_cluster(1, 1).unwrap();
        assert!(matches!(idx.next_block(1, &tail), Ok(BlockEntry::Eos)));
    }

    #[test]
    fn test_next_跳过其他轨道的块() {
        let mut idx = MemoryIndex::new();
        let c0 = idx.push_cluster(0);
        idx.push_block(c0, 1, 0, true, &b"v0"[..]);
        idx.push_block(c0, 2, 5 * MS, true, &b"a0"[..]);
        idx.push_block(c0, 1, 33 * MS, false, &b"v1"[..]);
        idx.publish_all();
        idx.finalize();

        let v0 = *idx
            .find_block_at_or_after(1, 0)
            .unwrap()
            .entry
            .as_block()
            .unwrap();
        let next = idx.next_block(1, &v0).unwrap();
        let b = next.as_block().unwrap();
        assert_eq!(b.track, 1);
        assert_eq!(b.time_ns, 33 * MS);
    }

    #[test]
    fn test_read_payload_与越界() {
        let mut idx = two_cluster_index(1);
        idx.publish_all();
        idx.finalize();

        let b = idx.last_block_in_cluster(0, 1).unwrap();
        assert_eq!(idx.read_payload(&b).unwrap(), Bytes::from_static(b"b1"));

        let mut bogus = b;
        bogus.cluster = 99;
        assert!(matches!(
            idx.read_payload(&bogus),
            Err(YuanError::Read { .. })
        ));
    }

    #[test]
    fn test_last_block_按轨道过滤() {
        let mut idx = MemoryIndex::new();
        let c0 = idx.push_cluster(0);
        idx.push_block(c0, 1, 0, true, &b"v0"[..]);
        idx.push_block(c0, 2, 2 * MS, true, &b"a0"[..]);
        idx.push_block(c0, 2, 23 * MS, true, &b"a1"[..]);
        idx.push_block(c0, 1, 33 * MS, false, &b"v1"[..]);
        idx.publish_all();

        let last_audio = idx.last_block_in_cluster(0, 2).unwrap();
        assert_eq!(last_audio.time_ns, 23 * MS);
        // 未发布的簇不可见
        assert!(idx.last_block_in_cluster(1, 2).is_none());
    }
}
