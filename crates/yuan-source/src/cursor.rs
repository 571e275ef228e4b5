//! 轨道游标.
//!
//! 每条轨道独享一个游标, 指向容器索引中的"当前块条目".
//! 游标位置只有两种改变方式: seek (应用索引查询结果) 与 commit
//! (样本合成完全成功后的原子前移). 合成中途失败不会触碰游标,
//! 同一次产样调用总是可以安全重试.

use log::debug;
use yuan_core::time::ns_to_seconds;
use yuan_core::{YuanError, YuanResult};

use crate::index::{BlockEntry, BlockRef, ContainerIndex, SeekInfo};

/// 轨道游标
#[derive(Debug)]
pub struct Cursor {
    /// 所属轨道号
    track: u64,
    /// 当前块条目
    curr: BlockEntry,
    /// 一次性不连续标志: Start/Seek 后置位, 产出首个样本后清除
    discontinuity: bool,
}

impl Cursor {
    /// 创建游标, 初始指向流末尾哨兵
    pub fn new(track: u64) -> Self {
        Self {
            track,
            curr: BlockEntry::Eos,
            discontinuity: false,
        }
    }

    /// 所属轨道号
    pub fn track(&self) -> u64 {
        self.track
    }

    /// 当前块条目
    pub fn current(&self) -> &BlockEntry {
        &self.curr
    }

    /// 一次性不连续标志是否置位
    pub fn discontinuity(&self) -> bool {
        self.discontinuity
    }

    /// 清除不连续标志 (产出首个样本时由合成器调用)
    pub(crate) fn clear_discontinuity(&mut self) {
        self.discontinuity = false;
    }

    /// 按时间定位游标
    ///
    /// 委托容器索引的层级查询 (簇级定位 + 簇内块扫描).
    /// 时间超出已结束流的末尾时游标落在 EOS, 不是错误.
    /// 成功后置位一次性不连续标志, 并丢弃此前的任何推进进度.
    pub fn seek(&mut self, index: &dyn ContainerIndex, time_ns: i64) -> YuanResult<()> {
        let info = index.find_block_at_or_after(self.track, time_ns)?;
        self.apply(info)
    }

    /// 应用 seek 查询结果
    ///
    /// 与 [`Cursor::seek`] 分离, 以便宿主自行执行查询 (例如带 Cue
    /// 预取) 后再初始化游标.
    pub fn apply(&mut self, info: SeekInfo) -> YuanResult<()> {
        if let BlockEntry::Block(b) = &info.entry {
            self.ensure_track(b)?;
            debug!(
                "轨道 {}: 定位到块 time={:.3}s key={}",
                self.track,
                ns_to_seconds(b.time_ns),
                b.is_key,
            );
            if let Some(cue) = info.cue {
                debug!(
                    "轨道 {}: 命中 Cue 点 time={:.3}s cluster={}",
                    self.track,
                    ns_to_seconds(cue.time_ns),
                    cue.cluster,
                );
            }
        } else {
            debug!("轨道 {}: 定位越过流末尾, 游标置于 EOS", self.track);
        }
        self.curr = info.entry;
        self.discontinuity = true;
        Ok(())
    }

    /// 原子前移: 将游标的当前位置替换为 `next`
    ///
    /// 仅在样本合成的全部步骤成功后调用.
    pub(crate) fn commit(&mut self, next: BlockEntry) -> YuanResult<()> {
        if let BlockEntry::Block(b) = &next {
            self.ensure_track(b)?;
        }
        self.curr = next;
        Ok(())
    }

    /// 轨道归属校验: 游标上的块必须属于游标的轨道
    fn ensure_track(&self, b: &BlockRef) -> YuanResult<()> {
        if b.track != self.track {
            return Err(YuanError::Structural {
                track: self.track,
                reason: format!("块属于轨道 {}", b.track),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CueHint;

    fn block(track: u64, time_ns: i64) -> BlockRef {
        BlockRef {
            cluster: 0,
            block: 0,
            track,
            time_ns,
            offset: 0,
            len: 4,
            is_key: true,
        }
    }

    #[test]
    fn test_cursor_apply_置位不连续标志() {
        let mut cursor = Cursor::new(1);
        assert!(!cursor.discontinuity());

        cursor
            .apply(SeekInfo {
                cluster: Some(0),
                entry: BlockEntry::Block(block(1, 0)),
                cue: Some(CueHint {
                    time_ns: 0,
                    cluster: 0,
                }),
            })
            .unwrap();
        assert!(cursor.discontinuity());
        assert!(!cursor.current().is_eos());
    }

    #[test]
    fn test_cursor_轨道不匹配为结构性错误() {
        let mut cursor = Cursor::new(1);
        let err = cursor
            .apply(SeekInfo {
                cluster: Some(0),
                entry: BlockEntry::Block(block(2, 0)),
                cue: None,
            })
            .unwrap_err();
        assert!(matches!(err, YuanError::Structural { track: 1, .. }));
        // 失败不改变游标位置
        assert!(cursor.current().is_eos());
    }

    #[test]
    fn test_cursor_eos定位也置位标志() {
        let mut cursor = Cursor::new(1);
        cursor
            .apply(SeekInfo {
                cluster: None,
                entry: BlockEntry::Eos,
                cue: None,
            })
            .unwrap();
        assert!(cursor.current().is_eos());
        assert!(cursor.discontinuity());
    }
}
