//! 轨道策略.
//!
//! 音频与视频轨道只在两点上不同: 关键帧判定规则与读取配额.
//! 用一个小能力集 trait 表达差异, 游标、合成器与流状态机对两种
//! 轨道完全复用, 不做平行的类型层级.

use log::debug;
use yuan_core::MediaType;
use yuan_core::time::ns_to_seconds;

use crate::index::{BlockRef, ContainerIndex};

/// 轨道策略 trait
pub trait TrackPolicy {
    /// 媒体类型
    fn media_type(&self) -> MediaType;

    /// 判定块是否关键帧
    fn is_key(&self, block: &BlockRef) -> bool;

    /// 当前块是否允许被越过继续读取
    ///
    /// 返回 `false` 表示读取受策略约束 (配额), 调用方按"数据不足"
    /// 处理并等待新簇通知; 这与索引层面的数据可用性无关.
    fn may_advance(&self, current: &BlockRef) -> bool {
        let _ = current;
        true
    }

    /// 新簇到达通知 (配额重算)
    fn on_cluster(&mut self, index: &dyn ContainerIndex, cluster: usize, track: u64) {
        let _ = (index, cluster, track);
    }
}

/// 视频轨道策略
///
/// 关键帧取块的原生标志, 读取无配额约束.
#[derive(Debug, Default, Clone, Copy)]
pub struct VideoPolicy;

impl TrackPolicy for VideoPolicy {
    fn media_type(&self) -> MediaType {
        MediaType::Video
    }

    fn is_key(&self, block: &BlockRef) -> bool {
        block.is_key
    }
}

/// 音频轨道策略
///
/// 音频块总是可独立解码 (全关键帧); 读取受配额约束, 防止两条轨道
/// 由同一批新簇驱动时音频游标无限领先视频, 破坏交织顺序与背压.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioPolicy {
    /// 配额块: 音频游标可消费的最远位置, `None` 表示无约束
    /// (整段已缓冲的拉取场景)
    quota: Option<BlockRef>,
}

impl AudioPolicy {
    /// 创建无配额约束的音频策略
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前配额块
    pub fn quota(&self) -> Option<&BlockRef> {
        self.quota.as_ref()
    }
}

impl TrackPolicy for AudioPolicy {
    fn media_type(&self) -> MediaType {
        MediaType::Audio
    }

    fn is_key(&self, _block: &BlockRef) -> bool {
        true
    }

    fn may_advance(&self, current: &BlockRef) -> bool {
        // 配额即当前块: 必须等待下一次簇通知.
        // 位置比较而非时间比较: 游标被 seek 越过陈旧配额时不受其约束.
        match &self.quota {
            Some(q) => q.position() != current.position() || q.track != current.track,
            None => true,
        }
    }

    fn on_cluster(&mut self, index: &dyn ContainerIndex, cluster: usize, track: u64) {
        // 配额重算: 新可见簇区域内最后一个音频块
        if let Some(last) = index.last_block_in_cluster(cluster, track) {
            debug!(
                "轨道 {track}: 配额更新到 cluster={} time={:.3}s",
                last.cluster,
                ns_to_seconds(last.time_ns),
            );
            self.quota = Some(last);
        }
    }
}
