//! 容器索引模型.
//!
//! 容器的 Segment → Cluster → Block 层级由外部解析器拥有并解析,
//! 本 crate 只读消费. 块以轻量引用 (簇序号 + 簇内块序号) 定位,
//! 不持有任何层级的所有权, 避免 Segment↔Cluster↔Block 之间的
//! 生命周期循环.

use bytes::Bytes;
use yuan_core::YuanResult;

/// 块引用: 指向容器索引中一个已定位的编码块
///
/// 只读值类型, 携带定位坐标与从索引读出的块属性快照.
/// 核心逻辑从不修改块, 只读取并越过它.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRef {
    /// 所属簇的序号
    pub cluster: usize,
    /// 簇内块序号
    pub block: usize,
    /// 轨道号
    pub track: u64,
    /// 显示时间 (纳秒, 由所属簇的基准时间导出)
    pub time_ns: i64,
    /// 负载在容器中的字节偏移
    pub offset: u64,
    /// 负载长度 (字节), 负值说明索引已损坏
    pub len: i64,
    /// 是否为关键帧
    pub is_key: bool,
}

impl BlockRef {
    /// 簇内定位坐标 (簇序号, 块序号), 用于位置比较
    pub const fn position(&self) -> (usize, usize) {
        (self.cluster, self.block)
    }
}

/// 块条目: 一个已定位的块, 或流末尾哨兵
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEntry {
    /// 一个已定位的块
    Block(BlockRef),
    /// 流末尾 (EOS)
    Eos,
}

impl BlockEntry {
    /// 是否为流末尾哨兵
    pub const fn is_eos(&self) -> bool {
        matches!(self, Self::Eos)
    }

    /// 取块引用, EOS 时为 `None`
    pub const fn as_block(&self) -> Option<&BlockRef> {
        match self {
            Self::Block(b) => Some(b),
            Self::Eos => None,
        }
    }
}

/// Cue 点定位提示
///
/// 容器带有 Cues 索引时, seek 查询会附带命中的 Cue 点.
/// 仅用于诊断与日志, 不参与时间戳计算.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueHint {
    /// Cue 点时间 (纳秒)
    pub time_ns: i64,
    /// Cue 点指向的簇序号
    pub cluster: usize,
}

/// Seek 查询结果
///
/// 由 [`ContainerIndex::find_block_at_or_after`] 产出,
/// 立即用于初始化游标, 不做持久保存.
#[derive(Debug, Clone, Copy)]
pub struct SeekInfo {
    /// 目标簇序号 (目标为 EOS 时无簇)
    pub cluster: Option<usize>,
    /// 目标块条目
    pub entry: BlockEntry,
    /// Cue 点提示 (容器无 Cues 时为 `None`)
    pub cue: Option<CueHint>,
}

/// 容器索引 trait
///
/// 外部容器解析器实现此 trait, 为媒体源提供层级导航与负载读取.
/// 所有方法都是只读的; 索引自身的填充 (网络下载、增量解析)
/// 由实现方在本 trait 之外完成.
///
/// 使用流程:
/// 1. `find_block_at_or_after()` 定位起始块 (seek)
/// 2. 循环 `next_block()` 顺序推进
/// 3. 对每个块 `read_payload()` 取出负载
pub trait ContainerIndex {
    /// 查找指定轨道上显示时间 >= `time_ns` 的第一个块
    ///
    /// 簇级定位 (找到包含/紧邻目标时间的簇) 与"就近回退到关键帧"
    /// 的语义由索引实现负责, 调用方不重复推导.
    ///
    /// # 返回
    /// - 命中: `SeekInfo::entry` 为该块, 附 Cue 提示 (如有)
    /// - 时间超出已结束流的末尾: `SeekInfo::entry` 为 EOS (不是错误)
    /// - `Err(YuanError::NeedMoreData)`: 目标区域尚未缓冲
    fn find_block_at_or_after(&self, track: u64, time_ns: i64) -> YuanResult<SeekInfo>;

    /// 同一轨道上紧随 `current` 之后的块
    ///
    /// # 返回
    /// - `Ok(BlockEntry::Block)`: 下一个块
    /// - `Ok(BlockEntry::Eos)`: 已到达流末尾
    /// - `Err(YuanError::NeedMoreData)`: 下一个块尚未缓冲, 稍后重试
    ///   (与流末尾严格区分)
    fn next_block(&self, track: u64, current: &BlockRef) -> YuanResult<BlockEntry>;

    /// 读取块负载 `[offset, offset + len)`
    fn read_payload(&self, block: &BlockRef) -> YuanResult<Bytes>;

    /// 指定簇内属于某轨道的最后一个块
    ///
    /// 配额管理在收到新簇通知时用它重算音频读取上界.
    /// 簇内没有该轨道的块时返回 `None`.
    fn last_block_in_cluster(&self, cluster: usize, track: u64) -> Option<BlockRef>;
}
