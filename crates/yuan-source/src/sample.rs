//! 样本合成.
//!
//! 从游标当前位置合成一个可交付下游的定时样本: 负载字节、
//! 时间戳、时长、关键帧/不连续/预滚标志. 时长没有显式字段可读,
//! 由下一个块的时间推导, 因此每次合成持有一块前瞻, 且仅在本次
//! 调用内有效, 从不跨调用缓存.

use bytes::Bytes;
use log::{debug, trace};
use yuan_core::time::{NO_PREROLL, ns_to_reftime, ns_to_seconds};
use yuan_core::{YuanError, YuanResult};

use crate::cursor::Cursor;
use crate::index::{BlockEntry, BlockRef, ContainerIndex};
use crate::track::TrackPolicy;

/// 未知时长哨兵: 流内最后一个块没有可推导的时长
pub const UNKNOWN_DURATION: i64 = -1;

/// 媒体样本
///
/// 一次合成的产物, 所有权随即转移给调用方 (宿主管线).
#[derive(Debug, Clone)]
pub struct MediaSample {
    /// 负载字节
    pub data: Bytes,
    /// 所属轨道号
    pub track: u64,
    /// 显示时间 (100ns 参考单位, 由纳秒向零截断)
    pub time: i64,
    /// 时长 (100ns 参考单位), [`UNKNOWN_DURATION`] 表示未知
    pub duration: i64,
    /// 是否关键帧
    pub is_key: bool,
    /// 不连续标志: Start/Seek 后的首个样本为 true
    pub discontinuity: bool,
    /// 预滚标志: 样本位于预滚窗口内, 应解码但不渲染
    pub preroll: bool,
}

/// 产样结果
#[derive(Debug)]
pub enum SamplePoll {
    /// 成功产出一个样本, 游标已前移
    Sample(MediaSample),
    /// 数据尚未就绪, 游标未动, 收到新簇通知后重试同一调用
    Underflow,
    /// 流已结束 (幂等, 重复调用始终返回此值)
    EndOfStream,
}

/// 样本合成器
///
/// 仅持有预滚边界配置, 合成本身无跨调用状态.
#[derive(Debug)]
pub struct Synthesizer {
    /// 预滚边界 (纳秒), [`NO_PREROLL`] 表示未配置
    preroll_ns: i64,
}

impl Synthesizer {
    /// 创建合成器 (无预滚边界)
    pub fn new() -> Self {
        Self {
            preroll_ns: NO_PREROLL,
        }
    }

    /// 配置预滚边界 (纳秒), 负值视为清除
    pub fn set_preroll(&mut self, preroll_ns: i64) {
        self.preroll_ns = if preroll_ns < 0 { NO_PREROLL } else { preroll_ns };
    }

    /// 当前预滚边界
    pub fn preroll(&self) -> i64 {
        self.preroll_ns
    }

    /// 合成一个样本
    ///
    /// 游标位于 EOS 时返回 `EndOfStream` (不是错误). 游标位置仅在
    /// 全部步骤成功后原子前移; underflow 或任何失败都不触碰游标,
    /// 同一调用可安全重试, 数据到齐后产出的样本与首次尝试一致.
    pub fn produce<P: TrackPolicy>(
        &self,
        index: &dyn ContainerIndex,
        cursor: &mut Cursor,
        policy: &P,
    ) -> YuanResult<SamplePoll> {
        let curr = match cursor.current() {
            BlockEntry::Eos => return Ok(SamplePoll::EndOfStream),
            BlockEntry::Block(b) => *b,
        };

        self.check_block(cursor.track(), &curr)?;

        // 1) 解析下一个块 (一块前瞻)
        let next = match index.next_block(cursor.track(), &curr) {
            Ok(entry) => entry,
            Err(YuanError::NeedMoreData) => {
                trace!("轨道 {}: 下一块尚未缓冲, 等待重试", cursor.track());
                return Ok(SamplePoll::Underflow);
            }
            Err(e) => return Err(e),
        };

        if let BlockEntry::Block(n) = &next {
            // 配额门: 当前块是配额块时按数据不足处理, 即使索引
            // 已经能给出下一块. 索引返回 EOS 说明流真正结束,
            // 配额不阻止最后一个样本交付.
            if !policy.may_advance(&curr) {
                trace!("轨道 {}: 到达配额块, 等待新簇通知", cursor.track());
                return Ok(SamplePoll::Underflow);
            }

            // 同轨道块时间必须单调不减, 回退说明索引不一致
            if n.time_ns < curr.time_ns {
                return Err(YuanError::Structural {
                    track: cursor.track(),
                    reason: format!("时间回退: {} -> {} ns", curr.time_ns, n.time_ns),
                });
            }
        }

        // 2) 读取负载
        let data = index.read_payload(&curr)?;

        // 3) 时间戳: 纳秒 → 100ns 参考单位, 向零截断
        let time = ns_to_reftime(curr.time_ns);

        // 4) 时长: 由下一块时间推导; 最后一块为未知
        let duration = match &next {
            BlockEntry::Block(n) => ns_to_reftime(n.time_ns - curr.time_ns),
            BlockEntry::Eos => UNKNOWN_DURATION,
        };

        // 5) 关键帧: 按轨道策略判定
        let is_key = policy.is_key(&curr);

        // 6) 不连续: 一次性标志, 本次产出后清除
        let discontinuity = cursor.discontinuity();

        // 7) 预滚: 纯元数据, 不影响时间戳与时长
        let preroll = self.preroll_ns >= 0 && curr.time_ns < self.preroll_ns;
        if preroll {
            debug!(
                "轨道 {}: 预滚样本 time={:.3}s key={is_key}",
                cursor.track(),
                ns_to_seconds(curr.time_ns),
            );
        }

        // 8) 提交: 全部成功后才前移游标
        cursor.commit(next)?;
        cursor.clear_discontinuity();

        Ok(SamplePoll::Sample(MediaSample {
            data,
            track: curr.track,
            time,
            duration,
            is_key,
            discontinuity,
            preroll,
        }))
    }

    /// 结构校验: 轨道归属与块长度
    fn check_block(&self, track: u64, b: &BlockRef) -> YuanResult<()> {
        if b.track != track {
            return Err(YuanError::Structural {
                track,
                reason: format!("块属于轨道 {}", b.track),
            });
        }
        if b.len < 0 {
            return Err(YuanError::Structural {
                track,
                reason: format!("负的块长度 {}", b.len),
            });
        }
        Ok(())
    }
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new()
    }
}
