//! 流状态机.
//!
//! 每条轨道一个 [`StreamSource`]: 持有游标、样本合成器与轨道策略,
//! 在 Stopped → Started → Ended 之间迁移, 对宿主管线暴露
//! start / seek / produce_sample / notify_cluster 四个操作.
//!
//! 两条轨道的游标互相独立, 核心不做任何内部加锁; 调用方保证
//! 同一轨道同一时刻至多一个在途调用 (典型的串行拉取控制路径).

use log::debug;
use yuan_core::time::{NOPTS_VALUE, ns_to_seconds};
use yuan_core::{YuanError, YuanResult};

use crate::cursor::Cursor;
use crate::index::ContainerIndex;
use crate::sample::{SamplePoll, Synthesizer};
use crate::track::{AudioPolicy, TrackPolicy, VideoPolicy};

/// 流状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// 初始/停止, 游标无效
    Stopped,
    /// 已启动, 游标有效, 可产样
    Started,
    /// 游标到达 EOS 且最后一个样本已交付
    Ended,
}

/// 单轨道媒体流
///
/// 状态机对一次播放会话是终态的 (Ended 后产样幂等地返回流结束),
/// 但实例可复用: 再次 start/seek 重新回到 Started.
pub struct StreamSource<P: TrackPolicy> {
    track: u64,
    policy: P,
    cursor: Cursor,
    synth: Synthesizer,
    state: StreamState,
}

/// 视频流: 关键帧来自块标志, 读取无配额
pub type VideoSource = StreamSource<VideoPolicy>;

/// 音频流: 全部块视为关键帧, 读取受配额约束
pub type AudioSource = StreamSource<AudioPolicy>;

impl StreamSource<VideoPolicy> {
    /// 创建视频流
    pub fn video(track: u64) -> Self {
        Self::with_policy(track, VideoPolicy)
    }
}

impl StreamSource<AudioPolicy> {
    /// 创建音频流
    pub fn audio(track: u64) -> Self {
        Self::with_policy(track, AudioPolicy::new())
    }
}

impl<P: TrackPolicy> StreamSource<P> {
    /// 以指定轨道策略创建流
    pub fn with_policy(track: u64, policy: P) -> Self {
        Self {
            track,
            policy,
            cursor: Cursor::new(track),
            synth: Synthesizer::new(),
            state: StreamState::Stopped,
        }
    }

    /// 轨道号
    pub fn track(&self) -> u64 {
        self.track
    }

    /// 当前状态
    pub fn state(&self) -> StreamState {
        self.state
    }

    /// 轨道策略
    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// 配置预滚边界 (纳秒), 负值清除
    ///
    /// 预滚窗口内的样本带 preroll 标记, 供下游解码但不渲染.
    pub fn set_preroll(&mut self, preroll_ns: i64) {
        self.synth.set_preroll(preroll_ns);
    }

    /// 启动: 定位到 `time_ns` 并进入 Started
    ///
    /// [`NOPTS_VALUE`] 表示无约束 (从头开始); 其余负值为无效参数.
    pub fn start(&mut self, index: &dyn ContainerIndex, time_ns: i64) -> YuanResult<()> {
        self.locate(index, time_ns)?;
        debug!(
            "轨道 {}: {} 流启动 @{:.3}s",
            self.track,
            self.policy.media_type(),
            ns_to_seconds(clamp_target(time_ns)),
        );
        Ok(())
    }

    /// 定位: 任意状态下可调用
    ///
    /// 硬复位: 丢弃在途前瞻与本会话进度, 重新置位不连续标志;
    /// Ended 之后 seek 会重新回到 Started.
    pub fn seek(&mut self, index: &dyn ContainerIndex, time_ns: i64) -> YuanResult<()> {
        self.locate(index, time_ns)?;
        debug!(
            "轨道 {}: {} 定位到 @{:.3}s",
            self.track,
            self.policy.media_type(),
            ns_to_seconds(clamp_target(time_ns)),
        );
        Ok(())
    }

    fn locate(&mut self, index: &dyn ContainerIndex, time_ns: i64) -> YuanResult<()> {
        let target = clamp_target(time_ns);
        if target < 0 {
            return Err(YuanError::InvalidArgument(format!(
                "定位时间为负: {target} ns"
            )));
        }
        self.cursor.seek(index, target)?;
        self.state = StreamState::Started;
        Ok(())
    }

    /// 产出下一个样本
    ///
    /// - `Sample`: 成功, 游标已前移
    /// - `Underflow`: 数据未就绪 (缓冲或配额), 状态不变, 游标不动,
    ///   新簇到达后重试同一调用
    /// - `EndOfStream`: 流结束, 此后幂等
    /// - `Err`: 结构性/I/O 故障, 本轨道停止产样, 其他轨道不受影响
    pub fn produce_sample(&mut self, index: &dyn ContainerIndex) -> YuanResult<SamplePoll> {
        match self.state {
            StreamState::Stopped => {
                return Err(YuanError::InvalidArgument("流尚未启动".into()));
            }
            StreamState::Ended => return Ok(SamplePoll::EndOfStream),
            StreamState::Started => {}
        }

        let poll = self.synth.produce(index, &mut self.cursor, &self.policy)?;
        if matches!(poll, SamplePoll::EndOfStream) {
            debug!("轨道 {}: 流结束", self.track);
            self.state = StreamState::Ended;
        }
        Ok(poll)
    }

    /// 新簇到达通知
    ///
    /// 转发给轨道策略做配额重算 (音频); 也是 underflow 之后宿主
    /// 重试产样的时机.
    pub fn notify_cluster(&mut self, index: &dyn ContainerIndex, cluster: usize) {
        self.policy.on_cluster(index, cluster, self.track);
    }
}

/// 把"无约束"哨兵归一化为从头开始
const fn clamp_target(time_ns: i64) -> i64 {
    if time_ns == NOPTS_VALUE { 0 } else { time_ns }
}
