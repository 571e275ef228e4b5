//! # yuan-source
//!
//! Yuan 媒体源框架解复用核心, 基于块结构容器 (WebM 风格:
//! Segment → Cluster → Block 层级) 的拉取式样本抽取.
//!
//! 容器的字节级解析与缓冲由外部索引负责 (实现 [`ContainerIndex`]),
//! 本 crate 在其上实现:
//! - 按时间定位 (seek): 层级索引查询 + Cue 提示
//! - 顺序推进: 无需重扫容器, 由相邻块推导样本时长
//! - 样本合成: 时间戳、关键帧、不连续与预滚标志
//! - 音频读取配额: 限制音频游标领先视频的幅度
//! - 每轨道流状态机: Stopped → Started → Ended
//!
//! 使用流程:
//! 1. 构造 [`VideoSource`] / [`AudioSource`] (每条轨道一个)
//! 2. 调用 `start()` 定位起始时间
//! 3. 循环调用 `produce_sample()` 拉取样本
//! 4. 直播/渐进下载场景下, 随新簇到达调用 `notify_cluster()`

pub mod cursor;
pub mod index;
pub mod memory;
pub mod sample;
pub mod stream;
pub mod track;

// 重导出常用类型
pub use cursor::Cursor;
pub use index::{BlockEntry, BlockRef, ContainerIndex, CueHint, SeekInfo};
pub use memory::MemoryIndex;
pub use sample::{MediaSample, SamplePoll, Synthesizer, UNKNOWN_DURATION};
pub use stream::{AudioSource, StreamSource, StreamState, VideoSource};
pub use track::{AudioPolicy, TrackPolicy, VideoPolicy};
