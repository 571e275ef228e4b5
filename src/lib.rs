//! # Yuan (源)
//!
//! 纯 Rust 实现的拉取式媒体源框架, 面向 WebM 风格的块结构容器
//! (Segment → Cluster → Block 层级).
//!
//! Yuan 从外部容器索引中抽取可独立解码的定时样本, 以拉取模型交付
//! 播放管线:
//! - **按时间定位**: 层级索引查询, 附带 Cue 点提示
//! - **顺序推进**: 无需重扫容器; 样本时长由相邻块的时间推导
//! - **直播/渐进下载**: "数据不足"与"流结束"严格区分, 原地重试
//! - **音画交织**: 音频读取配额, 防止音频游标过度领先视频
//! - **预滚窗口**: 标记应解码但不渲染的前导样本
//!
//! # 快速开始
//!
//! ```rust
//! use yuan::source::{MemoryIndex, SamplePoll, VideoSource};
//!
//! // 构造一个单簇三块的演示索引 (轨道 1, 块间隔 33ms)
//! let mut index = MemoryIndex::new();
//! let c0 = index.push_cluster(0);
//! index.push_block(c0, 1, 0, true, &b"frame0"[..]);
//! index.push_block(c0, 1, 33_000_000, false, &b"frame1"[..]);
//! index.publish_all();
//! index.finalize();
//!
//! let mut video = VideoSource::video(1);
//! video.start(&index, 0).unwrap();
//! while let SamplePoll::Sample(sample) = video.produce_sample(&index).unwrap() {
//!     println!("time={} dur={} key={}", sample.time, sample.duration, sample.is_key);
//! }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `yuan-core` | 核心类型、错误与时间换算 |
//! | `yuan-source` | 解复用核心: 定位、推进、样本合成 |

/// 核心类型与工具
pub use yuan_core as core;

/// 解复用与样本合成
pub use yuan_source as source;

pub mod logging;

/// 获取 Yuan 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
