//! 统一错误类型定义.
//!
//! 所有 Yuan crate 共用的错误类型, 支持跨模块传播.
//!
//! 错误分类遵循产样路径的语义:
//! - [`YuanError::NeedMoreData`] 是唯一的瞬态条件, 调用方原地重试即可;
//! - 结构性错误与 I/O 错误不做内部重试, 携带轨道/块定位信息直接上抛;
//! - 流结束 (EOS) 不是错误, 在产样接口中以独立的结果分支表达.

use thiserror::Error;

/// Yuan 框架统一错误类型
#[derive(Debug, Error)]
pub enum YuanError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 数据不足, 需要更多输入
    ///
    /// 渐进下载/直播场景下目标区域尚未缓冲. 收到新簇通知后重试,
    /// 不应被当作流结束处理.
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 容器索引结构不一致 (损坏的索引)
    ///
    /// 轨道号不匹配、负的块长度、时间戳回退等. 说明上游索引已损坏,
    /// 本轨道停止产样, 不做任何恢复尝试.
    #[error("索引结构错误 (轨道 {track}): {reason}")]
    Structural {
        /// 出错的轨道号
        track: u64,
        /// 具体原因
        reason: String,
    },

    /// 块负载读取失败
    #[error("读取块负载失败 (轨道 {track}, 偏移 {offset}): {source}")]
    Read {
        /// 出错的轨道号
        track: u64,
        /// 块负载在容器中的字节偏移
        offset: u64,
        /// 底层 I/O 错误
        #[source]
        source: std::io::Error,
    },

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// Yuan 框架统一 Result 类型
pub type YuanResult<T> = Result<T, YuanError>;
