//! # Fleet Gateway 模块
//!
//! 远端管理 API 的类型化访问层。控制台核心只依赖 [`RemoteGateway`] trait，
//! 每次调用独立成败，互不影响。
//!
//! ## 实现
//!
//! - [`HttpGateway`]：基于 reqwest 的 HTTP 实现（`X-User-Id` 头携带操作员身份）
//! - [`InMemoryGateway`]：内存实现，支持按操作注入失败、延迟与脚本化返回，用于测试和演示
//!
//! ## 错误分类
//!
//! - `Transport`：网络 / 超时等传输层失败
//! - `Remote`：传输成功但远端返回失败（非 2xx 或业务失败）
//! - `Decode`：响应体无法解析

pub mod error;
pub mod http;
pub mod in_memory;
pub mod traits;

pub use error::GatewayError;
pub use http::HttpGateway;
pub use in_memory::{ExportQuery, InMemoryGateway, Operation};
pub use traits::RemoteGateway;
