//! # Fleet Control 模块
//!
//! 命令流水线：对名册执行需确认的批量 / 单体变更命令。
//!
//! ## 命令链路
//!
//! 本地前置校验（选择集非空、未在执行中、已确认）→ 远端调用 → 事件日志 → 成功时全量刷新。
//! 前置校验失败不会触网；远端失败转换为错误事件，破坏性命令额外给出阻塞提示。
//!
//! ## 在途标记
//!
//! 每个命令族（删除、重置、保存、注册、恢复、凭据、告警、导出）各有一个在途标记，
//! 执行期间同族命令直接拒绝，不做排队也不可取消。

pub mod credential;
pub mod csv;
pub mod error;
pub mod inflight;
pub mod notifier;
pub mod pipeline;
pub mod restore;

pub use credential::{CredentialPanel, ShownCredential};
pub use csv::{CsvError, DEFAULT_PASSWORD, parse_registration_csv};
pub use error::CommandError;
pub use inflight::{CommandFamily, InFlight, InFlightGuard};
pub use notifier::{OperatorNotifier, ScriptedNotifier};
pub use pipeline::{CommandPipeline, ImportOutcome, PipelineConfig, compliance_report_file_name};
pub use restore::RestoreChecklist;
