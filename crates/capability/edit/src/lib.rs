//! 选择与行内编辑控制。
//!
//! - `EditController`：单草稿编辑状态机（Viewing ⇄ Editing），保存经命令流水线提交
//! - `filter_entries`：名册过滤（纯函数，每次由名册 + 状态表 + 过滤条件重新计算）
//!
//! 选择集本身由 `SnapshotStore` 持有，这里只做转发。

mod controller;
mod error;
mod filter;

pub use controller::{EditController, EditMode, EntryDraft};
pub use error::EditError;
pub use filter::{FacilityFilter, FilterState, StatusFilter, filter_entries};
