//! 单草稿编辑状态机。
//!
//! 同一时间只有一行处于编辑中；在编辑另一行时开始编辑会静默丢弃旧草稿（只记一条日志）。
//! 保存失败时留在 Editing，草稿保留以便重试；阻塞提示由命令流水线给出。

use crate::error::EditError;
use domain::{EntryId, EntryUpdate, FleetEntry, OperatorContext, Role};
use fleet_control::CommandPipeline;
use fleet_eventlog::EventLog;
use fleet_snapshot::SnapshotStore;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// 编辑草稿，初值取自条目当前属性。
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub role: Role,
    pub facility: String,
    pub department: String,
    pub email: String,
    pub paid_leave_days: f64,
    pub joined_date: String,
}

impl EntryDraft {
    pub fn from_entry(entry: &FleetEntry) -> Self {
        Self {
            role: entry.role.clone(),
            facility: entry.facility.clone(),
            department: entry.department.clone(),
            email: entry.email.clone().unwrap_or_default(),
            paid_leave_days: entry.paid_leave_days,
            joined_date: entry.joined_date.clone().unwrap_or_default(),
        }
    }

    /// 草稿 → 部分更新。空的邮箱 / 入职日期不下发。
    pub fn to_update(&self) -> EntryUpdate {
        EntryUpdate {
            role: Some(self.role.clone()),
            facility: Some(self.facility.clone()),
            department: Some(self.department.clone()),
            email: non_empty(&self.email),
            paid_leave_days: Some(self.paid_leave_days),
            joined_date: non_empty(&self.joined_date),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditMode {
    #[default]
    Viewing,
    Editing {
        entry_id: EntryId,
        draft: EntryDraft,
    },
}

pub struct EditController {
    store: Arc<SnapshotStore>,
    events: Arc<EventLog>,
    pipeline: Arc<CommandPipeline>,
    mode: Mutex<EditMode>,
}

impl EditController {
    pub fn new(
        store: Arc<SnapshotStore>,
        events: Arc<EventLog>,
        pipeline: Arc<CommandPipeline>,
    ) -> Self {
        Self {
            store,
            events,
            pipeline,
            mode: Mutex::new(EditMode::Viewing),
        }
    }

    fn mode_guard(&self) -> MutexGuard<'_, EditMode> {
        self.mode
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mode(&self) -> EditMode {
        self.mode_guard().clone()
    }

    pub fn editing_entry(&self) -> Option<EntryId> {
        match &*self.mode_guard() {
            EditMode::Editing { entry_id, .. } => Some(*entry_id),
            EditMode::Viewing => None,
        }
    }

    pub fn draft(&self) -> Option<EntryDraft> {
        match &*self.mode_guard() {
            EditMode::Editing { draft, .. } => Some(draft.clone()),
            EditMode::Viewing => None,
        }
    }

    /// 进入编辑。Viewing 或正在编辑其它行都允许，后者丢弃旧草稿。
    pub fn start_edit(&self, entry: &FleetEntry) {
        let mut mode = self.mode_guard();
        if let EditMode::Editing { entry_id, .. } = &*mode
            && *entry_id != entry.id
        {
            info!(
                target: "fleet.edit",
                discarded = *entry_id,
                entry_id = entry.id,
                "draft_discarded"
            );
        }
        *mode = EditMode::Editing {
            entry_id: entry.id,
            draft: EntryDraft::from_entry(entry),
        };
    }

    /// 退出编辑，丢弃草稿，不触发远端调用。
    pub fn cancel_edit(&self) {
        let mut mode = self.mode_guard();
        if let EditMode::Editing { entry_id, .. } = &*mode {
            debug!(target: "fleet.edit", entry_id = *entry_id, "edit_cancelled");
        }
        *mode = EditMode::Viewing;
    }

    fn update_draft(&self, apply: impl FnOnce(&mut EntryDraft)) -> Result<(), EditError> {
        match &mut *self.mode_guard() {
            EditMode::Editing { draft, .. } => {
                apply(draft);
                Ok(())
            }
            EditMode::Viewing => Err(EditError::NotEditing),
        }
    }

    pub fn set_role(&self, role: Role) -> Result<(), EditError> {
        self.update_draft(|draft| draft.role = role)
    }

    pub fn set_email(&self, email: impl Into<String>) -> Result<(), EditError> {
        let email = email.into();
        self.update_draft(|draft| draft.email = email)
    }

    pub fn set_paid_leave_days(&self, days: f64) -> Result<(), EditError> {
        self.update_draft(|draft| draft.paid_leave_days = days)
    }

    pub fn set_joined_date(&self, date: impl Into<String>) -> Result<(), EditError> {
        let date = date.into();
        self.update_draft(|draft| draft.joined_date = date)
    }

    /// 切换施设：部门重置为该施设的第一个部门，没有则为空。
    pub fn change_facility(&self, facility: &str) -> Result<(), EditError> {
        let department = self.store.org().default_department(facility);
        self.update_draft(|draft| {
            draft.facility = facility.to_string();
            draft.department = department;
        })
    }

    /// 部门只能从当前草稿施设的选项中选择。
    pub fn set_department(&self, department: &str) -> Result<(), EditError> {
        let options = self.department_options()?;
        if !options.iter().any(|option| option == department) {
            debug!(target: "fleet.edit", department = department, "department_not_offered");
            return Ok(());
        }
        self.update_draft(|draft| draft.department = department.to_string())
    }

    /// 当前草稿施设下的部门选项（按名称去重）。
    pub fn department_options(&self) -> Result<Vec<String>, EditError> {
        let facility = self
            .draft()
            .map(|draft| draft.facility)
            .ok_or(EditError::NotEditing)?;
        Ok(self.store.org().departments_for(&facility))
    }

    /// 提交草稿。成功回到 Viewing（流水线已触发全量刷新）；失败保持 Editing 与草稿。
    pub async fn save_edit(&self, ctx: &OperatorContext, entry_id: EntryId) -> Result<(), EditError> {
        let update = match &*self.mode_guard() {
            EditMode::Editing {
                entry_id: editing,
                draft,
            } => {
                if *editing != entry_id {
                    return Err(EditError::EntryMismatch {
                        editing: *editing,
                        requested: entry_id,
                    });
                }
                draft.to_update()
            }
            EditMode::Viewing => return Err(EditError::NotEditing),
        };

        if self.store.entry(entry_id).is_none() {
            self.abandon_draft(entry_id);
            return Err(EditError::EntryGone(entry_id));
        }

        self.pipeline.save_entry(ctx, entry_id, &update).await?;

        let mut mode = self.mode_guard();
        if matches!(&*mode, EditMode::Editing { entry_id: editing, .. } if *editing == entry_id) {
            *mode = EditMode::Viewing;
        }
        Ok(())
    }

    /// 编辑中的条目已不在名册中时丢弃草稿并回到 Viewing。名册刷新后调用；返回是否丢弃。
    pub fn discard_if_gone(&self) -> bool {
        let Some(entry_id) = self.editing_entry() else {
            return false;
        };
        if self.store.entry(entry_id).is_some() {
            return false;
        }
        self.abandon_draft(entry_id);
        true
    }

    fn abandon_draft(&self, entry_id: EntryId) {
        {
            let mut mode = self.mode_guard();
            if matches!(&*mode, EditMode::Editing { entry_id: editing, .. } if *editing == entry_id) {
                *mode = EditMode::Viewing;
            }
        }
        warn!(target: "fleet.edit", entry_id = entry_id, "draft_entry_gone");
        self.events.error(format!(
            "Entry {} no longer exists; edit discarded",
            entry_id
        ));
    }

    // 选择集操作转发到快照存储。

    pub fn toggle(&self, entry_id: EntryId) -> bool {
        self.store.toggle(entry_id)
    }

    pub fn toggle_all(&self) {
        self.store.toggle_all();
    }

    pub fn clear_selection(&self) {
        self.store.clear_selection();
    }

    pub fn selection(&self) -> Vec<EntryId> {
        self.store.selection()
    }
}
