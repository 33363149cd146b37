//! 恢复确认清单：与导入数据匹配上的已软删除条目，默认全部勾选。

use domain::FleetEntry;

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreChecklist {
    entries: Vec<FleetEntry>,
    /// 勾选的职员番号（按勾选顺序）。
    checked: Vec<String>,
}

impl RestoreChecklist {
    pub fn new(entries: Vec<FleetEntry>) -> Self {
        let checked = entries
            .iter()
            .map(|entry| entry.employee_id.clone())
            .collect();
        Self { entries, checked }
    }

    pub fn entries(&self) -> &[FleetEntry] {
        &self.entries
    }

    pub fn checked(&self) -> &[String] {
        &self.checked
    }

    pub fn is_checked(&self, employee_id: &str) -> bool {
        self.checked.iter().any(|id| id == employee_id)
    }

    /// 切换一行；不在清单中的番号被忽略。返回切换后是否勾选。
    pub fn toggle(&mut self, employee_id: &str) -> bool {
        if let Some(position) = self.checked.iter().position(|id| id == employee_id) {
            self.checked.remove(position);
            return false;
        }
        if self
            .entries
            .iter()
            .any(|entry| entry.employee_id == employee_id)
        {
            self.checked.push(employee_id.to_string());
            return true;
        }
        false
    }

    /// 全选 ↔ 全不选（按勾选数是否等于行数判断）。
    pub fn toggle_all(&mut self) {
        if self.checked.len() == self.entries.len() {
            self.checked.clear();
        } else {
            self.checked = self
                .entries
                .iter()
                .map(|entry| entry.employee_id.clone())
                .collect();
        }
    }

    /// 没有勾选时确认按钮不可用。
    pub fn can_confirm(&self) -> bool {
        !self.checked.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Role;

    fn deleted(employee_id: &str) -> FleetEntry {
        FleetEntry {
            id: 1,
            employee_id: employee_id.to_string(),
            name: "山田 太郎".to_string(),
            facility: "本館".to_string(),
            department: "事務部".to_string(),
            email: None,
            role: Role::User,
            joined_date: None,
            paid_leave_days: 0.0,
            deleted_at: Some("2026-09-01T00:00:00Z".to_string()),
        }
    }

    #[test]
    fn starts_fully_checked_and_disables_confirm_when_empty() {
        let mut checklist = RestoreChecklist::new(vec![deleted("E1"), deleted("E2")]);
        assert_eq!(checklist.checked(), ["E1".to_string(), "E2".to_string()]);
        assert!(!checklist.toggle("E1"));
        assert!(!checklist.toggle("E9"));
        assert!(!checklist.toggle("E2"));
        assert!(!checklist.can_confirm());
        checklist.toggle_all();
        assert_eq!(checklist.checked().len(), 2);
        checklist.toggle_all();
        assert!(checklist.checked().is_empty());
    }
}
