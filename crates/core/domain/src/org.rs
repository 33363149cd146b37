//! 组织主数据（施设 / 部门）。

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub facility_id: i64,
}

/// 组织目录：部门选项始终由施设派生。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgDirectory {
    pub facilities: Vec<Facility>,
    pub departments: Vec<Department>,
}

impl OrgDirectory {
    pub fn new(facilities: Vec<Facility>, departments: Vec<Department>) -> Self {
        Self {
            facilities,
            departments,
        }
    }

    pub fn facility_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for facility in &self.facilities {
            if !names.contains(&facility.name) {
                names.push(facility.name.clone());
            }
        }
        names
    }

    /// 施设下的部门名（按主数据顺序，按名称去重）。施设未知时为空。
    pub fn departments_for(&self, facility_name: &str) -> Vec<String> {
        let facility_ids: Vec<i64> = self
            .facilities
            .iter()
            .filter(|facility| facility.name == facility_name)
            .map(|facility| facility.id)
            .collect();
        let mut names: Vec<String> = Vec::new();
        for department in &self.departments {
            if facility_ids.contains(&department.facility_id) && !names.contains(&department.name)
            {
                names.push(department.name.clone());
            }
        }
        names
    }

    /// 切换施设后的默认部门：该施设第一个部门，没有则为空串。
    pub fn default_department(&self, facility_name: &str) -> String {
        self.departments_for(facility_name)
            .into_iter()
            .next()
            .unwrap_or_default()
    }
}
