//! 批量注册 CSV 解析。
//!
//! 列：`employeeId,name,facility,department,role`。首行为表头；空行与不足 5 列的行跳过。

use domain::{RegistrationRequest, Role};

/// 新注册条目的初始口令。
pub const DEFAULT_PASSWORD: &str = "password123";

const FULL_WIDTH_SPACE: char = '\u{3000}';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CsvError {
    /// 姓与名之间缺少空格（半角或全角）。`row` 从 1 开始，按非空行计数。
    #[error("row {row}: name [{name}] has no space between family and given name")]
    MissingNameSpace { row: usize, name: String },
    #[error("no valid rows found")]
    Empty,
}

pub fn parse_registration_csv(text: &str) -> Result<Vec<RegistrationRequest>, CsvError> {
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let mut rows = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(1) {
        let cols: Vec<&str> = line.split(',').map(str::trim).collect();
        if cols.len() < 5 {
            continue;
        }
        let name = cols[1];
        if !name.is_empty() && !name.contains(' ') && !name.contains(FULL_WIDTH_SPACE) {
            return Err(CsvError::MissingNameSpace {
                row: index + 1,
                name: name.to_string(),
            });
        }
        let role = if cols[4].is_empty() {
            Role::User
        } else {
            Role::parse(&cols[4].to_uppercase())
        };
        rows.push(RegistrationRequest {
            employee_id: cols[0].to_string(),
            name: name.to_string(),
            password: Some(DEFAULT_PASSWORD.to_string()),
            facility: cols[2].to_string(),
            department: cols[3].to_string(),
            role,
            email: None,
            paid_leave_days: None,
            joined_date: None,
        });
    }
    if rows.is_empty() {
        return Err(CsvError::Empty);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_skips_noise() {
        let text = "employeeId,name,facility,department,role\n\
                    E001,山田 太郎,本館,3階病棟,user\n\
                    \n\
                    E002,short,row\n\
                    E003,佐藤\u{3000}花子,南棟,透析室,\r\n";
        let rows = parse_registration_csv(text).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].role, Role::User);
        assert_eq!(rows[0].password.as_deref(), Some(DEFAULT_PASSWORD));
        assert_eq!(rows[1].employee_id, "E003");
        assert_eq!(rows[1].role, Role::User);
    }

    #[test]
    fn rejects_name_without_space_with_row_number() {
        let text = "header\nE001,山田 太郎,本館,事務部,ADMIN\nE002,山田太郎,本館,事務部,USER\n";
        let err = parse_registration_csv(text).expect_err("no space");
        assert_eq!(
            err,
            CsvError::MissingNameSpace {
                row: 3,
                name: "山田太郎".to_string()
            }
        );
    }

    #[test]
    fn header_only_is_empty() {
        assert_eq!(
            parse_registration_csv("employeeId,name,facility,department,role\n"),
            Err(CsvError::Empty)
        );
    }
}
