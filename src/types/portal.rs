use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::{AttendanceRecord, AttendanceStats, DatabaseStats, Student, Teacher};
use crate::error::CampusError;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRegistration {
    pub name: String,
    pub roll_no: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub class: String,
    pub year: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
}

impl StudentRegistration {
    pub fn validate(&self) -> Result<(), CampusError> {
        check_password(&self.password, &self.confirm_password)?;
        let required = [
            &self.name,
            &self.roll_no,
            &self.email,
            &self.class,
            &self.year,
        ];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err(CampusError::Validation(
                "Please fill in all required fields".to_string(),
            ));
        }
        check_email(&self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherRegistration {
    pub name: String,
    pub employee_id: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub department: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub joining_date: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub emergency_phone: Option<String>,
}

impl TeacherRegistration {
    pub fn validate(&self) -> Result<(), CampusError> {
        check_password(&self.password, &self.confirm_password)?;
        let required = [&self.name, &self.employee_id, &self.email, &self.department];
        if required.iter().any(|v| v.trim().is_empty())
            || !self.subjects.iter().any(|s| !s.trim().is_empty())
        {
            return Err(CampusError::Validation(
                "Please fill in all required fields and select at least one subject".to_string(),
            ));
        }
        check_email(&self.email)
    }
}

fn check_password(password: &str, confirm: &str) -> Result<(), CampusError> {
    if password != confirm {
        return Err(CampusError::Validation("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CampusError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), CampusError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(CampusError::Validation(
            "Please enter a valid email address".to_string(),
        ))
    }
}

/// `local@domain.tld`: exactly one `@`, no whitespace, and a dot with text on both sides in the domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Blank optional form fields are stored as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub roll_no: Option<String>,
    pub email: Option<String>,
    pub class: Option<String>,
    pub year: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherUpdate {
    pub name: Option<String>,
    pub employee_id: Option<String>,
    pub email: Option<String>,
    pub department: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub joining_date: Option<String>,
    pub emergency_contact: Option<String>,
    pub emergency_phone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceRequest {
    pub date: Option<NaiveDate>,
    pub subject: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTeacherRequest {
    pub employee_id: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyTeacherResponse {
    pub verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassQuery {
    pub class: String,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboard {
    pub student: Student,
    pub records: Vec<AttendanceRecord>,
    pub stats: AttendanceStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherDashboard {
    pub teacher: Teacher,
    pub attendance: Vec<AttendanceStats>,
    pub database: DatabaseStats,
}
