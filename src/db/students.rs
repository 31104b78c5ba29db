use chrono::{DateTime, Local, Timelike, Utc};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use super::models::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, DatabaseStats, Student, StudentId,
    StudentRow,
};
use super::seed;
use crate::error::CampusError;
use crate::service::attendance::AttendanceSummary;
use crate::types::portal::{MarkAttendanceRequest, StudentRegistration, StudentUpdate, non_blank};

pub const DEFAULT_SUBJECT: &str = "General";
pub const DEFAULT_LOCATION: &str = "Room 101";

/// Students and their attendance records.
#[derive(Debug, Default)]
pub struct StudentStore {
    students: Vec<StudentRow>,
    records: Vec<AttendanceRecord>,
}

impl StudentStore {
    pub fn new(students: Vec<StudentRow>, records: Vec<AttendanceRecord>) -> Self {
        Self { students, records }
    }

    pub fn seeded() -> Self {
        let store = Self::new(seed::students(), seed::attendance());
        info!(
            students = store.students.len(),
            records = store.records.len(),
            "student store initialized"
        );
        store
    }

    fn active(&self) -> impl Iterator<Item = &Student> {
        self.students
            .iter()
            .map(|row| &row.student)
            .filter(|s| s.is_active)
    }

    /// Identifier is a roll number or email, matched case-insensitively; the password must match exactly.
    pub fn authenticate(&self, identifier: &str, password: &str) -> Option<Student> {
        let found = self.students.iter().find(|row| {
            let s = &row.student;
            s.is_active
                && (s.roll_no.eq_ignore_ascii_case(identifier)
                    || s.email.eq_ignore_ascii_case(identifier))
                && bool::from(row.password.as_bytes().ct_eq(password.as_bytes()))
        });
        match found {
            Some(row) => {
                info!(roll_no = %row.student.roll_no, "student authenticated");
                Some(row.student.clone())
            }
            None => {
                warn!(identifier, "student authentication failed");
                None
            }
        }
    }

    pub fn register(
        &mut self,
        reg: StudentRegistration,
        now: DateTime<Utc>,
    ) -> Result<Student, CampusError> {
        let duplicate = self.students.iter().any(|row| {
            row.student.roll_no.eq_ignore_ascii_case(reg.roll_no.trim())
                || row.student.email.eq_ignore_ascii_case(reg.email.trim())
        });
        if duplicate {
            info!(roll_no = %reg.roll_no, email = %reg.email, "student registration rejected: duplicate");
            return Err(CampusError::DuplicateStudent);
        }

        let student = Student {
            id: self.next_student_id(),
            name: reg.name.trim().to_string(),
            roll_no: reg.roll_no.trim().to_uppercase(),
            email: reg.email.trim().to_lowercase(),
            class: reg.class.trim().to_string(),
            year: reg.year.trim().to_string(),
            phone: non_blank(reg.phone),
            address: non_blank(reg.address),
            date_of_birth: non_blank(reg.date_of_birth),
            gender: non_blank(reg.gender),
            guardian_name: non_blank(reg.guardian_name),
            guardian_phone: non_blank(reg.guardian_phone),
            created_at: now,
            is_active: true,
        };
        self.students.push(StudentRow {
            student: student.clone(),
            password: reg.password,
        });
        info!(id = student.id, roll_no = %student.roll_no, "student registered");
        Ok(student)
    }

    fn next_student_id(&self) -> StudentId {
        self.students
            .iter()
            .map(|row| row.student.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn list_active(&self) -> Vec<Student> {
        self.active().cloned().collect()
    }

    pub fn get(&self, id: StudentId) -> Option<Student> {
        self.active().find(|s| s.id == id).cloned()
    }

    pub fn get_by_roll_no(&self, roll_no: &str) -> Option<Student> {
        self.active()
            .find(|s| s.roll_no.eq_ignore_ascii_case(roll_no))
            .cloned()
    }

    /// Substring match over name, roll number, email and class.
    pub fn search(&self, query: &str) -> Vec<Student> {
        let term = query.to_lowercase();
        let results: Vec<Student> = self
            .active()
            .filter(|s| {
                [&s.name, &s.roll_no, &s.email, &s.class]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            })
            .cloned()
            .collect();
        debug!(query, count = results.len(), "student search");
        results
    }

    pub fn by_class(&self, class: &str, year: Option<&str>) -> Vec<Student> {
        self.active()
            .filter(|s| s.class.eq_ignore_ascii_case(class))
            .filter(|s| year.is_none_or(|y| s.year.eq_ignore_ascii_case(y)))
            .cloned()
            .collect()
    }

    /// `Ok(None)` when the id is unknown.
    pub fn update(
        &mut self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<Option<Student>, CampusError> {
        let Some(index) = self.students.iter().position(|row| row.student.id == id) else {
            return Ok(None);
        };

        let conflict = self.students.iter().enumerate().find_map(|(i, row)| {
            if i == index || !row.student.is_active {
                return None;
            }
            if update
                .email
                .as_deref()
                .is_some_and(|e| row.student.email.eq_ignore_ascii_case(e))
            {
                return Some("Email");
            }
            if update
                .roll_no
                .as_deref()
                .is_some_and(|r| row.student.roll_no.eq_ignore_ascii_case(r))
            {
                return Some("Roll number");
            }
            None
        });
        if let Some(field) = conflict {
            return Err(CampusError::UpdateConflict(field));
        }

        let s = &mut self.students[index].student;
        if let Some(v) = update.name {
            s.name = v;
        }
        if let Some(v) = update.roll_no {
            s.roll_no = v.to_uppercase();
        }
        if let Some(v) = update.email {
            s.email = v.to_lowercase();
        }
        if let Some(v) = update.class {
            s.class = v;
        }
        if let Some(v) = update.year {
            s.year = v;
        }
        if update.phone.is_some() {
            s.phone = non_blank(update.phone);
        }
        if update.address.is_some() {
            s.address = non_blank(update.address);
        }
        if update.date_of_birth.is_some() {
            s.date_of_birth = non_blank(update.date_of_birth);
        }
        if update.gender.is_some() {
            s.gender = non_blank(update.gender);
        }
        if update.guardian_name.is_some() {
            s.guardian_name = non_blank(update.guardian_name);
        }
        if update.guardian_phone.is_some() {
            s.guardian_phone = non_blank(update.guardian_phone);
        }
        if let Some(v) = update.is_active {
            s.is_active = v;
        }
        info!(id, "student updated");
        Ok(Some(s.clone()))
    }

    /// One record per (student, date, subject): a repeat mark refreshes the existing record.
    pub fn mark_attendance(
        &mut self,
        student_id: StudentId,
        req: MarkAttendanceRequest,
        now: DateTime<Local>,
    ) -> Result<AttendanceRecord, CampusError> {
        if !self.students.iter().any(|row| row.student.id == student_id) {
            return Err(CampusError::StudentNotFound);
        }
        let date = req.date.unwrap_or_else(|| now.date_naive());
        let subject = non_blank(req.subject).unwrap_or_else(|| DEFAULT_SUBJECT.to_string());
        let time_in = now.time().with_nanosecond(0).unwrap_or_else(|| now.time());

        if let Some(existing) = self.records.iter_mut().find(|r| {
            r.student_id == student_id && r.date == date && r.subject.as_deref() == Some(&subject)
        }) {
            existing.time_in = Some(time_in);
            existing.status = AttendanceStatus::Present;
            existing.marked_by = Some(student_id);
            info!(student_id, %date, subject = %subject, "attendance re-marked");
            return Ok(existing.clone());
        }

        let record = AttendanceRecord {
            id: self.records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            student_id,
            date,
            time_in: Some(time_in),
            time_out: None,
            status: AttendanceStatus::Present,
            subject: Some(subject),
            location: Some(
                non_blank(req.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            ),
            marked_by: Some(student_id),
            created_at: now.with_timezone(&Utc),
        };
        info!(student_id, %date, record_id = record.id, "attendance marked");
        self.records.push(record.clone());
        Ok(record)
    }

    /// Newest date first.
    pub fn attendance_of(&self, student_id: StudentId) -> Vec<AttendanceRecord> {
        let mut records: Vec<AttendanceRecord> = self
            .records_of(student_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    fn records_of(&self, student_id: StudentId) -> impl Iterator<Item = &AttendanceRecord> {
        self.records.iter().filter(move |r| r.student_id == student_id)
    }

    pub fn stats_of(&self, student_id: StudentId) -> Option<AttendanceStats> {
        let student = self
            .students
            .iter()
            .map(|row| &row.student)
            .find(|s| s.id == student_id)?;
        Some(AttendanceSummary::from_records(self.records_of(student_id)).into_stats(student))
    }

    /// Active students only, ordered by roll number.
    pub fn all_stats(&self) -> Vec<AttendanceStats> {
        let mut stats: Vec<AttendanceStats> = self
            .active()
            .map(|s| AttendanceSummary::from_records(self.records_of(s.id)).into_stats(s))
            .collect();
        stats.sort_by(|a, b| a.roll_no.cmp(&b.roll_no));
        stats
    }

    pub fn database_stats(&self) -> DatabaseStats {
        let rates: Vec<f64> = self
            .active()
            .map(|s| AttendanceSummary::from_records(self.records_of(s.id)).exact_percentage())
            .collect();
        let average_attendance = if rates.is_empty() {
            0
        } else {
            (rates.iter().sum::<f64>() / rates.len() as f64).round() as u32
        };
        DatabaseStats {
            total_students: self.students.len(),
            active_students: rates.len(),
            total_attendance_records: self.records.len(),
            average_attendance,
        }
    }
}
