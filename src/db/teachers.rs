use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};

use super::models::{Teacher, TeacherId, TeacherRow, TeacherStats};
use super::seed;
use crate::error::CampusError;
use crate::service::attendance::rounded_ratio;
use crate::types::portal::{TeacherRegistration, TeacherUpdate, non_blank};

/// Faculty records.
#[derive(Debug, Default)]
pub struct TeacherStore {
    teachers: Vec<TeacherRow>,
}

impl TeacherStore {
    pub fn new(teachers: Vec<TeacherRow>) -> Self {
        Self { teachers }
    }

    pub fn seeded() -> Self {
        let store = Self::new(seed::teachers());
        info!(teachers = store.teachers.len(), "teacher store initialized");
        store
    }

    fn active(&self) -> impl Iterator<Item = &Teacher> {
        self.teachers
            .iter()
            .map(|row| &row.teacher)
            .filter(|t| t.is_active)
    }

    fn sorted_by<F>(mut teachers: Vec<Teacher>, key: F) -> Vec<Teacher>
    where
        F: Fn(&Teacher) -> &str,
    {
        teachers.sort_by(|a, b| key(a).cmp(key(b)));
        teachers
    }

    pub fn authenticate(&self, identifier: &str, password: &str) -> Option<Teacher> {
        let found = self.teachers.iter().find(|row| {
            let t = &row.teacher;
            t.is_active
                && (t.employee_id.eq_ignore_ascii_case(identifier)
                    || t.email.eq_ignore_ascii_case(identifier))
                && bool::from(row.password.as_bytes().ct_eq(password.as_bytes()))
        });
        match found {
            Some(row) => {
                info!(
                    employee_id = %row.teacher.employee_id,
                    department = %row.teacher.department,
                    "teacher authenticated"
                );
                Some(row.teacher.clone())
            }
            None => {
                warn!(identifier, "teacher authentication failed");
                None
            }
        }
    }

    pub fn register(
        &mut self,
        reg: TeacherRegistration,
        now: DateTime<Utc>,
    ) -> Result<Teacher, CampusError> {
        let existing = self.teachers.iter().map(|row| &row.teacher).find(|t| {
            t.employee_id.eq_ignore_ascii_case(reg.employee_id.trim())
                || t.email.eq_ignore_ascii_case(reg.email.trim())
        });
        if let Some(existing) = existing {
            let clash = if existing
                .employee_id
                .eq_ignore_ascii_case(reg.employee_id.trim())
            {
                "employee_id"
            } else {
                "email"
            };
            info!(clash, employee_id = %reg.employee_id, "teacher registration rejected: duplicate");
            return Err(CampusError::DuplicateTeacher);
        }

        let id = self
            .teachers
            .iter()
            .map(|row| row.teacher.id)
            .max()
            .unwrap_or(0)
            + 1;
        let teacher = Teacher {
            id,
            name: reg.name.trim().to_string(),
            employee_id: reg.employee_id.trim().to_uppercase(),
            email: reg.email.trim().to_lowercase(),
            department: reg.department.trim().to_string(),
            subjects: reg
                .subjects
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            phone: non_blank(reg.phone),
            address: non_blank(reg.address),
            date_of_birth: non_blank(reg.date_of_birth),
            gender: non_blank(reg.gender),
            qualification: non_blank(reg.qualification),
            experience: non_blank(reg.experience),
            joining_date: non_blank(reg.joining_date),
            emergency_contact: non_blank(reg.emergency_contact),
            emergency_phone: non_blank(reg.emergency_phone),
            created_at: now,
            is_active: true,
        };
        self.teachers.push(TeacherRow {
            teacher: teacher.clone(),
            password: reg.password,
        });
        info!(
            id,
            employee_id = %teacher.employee_id,
            total = self.teachers.len(),
            "teacher registered"
        );
        Ok(teacher)
    }

    /// Active teachers ordered by employee id.
    pub fn list_active(&self) -> Vec<Teacher> {
        Self::sorted_by(self.active().cloned().collect(), |t| &t.employee_id)
    }

    pub fn get(&self, id: TeacherId) -> Option<Teacher> {
        self.active().find(|t| t.id == id).cloned()
    }

    pub fn get_by_employee_id(&self, employee_id: &str) -> Option<Teacher> {
        self.active()
            .find(|t| t.employee_id.eq_ignore_ascii_case(employee_id))
            .cloned()
    }

    pub fn by_department(&self, department: &str) -> Vec<Teacher> {
        let found = self
            .active()
            .filter(|t| t.department.eq_ignore_ascii_case(department))
            .cloned()
            .collect();
        Self::sorted_by(found, |t| &t.employee_id)
    }

    pub fn by_subject(&self, subject: &str) -> Vec<Teacher> {
        let found = self
            .active()
            .filter(|t| t.subjects.iter().any(|s| s.eq_ignore_ascii_case(subject)))
            .cloned()
            .collect();
        Self::sorted_by(found, |t| &t.name)
    }

    /// Substring match over name, employee id, email, department, subjects and qualification.
    pub fn search(&self, query: &str) -> Vec<Teacher> {
        let term = query.to_lowercase();
        let hit = |field: &str| field.to_lowercase().contains(&term);
        let found: Vec<Teacher> = self
            .active()
            .filter(|t| {
                hit(&t.name)
                    || hit(&t.employee_id)
                    || hit(&t.email)
                    || hit(&t.department)
                    || t.subjects.iter().any(|s| hit(s))
                    || t.qualification.as_deref().is_some_and(hit)
            })
            .cloned()
            .collect();
        debug!(query, count = found.len(), "teacher search");
        Self::sorted_by(found, |t| &t.name)
    }

    /// `Ok(None)` when the id is unknown; email/employee id may not collide with another active teacher.
    pub fn update(
        &mut self,
        id: TeacherId,
        update: TeacherUpdate,
    ) -> Result<Option<Teacher>, CampusError> {
        let Some(index) = self.teachers.iter().position(|row| row.teacher.id == id) else {
            info!(id, "teacher update failed: not found");
            return Ok(None);
        };

        let conflict = self.teachers.iter().enumerate().find_map(|(i, row)| {
            if i == index || !row.teacher.is_active {
                return None;
            }
            if update
                .email
                .as_deref()
                .is_some_and(|e| row.teacher.email.eq_ignore_ascii_case(e))
            {
                return Some("Email");
            }
            if update
                .employee_id
                .as_deref()
                .is_some_and(|e| row.teacher.employee_id.eq_ignore_ascii_case(e))
            {
                return Some("Employee ID");
            }
            None
        });
        if let Some(field) = conflict {
            info!(id, field, "teacher update rejected: conflict");
            return Err(CampusError::UpdateConflict(field));
        }

        let t = &mut self.teachers[index].teacher;
        if let Some(v) = update.name {
            t.name = v;
        }
        if let Some(v) = update.employee_id {
            t.employee_id = v.to_uppercase();
        }
        if let Some(v) = update.email {
            t.email = v.to_lowercase();
        }
        if let Some(v) = update.department {
            t.department = v;
        }
        if let Some(v) = update.subjects {
            t.subjects = v;
        }
        let optional = [
            (&mut t.phone, update.phone),
            (&mut t.address, update.address),
            (&mut t.date_of_birth, update.date_of_birth),
            (&mut t.gender, update.gender),
            (&mut t.qualification, update.qualification),
            (&mut t.experience, update.experience),
            (&mut t.joining_date, update.joining_date),
            (&mut t.emergency_contact, update.emergency_contact),
            (&mut t.emergency_phone, update.emergency_phone),
        ];
        for (slot, value) in optional {
            if value.is_some() {
                *slot = non_blank(value);
            }
        }
        if let Some(v) = update.is_active {
            t.is_active = v;
        }
        info!(id, employee_id = %t.employee_id, "teacher updated");
        Ok(Some(t.clone()))
    }

    pub fn stats(&self) -> TeacherStats {
        let mut department_count = BTreeMap::new();
        let mut subject_count = BTreeMap::new();
        let mut active_teachers = 0;
        let mut experience_years = Vec::new();

        for teacher in self.active() {
            active_teachers += 1;
            *department_count
                .entry(teacher.department.clone())
                .or_insert(0) += 1;
            for subject in &teacher.subjects {
                *subject_count.entry(subject.clone()).or_insert(0) += 1;
            }
            if let Some(experience) = teacher.experience.as_deref() {
                experience_years.push(experience_years_of(experience));
            }
        }

        let average_experience = if experience_years.is_empty() {
            0
        } else {
            rounded_ratio(
                experience_years.iter().sum(),
                experience_years.len() as u64,
            ) as u32
        };

        TeacherStats {
            total_teachers: self.teachers.len(),
            active_teachers,
            department_count,
            subject_count,
            average_experience,
        }
    }

    /// Both the employee id and the email must belong to the same active teacher.
    pub fn verify(&self, employee_id: &str, email: &str) -> bool {
        let verified = self.active().any(|t| {
            t.employee_id.eq_ignore_ascii_case(employee_id) && t.email.eq_ignore_ascii_case(email)
        });
        info!(employee_id, verified, "teacher verification");
        verified
    }

    pub fn departments(&self) -> Vec<String> {
        self.active()
            .map(|t| t.department.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.active()
            .flat_map(|t| t.subjects.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Digits of a free-text experience field read as whole years ("8 years" -> 8).
fn experience_years_of(experience: &str) -> u64 {
    let digits: String = experience.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(employee_id: &str, email: &str) -> TeacherRegistration {
        TeacherRegistration {
            name: "Ana Ruiz".to_string(),
            employee_id: employee_id.to_string(),
            email: email.to_string(),
            password: "physics1".to_string(),
            confirm_password: "physics1".to_string(),
            department: "Physics".to_string(),
            subjects: vec!["Optics".to_string(), "Mechanics".to_string()],
            phone: None,
            address: None,
            date_of_birth: None,
            gender: None,
            qualification: Some("Ph.D. in Physics".to_string()),
            experience: Some("4".to_string()),
            joining_date: None,
            emergency_contact: None,
            emergency_phone: None,
        }
    }

    #[test]
    fn authenticates_by_employee_id_or_email() {
        let store = TeacherStore::seeded();
        assert_eq!(store.authenticate("t001", "teacher123").unwrap().id, 1);
        assert_eq!(
            store
                .authenticate("MICHAEL.CHEN@university.edu", "teacher123")
                .unwrap()
                .employee_id,
            "T002"
        );
        assert!(store.authenticate("T001", "Teacher123").is_none());
    }

    #[test]
    fn registration_rejects_duplicates_and_normalizes() {
        let mut store = TeacherStore::seeded();
        assert!(matches!(
            store.register(registration("t001", "ana@university.edu"), Utc::now()),
            Err(CampusError::DuplicateTeacher)
        ));
        assert!(matches!(
            store.register(
                registration("T100", "Sarah.Johnson@University.edu"),
                Utc::now()
            ),
            Err(CampusError::DuplicateTeacher)
        ));
        let teacher = store
            .register(registration("t100", "Ana.Ruiz@University.edu"), Utc::now())
            .unwrap();
        assert_eq!(teacher.id, 6);
        assert_eq!(teacher.employee_id, "T100");
        assert_eq!(teacher.email, "ana.ruiz@university.edu");
        assert!(store.authenticate("T100", "physics1").is_some());
    }

    #[test]
    fn directory_queries() {
        let store = TeacherStore::seeded();
        let all = store.list_active();
        assert_eq!(
            all.iter().map(|t| t.employee_id.as_str()).collect::<Vec<_>>(),
            ["T001", "T002", "T003", "T004", "T005"]
        );
        assert_eq!(store.by_department("computer science").len(), 2);
        assert_eq!(store.by_subject("ALGORITHMS")[0].employee_id, "T001");
        let phd = store.search("ph.d");
        assert_eq!(phd.len(), 4);
        assert!(phd.windows(2).all(|w| w[0].name <= w[1].name));
        assert_eq!(store.get_by_employee_id("t004").unwrap().department, "Electronics");
        assert!(store.get(9).is_none());
    }

    #[test]
    fn stats_count_departments_subjects_and_experience() {
        let stats = TeacherStore::seeded().stats();
        assert_eq!(stats.total_teachers, 5);
        assert_eq!(stats.active_teachers, 5);
        assert_eq!(stats.department_count["Computer Science"], 2);
        assert_eq!(stats.department_count.len(), 4);
        assert_eq!(stats.subject_count.len(), 15);
        // (8 + 12 + 6 + 15 + 10) / 5 = 10.2
        assert_eq!(stats.average_experience, 10);
    }

    #[test]
    fn update_checks_conflicts_against_other_teachers() {
        let mut store = TeacherStore::seeded();
        let err = store
            .update(
                1,
                TeacherUpdate {
                    employee_id: Some("t002".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Update failed: Employee ID already exists");

        let same_email = store
            .update(
                1,
                TeacherUpdate {
                    email: Some("sarah.johnson@university.edu".to_string()),
                    experience: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(same_email.experience, None);
    }

    #[test]
    fn verify_departments_and_subjects() {
        let store = TeacherStore::seeded();
        assert!(store.verify("T003", "emily.rodriguez@university.edu"));
        assert!(!store.verify("T003", "sarah.johnson@university.edu"));
        assert_eq!(
            store.departments(),
            [
                "Computer Science",
                "Electronics",
                "Information Technology",
                "Mechanical"
            ]
        );
        let subjects = store.subjects();
        assert_eq!(subjects.len(), 15);
        assert!(subjects.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn experience_digits() {
        assert_eq!(experience_years_of("8 years"), 8);
        assert_eq!(experience_years_of("12"), 12);
        assert_eq!(experience_years_of("n/a"), 0);
    }
}
