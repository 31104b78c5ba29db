use crate::db::models::{AttendanceRecord, AttendanceStats, AttendanceStatus, Student};

/// Present/absent counts over one student's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub total_days: u32,
    pub present_days: u32,
}

impl AttendanceSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        records
            .into_iter()
            .fold(Self::default(), |mut acc, record| {
                acc.total_days += 1;
                if record.status == AttendanceStatus::Present {
                    acc.present_days += 1;
                }
                acc
            })
    }

    pub fn absent_days(&self) -> u32 {
        self.total_days - self.present_days
    }

    pub fn percentage(&self) -> u32 {
        attendance_percentage(self.present_days, self.total_days)
    }

    /// Unrounded percentage, used when averaging across students.
    pub fn exact_percentage(&self) -> f64 {
        if self.total_days == 0 {
            return 0.0;
        }
        f64::from(self.present_days) / f64::from(self.total_days) * 100.0
    }

    pub fn into_stats(self, student: &Student) -> AttendanceStats {
        AttendanceStats {
            student_id: student.id,
            student_name: student.name.clone(),
            roll_no: student.roll_no.clone(),
            class: student.class.clone(),
            year: student.year.clone(),
            total_days: self.total_days,
            present_days: self.present_days,
            absent_days: self.absent_days(),
            attendance_percentage: self.percentage(),
        }
    }
}

/// `round(present / total * 100)` with halves rounding up; 0 when there are no records.
pub fn attendance_percentage(present: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    rounded_ratio(u64::from(present) * 100, u64::from(total)) as u32
}

/// Integer division rounding half up. `denominator` must be non-zero.
pub(crate) fn rounded_ratio(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}
