//! Demo records loaded into a fresh process.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use super::models::{
    AttendanceRecord, AttendanceStatus, Student, StudentRow, Teacher, TeacherRow,
};

pub(crate) fn date(s: &str) -> NaiveDate {
    s.parse().unwrap_or_default()
}

pub(crate) fn clock(s: &str) -> NaiveTime {
    s.parse().unwrap_or_default()
}

pub(crate) fn stamp(s: &str) -> DateTime<Utc> {
    s.parse().unwrap_or_default()
}

const SEEDED_AT: &str = "2024-01-01T00:00:00Z";

// name, roll_no, year, class, phone, address, date_of_birth, gender, guardian, guardian_phone
type StudentSeed = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

const CS: &str = "Computer Science";
const IT: &str = "Information Technology";

const STUDENTS: [StudentSeed; 10] = [
    ("Alice Johnson", "CS001", "3rd Year", CS, "+1234567890", "123 Main St, City", "2002-05-15", "Female", "Robert Johnson", "+1234567891"),
    ("Bob Smith", "CS002", "3rd Year", CS, "+1234567892", "456 Oak Ave, City", "2002-03-22", "Male", "Mary Smith", "+1234567893"),
    ("Carol Davis", "CS003", "3rd Year", CS, "+1234567894", "789 Pine St, City", "2002-07-08", "Female", "John Davis", "+1234567895"),
    ("David Wilson", "CS004", "3rd Year", CS, "+1234567896", "321 Elm St, City", "2002-01-30", "Male", "Sarah Wilson", "+1234567897"),
    ("Emma Brown", "CS005", "3rd Year", CS, "+1234567898", "654 Maple Ave, City", "2002-09-12", "Female", "Michael Brown", "+1234567899"),
    ("Frank Miller", "CS006", "2nd Year", CS, "+1234567800", "987 Cedar St, City", "2003-04-18", "Male", "Lisa Miller", "+1234567801"),
    ("Grace Lee", "CS007", "2nd Year", CS, "+1234567802", "147 Birch Ave, City", "2003-06-25", "Female", "James Lee", "+1234567803"),
    ("Henry Taylor", "CS008", "1st Year", CS, "+1234567804", "258 Spruce St, City", "2004-02-14", "Male", "Anna Taylor", "+1234567805"),
    ("Ivy Chen", "IT001", "2nd Year", IT, "+1234567806", "369 Willow Ave, City", "2003-08-07", "Female", "David Chen", "+1234567807"),
    ("Jack Rodriguez", "IT002", "1st Year", IT, "+1234567808", "741 Poplar St, City", "2004-11-03", "Male", "Maria Rodriguez", "+1234567809"),
];

/// Demo password: lowercased first name followed by `123`.
fn demo_password(name: &str) -> String {
    let first = name.split(' ').next().unwrap_or(name);
    format!("{}123", first.to_lowercase())
}

pub fn students() -> Vec<StudentRow> {
    STUDENTS
        .iter()
        .zip(1..)
        .map(
            |(&(name, roll_no, year, class, phone, address, dob, gender, guardian, guardian_phone), id)| {
                let email = format!("{}@university.edu", name.to_lowercase().replace(' ', "."));
                StudentRow {
                    password: demo_password(name),
                    student: Student {
                        id,
                        name: name.to_string(),
                        roll_no: roll_no.to_string(),
                        email,
                        class: class.to_string(),
                        year: year.to_string(),
                        phone: Some(phone.to_string()),
                        address: Some(address.to_string()),
                        date_of_birth: Some(dob.to_string()),
                        gender: Some(gender.to_string()),
                        guardian_name: Some(guardian.to_string()),
                        guardian_phone: Some(guardian_phone.to_string()),
                        created_at: stamp(SEEDED_AT),
                        is_active: true,
                    },
                }
            },
        )
        .collect()
}

// student_id, date, time_in ("" when absent), subject, room
const ATTENDANCE: [(i64, &str, &str, &str, &str); 10] = [
    (1, "2024-01-15", "09:00:00", "Data Structures", "Room 101"),
    (1, "2024-01-16", "09:00:00", "Database Management", "Room 102"),
    (1, "2024-01-17", "", "Computer Networks", "Room 103"),
    (1, "2024-01-18", "09:00:00", "Operating Systems", "Room 104"),
    (1, "2024-01-19", "09:00:00", "Software Engineering", "Room 105"),
    (2, "2024-01-15", "09:05:00", "Data Structures", "Room 101"),
    (2, "2024-01-16", "09:00:00", "Database Management", "Room 102"),
    (2, "2024-01-17", "09:00:00", "Computer Networks", "Room 103"),
    (2, "2024-01-18", "", "Operating Systems", "Room 104"),
    (2, "2024-01-19", "09:00:00", "Software Engineering", "Room 105"),
];

pub fn attendance() -> Vec<AttendanceRecord> {
    ATTENDANCE
        .iter()
        .zip(1..)
        .map(|(&(student_id, day, time_in, subject, location), id)| {
            let present = !time_in.is_empty();
            let created = if present {
                format!("{day}T{time_in}Z")
            } else {
                format!("{day}T09:00:00Z")
            };
            AttendanceRecord {
                id,
                student_id,
                date: date(day),
                time_in: present.then(|| clock(time_in)),
                time_out: None,
                status: if present {
                    AttendanceStatus::Present
                } else {
                    AttendanceStatus::Absent
                },
                subject: Some(subject.to_string()),
                location: Some(location.to_string()),
                marked_by: present.then_some(student_id),
                created_at: stamp(&created),
            }
        })
        .collect()
}

struct TeacherSeed {
    name: &'static str,
    employee_id: &'static str,
    email: &'static str,
    department: &'static str,
    subjects: [&'static str; 3],
    phone: &'static str,
    address: &'static str,
    date_of_birth: &'static str,
    gender: &'static str,
    qualification: &'static str,
    experience: &'static str,
    joining_date: &'static str,
    emergency_contact: &'static str,
    emergency_phone: &'static str,
}

const TEACHERS: [TeacherSeed; 5] = [
    TeacherSeed {
        name: "Dr. Sarah Johnson",
        employee_id: "T001",
        email: "sarah.johnson@university.edu",
        department: "Computer Science",
        subjects: ["Data Structures", "Algorithms", "Database Management"],
        phone: "+1234567900",
        address: "123 Faculty Lane, University City",
        date_of_birth: "1985-03-15",
        gender: "Female",
        qualification: "Ph.D. in Computer Science",
        experience: "8 years",
        joining_date: "2020-08-15",
        emergency_contact: "John Johnson",
        emergency_phone: "+1234567999",
    },
    TeacherSeed {
        name: "Prof. Michael Chen",
        employee_id: "T002",
        email: "michael.chen@university.edu",
        department: "Computer Science",
        subjects: ["Operating Systems", "Computer Networks", "Software Engineering"],
        phone: "+1234567901",
        address: "456 Academic Ave, University City",
        date_of_birth: "1980-07-22",
        gender: "Male",
        qualification: "Ph.D. in Software Engineering",
        experience: "12 years",
        joining_date: "2018-01-10",
        emergency_contact: "Lisa Chen",
        emergency_phone: "+1234567998",
    },
    TeacherSeed {
        name: "Dr. Emily Rodriguez",
        employee_id: "T003",
        email: "emily.rodriguez@university.edu",
        department: "Information Technology",
        subjects: ["Web Development", "Mobile App Development", "UI/UX Design"],
        phone: "+1234567902",
        address: "789 Education Blvd, University City",
        date_of_birth: "1988-11-08",
        gender: "Female",
        qualification: "Ph.D. in Information Technology",
        experience: "6 years",
        joining_date: "2021-09-01",
        emergency_contact: "Carlos Rodriguez",
        emergency_phone: "+1234567997",
    },
    TeacherSeed {
        name: "Prof. David Wilson",
        employee_id: "T004",
        email: "david.wilson@university.edu",
        department: "Electronics",
        subjects: ["Digital Electronics", "Microprocessors", "Circuit Design"],
        phone: "+1234567903",
        address: "321 Campus Drive, University City",
        date_of_birth: "1975-05-30",
        gender: "Male",
        qualification: "M.Tech in Electronics",
        experience: "15 years",
        joining_date: "2015-07-20",
        emergency_contact: "Mary Wilson",
        emergency_phone: "+1234567996",
    },
    TeacherSeed {
        name: "Dr. Lisa Anderson",
        employee_id: "T005",
        email: "lisa.anderson@university.edu",
        department: "Mechanical",
        subjects: ["Thermodynamics", "Fluid Mechanics", "Machine Design"],
        phone: "+1234567904",
        address: "654 Scholar Street, University City",
        date_of_birth: "1982-09-12",
        gender: "Female",
        qualification: "Ph.D. in Mechanical Engineering",
        experience: "10 years",
        joining_date: "2019-03-15",
        emergency_contact: "Robert Anderson",
        emergency_phone: "+1234567995",
    },
];

const TEACHER_DEMO_PASSWORD: &str = "teacher123";

pub fn teachers() -> Vec<TeacherRow> {
    TEACHERS
        .iter()
        .zip(1..)
        .map(|(seed, id)| TeacherRow {
            password: TEACHER_DEMO_PASSWORD.to_string(),
            teacher: Teacher {
                id,
                name: seed.name.to_string(),
                employee_id: seed.employee_id.to_string(),
                email: seed.email.to_string(),
                department: seed.department.to_string(),
                subjects: seed.subjects.iter().map(|s| s.to_string()).collect(),
                phone: Some(seed.phone.to_string()),
                address: Some(seed.address.to_string()),
                date_of_birth: Some(seed.date_of_birth.to_string()),
                gender: Some(seed.gender.to_string()),
                qualification: Some(seed.qualification.to_string()),
                experience: Some(seed.experience.to_string()),
                joining_date: Some(seed.joining_date.to_string()),
                emergency_contact: Some(seed.emergency_contact.to_string()),
                emergency_phone: Some(seed.emergency_phone.to_string()),
                created_at: stamp(SEEDED_AT),
                is_active: true,
            },
        })
        .collect()
}
