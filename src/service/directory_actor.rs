use crate::db::models::{
    AttendanceRecord, AttendanceStats, DatabaseStats, Student, StudentId, Teacher, TeacherId,
    TeacherStats,
};
use crate::db::{StudentStore, TeacherStore};
use crate::error::CampusError;
use crate::types::portal::{
    MarkAttendanceRequest, StudentDashboard, StudentRegistration, StudentUpdate,
    TeacherDashboard, TeacherRegistration, TeacherUpdate,
};

use chrono::{Local, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::info;

/// Messages handled by the directory actor. The reply port is always last.
#[derive(Debug)]
pub enum DirectoryMessage {
    AuthenticateStudent(String, String, RpcReplyPort<Option<Student>>),
    RegisterStudent(
        StudentRegistration,
        RpcReplyPort<Result<Student, CampusError>>,
    ),
    ListStudents(RpcReplyPort<Vec<Student>>),
    GetStudent(StudentId, RpcReplyPort<Option<Student>>),
    GetStudentByRollNo(String, RpcReplyPort<Option<Student>>),
    SearchStudents(String, RpcReplyPort<Vec<Student>>),
    StudentsByClass(String, Option<String>, RpcReplyPort<Vec<Student>>),
    UpdateStudent(
        StudentId,
        StudentUpdate,
        RpcReplyPort<Result<Option<Student>, CampusError>>,
    ),
    MarkAttendance(
        StudentId,
        MarkAttendanceRequest,
        RpcReplyPort<Result<AttendanceRecord, CampusError>>,
    ),
    AttendanceOf(StudentId, RpcReplyPort<Vec<AttendanceRecord>>),
    StatsOf(StudentId, RpcReplyPort<Option<AttendanceStats>>),
    AllStats(RpcReplyPort<Vec<AttendanceStats>>),
    DatabaseStats(RpcReplyPort<DatabaseStats>),
    StudentDashboard(StudentId, RpcReplyPort<Option<StudentDashboard>>),

    AuthenticateTeacher(String, String, RpcReplyPort<Option<Teacher>>),
    RegisterTeacher(
        TeacherRegistration,
        RpcReplyPort<Result<Teacher, CampusError>>,
    ),
    ListTeachers(RpcReplyPort<Vec<Teacher>>),
    GetTeacher(TeacherId, RpcReplyPort<Option<Teacher>>),
    GetTeacherByEmployeeId(String, RpcReplyPort<Option<Teacher>>),
    TeachersByDepartment(String, RpcReplyPort<Vec<Teacher>>),
    TeachersBySubject(String, RpcReplyPort<Vec<Teacher>>),
    SearchTeachers(String, RpcReplyPort<Vec<Teacher>>),
    UpdateTeacher(
        TeacherId,
        TeacherUpdate,
        RpcReplyPort<Result<Option<Teacher>, CampusError>>,
    ),
    TeacherStats(RpcReplyPort<TeacherStats>),
    VerifyTeacher(String, String, RpcReplyPort<bool>),
    Departments(RpcReplyPort<Vec<String>>),
    Subjects(RpcReplyPort<Vec<String>>),
    TeacherDashboard(TeacherId, RpcReplyPort<Option<TeacherDashboard>>),
}

/// Cloneable handle to the directory actor.
#[derive(Clone)]
pub struct DirectoryHandle {
    actor: ActorRef<DirectoryMessage>,
}

/// `ractor::call!` with the failure mapped into `CampusError`.
macro_rules! rpc {
    ($actor:expr, $variant:ident $(, $arg:expr)*) => {
        ractor::call!($actor, DirectoryMessage::$variant $(, $arg)*).map_err(|e| {
            CampusError::RactorError(format!("{} RPC failed: {e}", stringify!($variant)))
        })
    };
}

impl DirectoryHandle {
    pub async fn authenticate_student(
        &self,
        identifier: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Option<Student>, CampusError> {
        rpc!(
            self.actor,
            AuthenticateStudent,
            identifier.into(),
            password.into()
        )
    }

    pub async fn register_student(
        &self,
        registration: StudentRegistration,
    ) -> Result<Student, CampusError> {
        rpc!(self.actor, RegisterStudent, registration)?
    }

    pub async fn list_students(&self) -> Result<Vec<Student>, CampusError> {
        rpc!(self.actor, ListStudents)
    }

    pub async fn student(&self, id: StudentId) -> Result<Option<Student>, CampusError> {
        rpc!(self.actor, GetStudent, id)
    }

    pub async fn student_by_roll_no(
        &self,
        roll_no: impl Into<String>,
    ) -> Result<Option<Student>, CampusError> {
        rpc!(self.actor, GetStudentByRollNo, roll_no.into())
    }

    pub async fn search_students(
        &self,
        query: impl Into<String>,
    ) -> Result<Vec<Student>, CampusError> {
        rpc!(self.actor, SearchStudents, query.into())
    }

    pub async fn students_by_class(
        &self,
        class: impl Into<String>,
        year: Option<String>,
    ) -> Result<Vec<Student>, CampusError> {
        rpc!(self.actor, StudentsByClass, class.into(), year)
    }

    pub async fn update_student(
        &self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<Option<Student>, CampusError> {
        rpc!(self.actor, UpdateStudent, id, update)?
    }

    pub async fn mark_attendance(
        &self,
        student_id: StudentId,
        request: MarkAttendanceRequest,
    ) -> Result<AttendanceRecord, CampusError> {
        rpc!(self.actor, MarkAttendance, student_id, request)?
    }

    pub async fn attendance_of(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<AttendanceRecord>, CampusError> {
        rpc!(self.actor, AttendanceOf, student_id)
    }

    pub async fn stats_of(
        &self,
        student_id: StudentId,
    ) -> Result<Option<AttendanceStats>, CampusError> {
        rpc!(self.actor, StatsOf, student_id)
    }

    pub async fn all_stats(&self) -> Result<Vec<AttendanceStats>, CampusError> {
        rpc!(self.actor, AllStats)
    }

    pub async fn database_stats(&self) -> Result<DatabaseStats, CampusError> {
        rpc!(self.actor, DatabaseStats)
    }

    pub async fn student_dashboard(
        &self,
        student_id: StudentId,
    ) -> Result<Option<StudentDashboard>, CampusError> {
        rpc!(self.actor, StudentDashboard, student_id)
    }

    pub async fn authenticate_teacher(
        &self,
        identifier: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Option<Teacher>, CampusError> {
        rpc!(
            self.actor,
            AuthenticateTeacher,
            identifier.into(),
            password.into()
        )
    }

    pub async fn register_teacher(
        &self,
        registration: TeacherRegistration,
    ) -> Result<Teacher, CampusError> {
        rpc!(self.actor, RegisterTeacher, registration)?
    }

    pub async fn list_teachers(&self) -> Result<Vec<Teacher>, CampusError> {
        rpc!(self.actor, ListTeachers)
    }

    pub async fn teacher(&self, id: TeacherId) -> Result<Option<Teacher>, CampusError> {
        rpc!(self.actor, GetTeacher, id)
    }

    pub async fn teacher_by_employee_id(
        &self,
        employee_id: impl Into<String>,
    ) -> Result<Option<Teacher>, CampusError> {
        rpc!(self.actor, GetTeacherByEmployeeId, employee_id.into())
    }

    pub async fn teachers_by_department(
        &self,
        department: impl Into<String>,
    ) -> Result<Vec<Teacher>, CampusError> {
        rpc!(self.actor, TeachersByDepartment, department.into())
    }

    pub async fn teachers_by_subject(
        &self,
        subject: impl Into<String>,
    ) -> Result<Vec<Teacher>, CampusError> {
        rpc!(self.actor, TeachersBySubject, subject.into())
    }

    pub async fn search_teachers(
        &self,
        query: impl Into<String>,
    ) -> Result<Vec<Teacher>, CampusError> {
        rpc!(self.actor, SearchTeachers, query.into())
    }

    pub async fn update_teacher(
        &self,
        id: TeacherId,
        update: TeacherUpdate,
    ) -> Result<Option<Teacher>, CampusError> {
        rpc!(self.actor, UpdateTeacher, id, update)?
    }

    pub async fn teacher_stats(&self) -> Result<TeacherStats, CampusError> {
        rpc!(self.actor, TeacherStats)
    }

    pub async fn verify_teacher(
        &self,
        employee_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<bool, CampusError> {
        rpc!(self.actor, VerifyTeacher, employee_id.into(), email.into())
    }

    pub async fn departments(&self) -> Result<Vec<String>, CampusError> {
        rpc!(self.actor, Departments)
    }

    pub async fn subjects(&self) -> Result<Vec<String>, CampusError> {
        rpc!(self.actor, Subjects)
    }

    pub async fn teacher_dashboard(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Option<TeacherDashboard>, CampusError> {
        rpc!(self.actor, TeacherDashboard, teacher_id)
    }
}

struct DirectoryState {
    students: StudentStore,
    teachers: TeacherStore,
}

/// Sole owner of the student and teacher stores; messages are handled one at a time.
struct DirectoryActor;

#[ractor::async_trait]
impl Actor for DirectoryActor {
    type Msg = DirectoryMessage;
    type State = DirectoryState;
    type Arguments = (StudentStore, TeacherStore);

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        (students, teachers): Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!("DirectoryActor started");
        Ok(DirectoryState { students, teachers })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let DirectoryState { students, teachers } = state;
        match message {
            DirectoryMessage::AuthenticateStudent(identifier, password, rp) => {
                let _ = rp.send(students.authenticate(&identifier, &password));
            }
            DirectoryMessage::RegisterStudent(registration, rp) => {
                let _ = rp.send(students.register(registration, Utc::now()));
            }
            DirectoryMessage::ListStudents(rp) => {
                let _ = rp.send(students.list_active());
            }
            DirectoryMessage::GetStudent(id, rp) => {
                let _ = rp.send(students.get(id));
            }
            DirectoryMessage::GetStudentByRollNo(roll_no, rp) => {
                let _ = rp.send(students.get_by_roll_no(&roll_no));
            }
            DirectoryMessage::SearchStudents(query, rp) => {
                let _ = rp.send(students.search(&query));
            }
            DirectoryMessage::StudentsByClass(class, year, rp) => {
                let _ = rp.send(students.by_class(&class, year.as_deref()));
            }
            DirectoryMessage::UpdateStudent(id, update, rp) => {
                let _ = rp.send(students.update(id, update));
            }
            DirectoryMessage::MarkAttendance(student_id, request, rp) => {
                let _ = rp.send(students.mark_attendance(student_id, request, Local::now()));
            }
            DirectoryMessage::AttendanceOf(student_id, rp) => {
                let _ = rp.send(students.attendance_of(student_id));
            }
            DirectoryMessage::StatsOf(student_id, rp) => {
                let _ = rp.send(students.stats_of(student_id));
            }
            DirectoryMessage::AllStats(rp) => {
                let _ = rp.send(students.all_stats());
            }
            DirectoryMessage::DatabaseStats(rp) => {
                let _ = rp.send(students.database_stats());
            }
            DirectoryMessage::StudentDashboard(student_id, rp) => {
                let dashboard = students.get(student_id).and_then(|student| {
                    Some(StudentDashboard {
                        records: students.attendance_of(student_id),
                        stats: students.stats_of(student_id)?,
                        student,
                    })
                });
                let _ = rp.send(dashboard);
            }

            DirectoryMessage::AuthenticateTeacher(identifier, password, rp) => {
                let _ = rp.send(teachers.authenticate(&identifier, &password));
            }
            DirectoryMessage::RegisterTeacher(registration, rp) => {
                let _ = rp.send(teachers.register(registration, Utc::now()));
            }
            DirectoryMessage::ListTeachers(rp) => {
                let _ = rp.send(teachers.list_active());
            }
            DirectoryMessage::GetTeacher(id, rp) => {
                let _ = rp.send(teachers.get(id));
            }
            DirectoryMessage::GetTeacherByEmployeeId(employee_id, rp) => {
                let _ = rp.send(teachers.get_by_employee_id(&employee_id));
            }
            DirectoryMessage::TeachersByDepartment(department, rp) => {
                let _ = rp.send(teachers.by_department(&department));
            }
            DirectoryMessage::TeachersBySubject(subject, rp) => {
                let _ = rp.send(teachers.by_subject(&subject));
            }
            DirectoryMessage::SearchTeachers(query, rp) => {
                let _ = rp.send(teachers.search(&query));
            }
            DirectoryMessage::UpdateTeacher(id, update, rp) => {
                let _ = rp.send(teachers.update(id, update));
            }
            DirectoryMessage::TeacherStats(rp) => {
                let _ = rp.send(teachers.stats());
            }
            DirectoryMessage::VerifyTeacher(employee_id, email, rp) => {
                let _ = rp.send(teachers.verify(&employee_id, &email));
            }
            DirectoryMessage::Departments(rp) => {
                let _ = rp.send(teachers.departments());
            }
            DirectoryMessage::Subjects(rp) => {
                let _ = rp.send(teachers.subjects());
            }
            DirectoryMessage::TeacherDashboard(teacher_id, rp) => {
                let dashboard = teachers.get(teacher_id).map(|teacher| TeacherDashboard {
                    teacher,
                    attendance: students.all_stats(),
                    database: students.database_stats(),
                });
                let _ = rp.send(dashboard);
            }
        }
        Ok(())
    }
}

/// Spawn the directory actor over the given stores.
pub async fn spawn(
    students: StudentStore,
    teachers: TeacherStore,
) -> Result<DirectoryHandle, CampusError> {
    let (actor, _jh) = Actor::spawn(None, DirectoryActor, (students, teachers))
        .await
        .map_err(|e| CampusError::RactorError(format!("failed to spawn DirectoryActor: {e}")))?;
    Ok(DirectoryHandle { actor })
}

/// Spawn over the demo data set.
pub async fn spawn_seeded() -> Result<DirectoryHandle, CampusError> {
    spawn(StudentStore::seeded(), TeacherStore::seeded()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registration_is_visible_to_later_queries() {
        let handle = spawn_seeded().await.unwrap();
        let registration = StudentRegistration {
            name: "Kim Park".to_string(),
            roll_no: "cs100".to_string(),
            email: "kim.park@university.edu".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            class: "Computer Science".to_string(),
            year: "1st Year".to_string(),
            phone: None,
            address: None,
            date_of_birth: None,
            gender: None,
            guardian_name: None,
            guardian_phone: None,
        };
        let student = handle.register_student(registration.clone()).await.unwrap();
        assert_eq!(student.id, 11);
        assert!(matches!(
            handle.register_student(registration).await,
            Err(CampusError::DuplicateStudent)
        ));
        let found = handle.student_by_roll_no("CS100").await.unwrap().unwrap();
        assert_eq!(found.id, 11);
        assert!(
            handle
                .authenticate_student("kim.park@university.edu", "secret1")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn dashboards_combine_store_queries() {
        let handle = spawn_seeded().await.unwrap();
        let dashboard = handle.student_dashboard(1).await.unwrap().unwrap();
        assert_eq!(dashboard.student.roll_no, "CS001");
        assert_eq!(dashboard.records.len(), 5);
        assert_eq!(dashboard.stats.attendance_percentage, 80);
        assert!(handle.student_dashboard(99).await.unwrap().is_none());

        let teacher = handle.teacher_dashboard(2).await.unwrap().unwrap();
        assert_eq!(teacher.teacher.employee_id, "T002");
        assert_eq!(teacher.attendance.len(), 10);
        assert_eq!(teacher.database.total_attendance_records, 10);
    }

    #[tokio::test]
    async fn mark_attendance_through_handle() {
        let handle = spawn_seeded().await.unwrap();
        let first = handle
            .mark_attendance(3, MarkAttendanceRequest::default())
            .await
            .unwrap();
        let again = handle
            .mark_attendance(3, MarkAttendanceRequest::default())
            .await
            .unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(handle.attendance_of(3).await.unwrap().len(), 1);
        assert!(matches!(
            handle
                .mark_attendance(42, MarkAttendanceRequest::default())
                .await,
            Err(CampusError::StudentNotFound)
        ));
    }
}
