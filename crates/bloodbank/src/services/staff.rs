use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use tracing::info;

use super::{required_id, required_text, ServiceError};
use crate::domain::{Role, StaffMember, Task};
use crate::persistence::{Database, GatewayError, Statement};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRole {
    #[serde(default, alias = "roleName")]
    pub role_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStaff {
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default, alias = "employeeNumber")]
    pub employee_number: Option<String>,
    #[serde(default, alias = "roleId")]
    pub role_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleChange {
    #[serde(default, alias = "roleId")]
    pub role_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    #[serde(default, alias = "taskName")]
    pub task_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskAssignment {
    #[serde(default, alias = "taskId")]
    pub task_id: Option<i64>,
}

const STAFF_COLUMNS: &str = "SELECT s.staff_id, s.first_name, s.last_name, s.employee_number, \
     s.role_id, r.role_name, s.is_active FROM staff s JOIN roles r ON s.role_id = r.role_id";

/// Staff roster, roles, and task assignments.
#[derive(Clone)]
pub struct StaffService {
    database: Arc<Database>,
}

impl StaffService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    pub fn list_roles(&self) -> Result<Vec<Role>, ServiceError> {
        let roles = self.database.read(|conn| {
            let mut stmt =
                conn.prepare("SELECT role_id, role_name FROM roles ORDER BY role_name")?;
            let rows = stmt.query_map([], |row| {
                Ok(Role {
                    role_id: row.get(0)?,
                    role_name: row.get(1)?,
                })
            })?;
            rows.collect()
        })?;
        Ok(roles)
    }

    pub fn create_role(&self, input: NewRole) -> Result<Role, ServiceError> {
        let role_name = required_text("role_name", input.role_name.as_deref())?;

        let report = self
            .database
            .execute(&[Statement::new("INSERT INTO roles (role_name) VALUES (?1)")
                .bind(role_name.clone())])
            .map_err(|err| duplicate_as_conflict(err, || format!("role '{role_name}' exists")))?;

        info!(role_id = report.last_insert_rowid, %role_name, "role created");
        Ok(Role {
            role_id: report.last_insert_rowid,
            role_name,
        })
    }

    /// Active staff ordered by surname.
    pub fn list_staff(&self) -> Result<Vec<StaffMember>, ServiceError> {
        let sql = format!("{STAFF_COLUMNS} WHERE s.is_active = 1 ORDER BY s.last_name, s.first_name");
        let staff = self.database.read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], staff_from_row)?;
            rows.collect()
        })?;
        Ok(staff)
    }

    pub fn get_staff(&self, staff_id: i64) -> Result<StaffMember, ServiceError> {
        let sql = format!("{STAFF_COLUMNS} WHERE s.staff_id = ?1");
        self.database
            .read(|conn| {
                conn.query_row(&sql, params![staff_id], staff_from_row)
                    .optional()
            })?
            .ok_or_else(|| ServiceError::not_found("staff", staff_id))
    }

    pub fn create_staff(&self, input: NewStaff) -> Result<StaffMember, ServiceError> {
        let first_name = required_text("first_name", input.first_name.as_deref())?;
        let last_name = required_text("last_name", input.last_name.as_deref())?;
        let employee_number = required_text("employee_number", input.employee_number.as_deref())?;
        let role_id = required_id("role_id", input.role_id)?;

        self.ensure_role(role_id)?;

        let report = self
            .database
            .execute(&[Statement::new(
                "INSERT INTO staff (first_name, last_name, employee_number, role_id) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(first_name)
            .bind(last_name)
            .bind(employee_number.clone())
            .bind(role_id)])
            .map_err(|err| {
                duplicate_as_conflict(err, || {
                    format!("employee number '{employee_number}' is already in use")
                })
            })?;

        info!(staff_id = report.last_insert_rowid, %employee_number, role_id, "staff member added");
        self.get_staff(report.last_insert_rowid)
    }

    pub fn update_role(&self, staff_id: i64, change: RoleChange) -> Result<StaffMember, ServiceError> {
        let role_id = required_id("role_id", change.role_id)?;
        self.ensure_role(role_id)?;

        self.database
            .execute(&[
                Statement::new("UPDATE staff SET role_id = ?1 WHERE staff_id = ?2")
                    .bind(role_id)
                    .bind(staff_id)
                    .expect_rows(1),
            ])
            .map_err(|err| missing_row_as_not_found(err, "staff", staff_id))?;

        info!(staff_id, role_id, "staff role updated");
        self.get_staff(staff_id)
    }

    /// Soft-delete: the row stays so historical screenings and donations keep their performer.
    pub fn deactivate(&self, staff_id: i64) -> Result<(), ServiceError> {
        self.database
            .execute(&[
                Statement::new("UPDATE staff SET is_active = 0 WHERE staff_id = ?1")
                    .bind(staff_id)
                    .expect_rows(1),
            ])
            .map_err(|err| missing_row_as_not_found(err, "staff", staff_id))?;

        info!(staff_id, "staff member deactivated");
        Ok(())
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        let tasks = self.database.read(|conn| {
            let mut stmt =
                conn.prepare("SELECT task_id, task_name FROM tasks ORDER BY task_name")?;
            let rows = stmt.query_map([], task_from_row)?;
            rows.collect()
        })?;
        Ok(tasks)
    }

    pub fn create_task(&self, input: NewTask) -> Result<Task, ServiceError> {
        let task_name = required_text("task_name", input.task_name.as_deref())?;

        let report = self
            .database
            .execute(&[Statement::new("INSERT INTO tasks (task_name) VALUES (?1)")
                .bind(task_name.clone())])
            .map_err(|err| duplicate_as_conflict(err, || format!("task '{task_name}' exists")))?;

        info!(task_id = report.last_insert_rowid, %task_name, "task created");
        Ok(Task {
            task_id: report.last_insert_rowid,
            task_name,
        })
    }

    pub fn assign_task(&self, staff_id: i64, assignment: TaskAssignment) -> Result<(), ServiceError> {
        let task_id = required_id("task_id", assignment.task_id)?;
        self.get_staff(staff_id)?;
        self.ensure_task(task_id)?;

        self.database
            .execute(&[
                Statement::new("INSERT INTO staff_tasks (staff_id, task_id) VALUES (?1, ?2)")
                    .bind(staff_id)
                    .bind(task_id),
            ])
            .map_err(|err| {
                duplicate_as_conflict(err, || {
                    format!("task {task_id} is already assigned to staff {staff_id}")
                })
            })?;

        info!(staff_id, task_id, "task assigned");
        Ok(())
    }

    pub fn staff_tasks(&self, staff_id: i64) -> Result<Vec<Task>, ServiceError> {
        self.get_staff(staff_id)?;
        let tasks = self.database.read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.task_id, t.task_name FROM tasks t \
                 JOIN staff_tasks st ON t.task_id = st.task_id \
                 WHERE st.staff_id = ?1 ORDER BY t.task_name",
            )?;
            let rows = stmt.query_map(params![staff_id], task_from_row)?;
            rows.collect()
        })?;
        Ok(tasks)
    }

    pub fn remove_task(&self, staff_id: i64, task_id: i64) -> Result<(), ServiceError> {
        self.database
            .execute(&[Statement::new(
                "DELETE FROM staff_tasks WHERE staff_id = ?1 AND task_id = ?2",
            )
            .bind(staff_id)
            .bind(task_id)
            .expect_rows(1)])
            .map_err(|err| {
                missing_row_as_not_found(err, "task assignment", format!("{staff_id}/{task_id}"))
            })?;

        info!(staff_id, task_id, "task unassigned");
        Ok(())
    }

    fn ensure_role(&self, role_id: i64) -> Result<(), ServiceError> {
        let found = self.database.read(|conn| {
            conn.query_row(
                "SELECT 1 FROM roles WHERE role_id = ?1",
                params![role_id],
                |_| Ok(()),
            )
            .optional()
        })?;
        found.ok_or_else(|| ServiceError::not_found("role", role_id))
    }

    fn ensure_task(&self, task_id: i64) -> Result<(), ServiceError> {
        let found = self.database.read(|conn| {
            conn.query_row(
                "SELECT 1 FROM tasks WHERE task_id = ?1",
                params![task_id],
                |_| Ok(()),
            )
            .optional()
        })?;
        found.ok_or_else(|| ServiceError::not_found("task", task_id))
    }
}

/// Staff member credited with a screening or collection.
///
/// An explicit id must name an active staff member. Without one, the configured default
/// phlebotomist is looked up by employee number; its absence is a configuration problem rather
/// than a client error.
pub(crate) fn resolve_performer(
    database: &Database,
    explicit: Option<i64>,
) -> Result<i64, ServiceError> {
    if let Some(staff_id) = explicit {
        let found = database.read(|conn| {
            conn.query_row(
                "SELECT staff_id FROM staff WHERE staff_id = ?1 AND is_active = 1",
                params![staff_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()
        })?;
        return found.ok_or_else(|| ServiceError::not_found("staff", staff_id));
    }

    let employee_number = &database.config().default_phlebotomist;
    let found = database.read(|conn| {
        conn.query_row(
            "SELECT staff_id FROM staff WHERE employee_number = ?1 AND is_active = 1",
            params![employee_number],
            |row| row.get::<_, i64>(0),
        )
        .optional()
    })?;

    found.ok_or_else(|| {
        ServiceError::Configuration(format!(
            "default phlebotomist '{employee_number}' is not on the active staff roster"
        ))
    })
}

pub(crate) fn duplicate_as_conflict(
    err: GatewayError,
    message: impl FnOnce() -> String,
) -> ServiceError {
    if err.is_duplicate_key() {
        ServiceError::Conflict(message())
    } else {
        err.into()
    }
}

pub(crate) fn missing_row_as_not_found(
    err: GatewayError,
    entity: &'static str,
    id: impl ToString,
) -> ServiceError {
    match err {
        GatewayError::RowCount { .. } => ServiceError::not_found(entity, id),
        other => other.into(),
    }
}

fn staff_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StaffMember> {
    Ok(StaffMember {
        staff_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        employee_number: row.get(3)?,
        role_id: row.get(4)?,
        role_name: row.get(5)?,
        is_active: row.get(6)?,
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        task_id: row.get(0)?,
        task_name: row.get(1)?,
    })
}
