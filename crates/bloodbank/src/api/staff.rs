use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use serde_json::json;

use super::response::{blocking, body, path_params, success};
use crate::services::{
    NewRole, NewStaff, NewTask, RoleChange, ServiceError, StaffService, TaskAssignment,
};

type Staff = State<Arc<StaffService>>;

pub(crate) fn router(service: Arc<StaffService>) -> Router {
    Router::new()
        .route("/api/roles", get(list_roles).post(create_role))
        .route("/api/staff", get(list_staff).post(create_staff))
        .route("/api/staff/:staff_id", put(change_role).delete(deactivate_staff))
        .route(
            "/api/staff/:staff_id/tasks",
            get(staff_tasks).post(assign_task),
        )
        .route("/api/staff/:staff_id/tasks/:task_id", delete(remove_task))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .with_state(service)
}

async fn list_roles(State(staff): Staff) -> Result<Response, ServiceError> {
    let roles = blocking(staff, |staff| staff.list_roles()).await?;
    Ok(success(StatusCode::OK, "Roles retrieved", json!({ "roles": roles })))
}

async fn create_role(
    State(staff): Staff,
    payload: Result<Json<NewRole>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let role = body(payload)?;
    let role = blocking(staff, move |staff| staff.create_role(role)).await?;
    Ok(success(StatusCode::CREATED, "Role created", json!({ "role": role })))
}

async fn list_staff(State(staff): Staff) -> Result<Response, ServiceError> {
    let members = blocking(staff, |staff| staff.list_staff()).await?;
    Ok(success(StatusCode::OK, "Active staff retrieved", json!({ "staff": members })))
}

async fn create_staff(
    State(staff): Staff,
    payload: Result<Json<NewStaff>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let hire = body(payload)?;
    let member = blocking(staff, move |staff| staff.create_staff(hire)).await?;
    Ok(success(
        StatusCode::CREATED,
        "Staff member added",
        json!({ "staff_id": member.staff_id, "staff": member }),
    ))
}

async fn change_role(
    State(staff): Staff,
    staff_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RoleChange>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let staff_id = path_params(staff_id)?;
    let change = body(payload)?;
    let member = blocking(staff, move |staff| staff.update_role(staff_id, change)).await?;
    Ok(success(StatusCode::OK, "Staff role updated", json!({ "staff": member })))
}

async fn deactivate_staff(
    State(staff): Staff,
    staff_id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ServiceError> {
    let staff_id = path_params(staff_id)?;
    blocking(staff, move |staff| staff.deactivate(staff_id)).await?;
    Ok(success(
        StatusCode::OK,
        "Staff member deactivated",
        json!({ "staff_id": staff_id }),
    ))
}

async fn list_tasks(State(staff): Staff) -> Result<Response, ServiceError> {
    let tasks = blocking(staff, |staff| staff.list_tasks()).await?;
    Ok(success(StatusCode::OK, "Tasks retrieved", json!({ "tasks": tasks })))
}

async fn create_task(
    State(staff): Staff,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let task = body(payload)?;
    let task = blocking(staff, move |staff| staff.create_task(task)).await?;
    Ok(success(StatusCode::CREATED, "Task created", json!({ "task": task })))
}

async fn staff_tasks(
    State(staff): Staff,
    staff_id: Result<Path<i64>, PathRejection>,
) -> Result<Response, ServiceError> {
    let staff_id = path_params(staff_id)?;
    let tasks = blocking(staff, move |staff| staff.staff_tasks(staff_id)).await?;
    Ok(success(
        StatusCode::OK,
        "Assigned tasks retrieved",
        json!({ "staff_id": staff_id, "tasks": tasks }),
    ))
}

async fn assign_task(
    State(staff): Staff,
    staff_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TaskAssignment>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let staff_id = path_params(staff_id)?;
    let assignment = body(payload)?;
    let task_id = assignment.task_id;
    blocking(staff, move |staff| staff.assign_task(staff_id, assignment)).await?;
    Ok(success(
        StatusCode::CREATED,
        "Task assigned",
        json!({ "staff_id": staff_id, "task_id": task_id }),
    ))
}

async fn remove_task(
    State(staff): Staff,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Response, ServiceError> {
    let (staff_id, task_id) = path_params(ids)?;
    blocking(staff, move |staff| staff.remove_task(staff_id, task_id)).await?;
    Ok(success(
        StatusCode::OK,
        "Task unassigned",
        json!({ "staff_id": staff_id, "task_id": task_id }),
    ))
}
