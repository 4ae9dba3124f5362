use crate::error::ServiceError;
use crate::service::{
    CreateScheduledTaskRequest, Empty, IdResponse, ListQuery, ScheduledTaskResponse,
    ScheduledTasksResponse, TodoService,
};
use crate::types::ScheduledTaskUpdate;
use super::extract::{ApiJson, ApiQuery};
use axum::{
    Json,
    extract::{Path, State},
};

pub async fn list(
    State(service): State<TodoService>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ScheduledTasksResponse>, ServiceError> {
    service.list_scheduled_tasks(&query).map(Json)
}

pub async fn create(
    State(service): State<TodoService>,
    ApiJson(request): ApiJson<CreateScheduledTaskRequest>,
) -> Result<Json<IdResponse>, ServiceError> {
    service.create_scheduled_task(request).map(Json)
}

pub async fn get(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<Json<ScheduledTaskResponse>, ServiceError> {
    service.get_scheduled_task(&id).map(Json)
}

pub async fn update(
    State(service): State<TodoService>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ScheduledTaskUpdate>,
) -> Result<Json<Empty>, ServiceError> {
    service.update_scheduled_task(&id, &update).map(Json)
}

pub async fn delete(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<Json<IdResponse>, ServiceError> {
    service.delete_scheduled_task(&id).map(Json)
}
