use crate::error::ServiceError;
use crate::service::{
    CreateTaskRequest, Empty, IdResponse, IdsResponse, ListTasksQuery, TaskResponse,
    TasksResponse, TodoService,
};
use crate::types::TaskUpdate;
use super::extract::{ApiJson, ApiQuery};
use axum::{
    Json,
    extract::{Path, State},
};

pub async fn list(
    State(service): State<TodoService>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> Result<Json<TasksResponse>, ServiceError> {
    service.list_tasks(&query).map(Json)
}

pub async fn create(
    State(service): State<TodoService>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> Result<Json<IdResponse>, ServiceError> {
    service.create_task(request).map(Json)
}

pub async fn get(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<Json<TaskResponse>, ServiceError> {
    service.get_task(&id).map(Json)
}

pub async fn update(
    State(service): State<TodoService>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<TaskUpdate>,
) -> Result<Json<Empty>, ServiceError> {
    service.update_task(&id, &update).map(Json)
}

pub async fn delete(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<Json<IdsResponse>, ServiceError> {
    service.delete_task(&id).map(Json)
}

pub async fn complete(
    State(service): State<TodoService>,
    Path(id): Path<String>,
) -> Result<Json<IdsResponse>, ServiceError> {
    service.complete_task(&id).map(Json)
}
