use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::auth::{Auth, CredentialVerifier};
use crate::entities::{AddedComment, AddedReply, AddedThread, DetailThread, NewComment, NewReply, NewThread};
use crate::error::ForumError;
use crate::repo::Repo;
use crate::usecases::ForumService;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(|err, _req| ForumError::BadRequest(format!("payload tidak valid: {err}")).into()),
    )
    .service(web::resource("/threads").route(web::post().to(add_thread)))
    .service(web::resource("/threads/{thread_id}").route(web::get().to(get_detail_thread)))
    .service(web::resource("/threads/{thread_id}/comments").route(web::post().to(add_comment)))
    .service(web::resource("/threads/{thread_id}/comments/{comment_id}").route(web::delete().to(delete_comment)))
    .service(web::resource("/threads/{thread_id}/comments/{comment_id}/replies").route(web::post().to(add_reply)))
    .service(
        web::resource("/threads/{thread_id}/comments/{comment_id}/replies/{reply_id}").route(web::delete().to(delete_reply)),
    )
    .service(web::resource("/threads/{thread_id}/comments/{comment_id}/likes").route(web::put().to(toggle_comment_like)));
}

#[derive(Clone)]
pub struct AppState {
    pub service: ForumService,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repo>, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { service: ForumService::new(repo), verifier }
    }
}

/// Request body of `POST /threads` (documentation only; bodies are checked by the entities).
#[derive(Deserialize, ToSchema)]
pub struct ThreadPayload {
    pub title: String,
    pub body: String,
}

/// Request body for comments and replies.
#[derive(Deserialize, ToSchema)]
pub struct ContentPayload {
    pub content: String,
}

fn success() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "success" }))
}

#[utoipa::path(
    post,
    path = "/threads",
    request_body = ThreadPayload,
    responses(
        (status = 201, description = "Thread created, wrapped as {status, data: {addedThread}}", body = AddedThread),
        (status = 400, description = "Missing or mistyped field"),
        (status = 401, description = "Missing authentication")
    )
)]
pub async fn add_thread(auth: Auth, data: web::Data<AppState>, payload: web::Json<Value>) -> Result<HttpResponse, ForumError> {
    let new = NewThread::from_json(&json!({
        "title": payload.get("title"),
        "body": payload.get("body"),
        "owner": auth.owner(),
    }))?;
    let added = data.service.add_thread(new).await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": { "addedThread": added } })))
}

#[utoipa::path(
    get,
    path = "/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread id")),
    responses(
        (status = 200, description = "Thread with comments and replies, wrapped as {status, data: {thread}}", body = DetailThread),
        (status = 404, description = "Thread not found")
    )
)]
pub async fn get_detail_thread(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ForumError> {
    let thread = data.service.get_detail_thread(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "success", "data": { "thread": thread } })))
}

#[utoipa::path(
    post,
    path = "/threads/{thread_id}/comments",
    params(("thread_id" = String, Path, description = "Thread id")),
    request_body = ContentPayload,
    responses(
        (status = 201, description = "Comment created, wrapped as {status, data: {addedComment}}", body = AddedComment),
        (status = 400, description = "Missing or mistyped field"),
        (status = 401, description = "Missing authentication"),
        (status = 404, description = "Thread not found")
    )
)]
pub async fn add_comment(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, ForumError> {
    let new = NewComment::from_json(&json!({
        "content": payload.get("content"),
        "threadId": path.into_inner(),
        "owner": auth.owner(),
    }))?;
    let added = data.service.add_comment(new).await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": { "addedComment": added } })))
}

#[utoipa::path(
    delete,
    path = "/threads/{thread_id}/comments/{comment_id}",
    params(
        ("thread_id" = String, Path, description = "Thread id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment soft-deleted"),
        (status = 401, description = "Missing authentication"),
        (status = 403, description = "Caller does not own the comment"),
        (status = 404, description = "Thread or comment not found")
    )
)]
pub async fn delete_comment(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ForumError> {
    let (thread_id, comment_id) = path.into_inner();
    data.service.delete_comment(&thread_id, &comment_id, auth.owner()).await?;
    Ok(success())
}

#[utoipa::path(
    post,
    path = "/threads/{thread_id}/comments/{comment_id}/replies",
    params(
        ("thread_id" = String, Path, description = "Thread id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    request_body = ContentPayload,
    responses(
        (status = 201, description = "Reply created, wrapped as {status, data: {addedReply}}", body = AddedReply),
        (status = 400, description = "Missing or mistyped field"),
        (status = 401, description = "Missing authentication"),
        (status = 404, description = "Thread or comment not found")
    )
)]
pub async fn add_reply(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
    payload: web::Json<Value>,
) -> Result<HttpResponse, ForumError> {
    let (thread_id, comment_id) = path.into_inner();
    let new = NewReply::from_json(&json!({
        "content": payload.get("content"),
        "commentId": comment_id,
        "owner": auth.owner(),
    }))?;
    let added = data.service.add_reply(&thread_id, new).await?;
    Ok(HttpResponse::Created().json(json!({ "status": "success", "data": { "addedReply": added } })))
}

#[utoipa::path(
    delete,
    path = "/threads/{thread_id}/comments/{comment_id}/replies/{reply_id}",
    params(
        ("thread_id" = String, Path, description = "Thread id"),
        ("comment_id" = String, Path, description = "Comment id"),
        ("reply_id" = String, Path, description = "Reply id")
    ),
    responses(
        (status = 200, description = "Reply soft-deleted"),
        (status = 401, description = "Missing authentication"),
        (status = 403, description = "Caller does not own the reply"),
        (status = 404, description = "Thread, comment or reply not found")
    )
)]
pub async fn delete_reply(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> Result<HttpResponse, ForumError> {
    let (thread_id, comment_id, reply_id) = path.into_inner();
    data.service.delete_reply(&thread_id, &comment_id, &reply_id, auth.owner()).await?;
    Ok(success())
}

#[utoipa::path(
    put,
    path = "/threads/{thread_id}/comments/{comment_id}/likes",
    params(
        ("thread_id" = String, Path, description = "Thread id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Like toggled"),
        (status = 401, description = "Missing authentication"),
        (status = 404, description = "Thread or comment not found")
    )
)]
pub async fn toggle_comment_like(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ForumError> {
    let (thread_id, comment_id) = path.into_inner();
    data.service.toggle_comment_like(&thread_id, &comment_id, auth.owner()).await?;
    Ok(success())
}
