use crate::entities::{AddedComment, AddedReply, AddedThread, DetailComment, DetailReply, DetailThread};
use crate::routes::{ContentPayload, ThreadPayload};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::add_thread,
        crate::routes::get_detail_thread,
        crate::routes::add_comment,
        crate::routes::delete_comment,
        crate::routes::add_reply,
        crate::routes::delete_reply,
        crate::routes::toggle_comment_like,
    ),
    components(schemas(
        ThreadPayload, ContentPayload,
        AddedThread, AddedComment, AddedReply,
        DetailThread, DetailComment, DetailReply
    )),
    tags(
        (name = "threads", description = "Thread operations"),
        (name = "comments", description = "Comment and like operations"),
        (name = "replies", description = "Reply operations"),
    )
)]
pub struct ApiDoc;
