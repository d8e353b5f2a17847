#![cfg(feature = "inmem-store")]

use std::sync::Arc;

use forum_api::{
    entities::{NewComment, NewReply, NewThread},
    ids::SequentialIdGenerator,
    models::Resource,
    repo::{inmem::InMemRepo, RepoError},
};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use forum_api::repo::{CommentLikeRepo, CommentRepo, ReplyRepo, ThreadRepo};

/// Fresh repository with predictable ids.
fn repo() -> InMemRepo {
    let r = InMemRepo::with_id_generator(Arc::new(SequentialIdGenerator::new()));
    r.register_user("user-123", "dicoding").unwrap();
    r.register_user("user-456", "johndoe").unwrap();
    r
}

async fn seed_thread(r: &InMemRepo) -> String {
    r.add_thread(NewThread::new("Judul Thread", "Body thread.", "user-123").unwrap())
        .await
        .unwrap()
        .id
}

async fn seed_comment(r: &InMemRepo, thread_id: &str, owner: &str, content: &str) -> String {
    r.add_comment(NewComment::new(content, thread_id, owner).unwrap()).await.unwrap().id
}

#[tokio::test]
async fn thread_add_and_read_back() {
    let r = repo();

    let added = r
        .add_thread(NewThread::new("Judul Thread", "Body thread.", "user-123").unwrap())
        .await
        .unwrap();
    assert_eq!(added.id, "thread-1");
    assert_eq!(added.title, "Judul Thread");
    assert_eq!(added.owner, "user-123");

    r.check_thread_availability("thread-1").await.unwrap();
    let t = r.get_thread_by_id("thread-1").await.unwrap();
    assert_eq!(t.body, "Body thread.");
    assert_eq!(t.username, "dicoding");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let r = repo();
    assert!(matches!(r.check_thread_availability("thread-x").await, Err(RepoError::NotFound(Resource::Thread))));
    assert!(matches!(r.get_thread_by_id("thread-x").await, Err(RepoError::NotFound(Resource::Thread))));
    assert!(matches!(r.check_comment_availability("comment-x").await, Err(RepoError::NotFound(Resource::Comment))));
    assert!(matches!(r.check_reply_availability("reply-x").await, Err(RepoError::NotFound(Resource::Reply))));
    assert!(matches!(r.delete_comment("comment-x").await, Err(RepoError::NotFound(Resource::Comment))));
}

#[tokio::test]
async fn comment_requires_existing_thread() {
    let r = repo();
    let err = r
        .add_comment(NewComment::new("Komentar", "thread-x", "user-123").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(Resource::Thread)));
}

#[tokio::test]
async fn comments_come_back_oldest_first_with_usernames() {
    let r = repo();
    let thread_id = seed_thread(&r).await;
    let first = seed_comment(&r, &thread_id, "user-123", "pertama").await;
    let second = seed_comment(&r, &thread_id, "user-456", "kedua").await;
    let third = seed_comment(&r, &thread_id, "user-789", "ketiga").await;

    let comments = r.get_comments_by_thread_id(&thread_id).await.unwrap();
    let ids: Vec<_> = comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec![first.as_str(), second.as_str(), third.as_str()]);
    assert_eq!(comments[0].username, "dicoding");
    assert_eq!(comments[1].username, "johndoe");
    // unregistered owners fall back to their id
    assert_eq!(comments[2].username, "user-789");
    assert!(comments.iter().all(|c| !c.is_delete));
}

#[tokio::test]
async fn comment_access_and_soft_delete() {
    let r = repo();
    let thread_id = seed_thread(&r).await;
    let comment_id = seed_comment(&r, &thread_id, "user-123", "Komentar").await;

    r.verify_comment_access(&comment_id, "user-123").await.unwrap();
    assert!(matches!(
        r.verify_comment_access(&comment_id, "user-456").await,
        Err(RepoError::Forbidden(Resource::Comment))
    ));

    r.delete_comment(&comment_id).await.unwrap();
    // repeating the delete is a no-op
    r.delete_comment(&comment_id).await.unwrap();

    // still available, content preserved, flag set
    r.check_comment_availability(&comment_id).await.unwrap();
    let comments = r.get_comments_by_thread_id(&thread_id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].is_delete);
    assert_eq!(comments[0].content, "Komentar");
}

#[tokio::test]
async fn replies_follow_comment_lifecycle() {
    let r = repo();
    let thread_id = seed_thread(&r).await;
    let comment_id = seed_comment(&r, &thread_id, "user-123", "Komentar").await;

    let err = r
        .add_reply(NewReply::new("Balasan", "comment-x", "user-456").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(Resource::Comment)));

    let a = r.add_reply(NewReply::new("satu", comment_id.clone(), "user-456").unwrap()).await.unwrap();
    let b = r.add_reply(NewReply::new("dua", comment_id.clone(), "user-123").unwrap()).await.unwrap();
    assert!(a.id.starts_with("reply-"));
    assert_eq!(a.owner, "user-456");

    assert!(matches!(r.verify_reply_access(&a.id, "user-123").await, Err(RepoError::Forbidden(Resource::Reply))));
    r.verify_reply_access(&a.id, "user-456").await.unwrap();
    r.delete_reply(&a.id).await.unwrap();

    let replies = r.get_replies_by_comment_id(&comment_id).await.unwrap();
    assert_eq!(replies.iter().map(|x| x.id.clone()).collect::<Vec<_>>(), vec![a.id, b.id]);
    assert!(replies[0].is_delete);
    assert_eq!(replies[0].content, "satu");
    assert_eq!(replies[0].username, "johndoe");
    assert!(!replies[1].is_delete);
}

#[tokio::test]
async fn likes_are_unique_per_owner() {
    let r = repo();
    let thread_id = seed_thread(&r).await;
    let comment_id = seed_comment(&r, &thread_id, "user-123", "Komentar").await;

    assert!(!r.is_comment_liked(&comment_id, "user-456").await.unwrap());
    r.add_comment_like(&comment_id, "user-456").await.unwrap();
    r.add_comment_like(&comment_id, "user-456").await.unwrap();
    r.add_comment_like(&comment_id, "user-123").await.unwrap();
    assert!(r.is_comment_liked(&comment_id, "user-456").await.unwrap());
    assert_eq!(r.count_comment_likes(&comment_id).await.unwrap(), 2);

    r.delete_comment_like(&comment_id, "user-456").await.unwrap();
    assert!(!r.is_comment_liked(&comment_id, "user-456").await.unwrap());
    assert_eq!(r.count_comment_likes(&comment_id).await.unwrap(), 1);

    assert!(matches!(
        r.add_comment_like("comment-x", "user-456").await,
        Err(RepoError::NotFound(Resource::Comment))
    ));
}

#[tokio::test]
async fn likes_get_their_own_generated_id() {
    let r = repo();
    let thread_id = seed_thread(&r).await;
    let comment_id = seed_comment(&r, &thread_id, "user-123", "Komentar").await;
    assert_eq!(comment_id, "comment-2");

    r.add_comment_like(&comment_id, "user-456").await.unwrap();
    // an existing pair takes no new id
    r.add_comment_like(&comment_id, "user-456").await.unwrap();
    r.add_comment_like(&comment_id, "user-123").await.unwrap();
    assert_eq!(r.comment_like_ids(&comment_id).unwrap(), vec!["comment_like-3", "comment_like-4"]);

    let next = seed_comment(&r, &thread_id, "user-123", "lagi").await;
    assert_eq!(next, "comment-5");
}

#[tokio::test]
async fn instances_do_not_share_state() {
    let a = repo();
    let b = repo();
    let thread_id = seed_thread(&a).await;
    assert!(b.check_thread_availability(&thread_id).await.is_err());
}
