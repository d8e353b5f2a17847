#![cfg(feature = "inmem-store")]

use actix_web::{dev::Payload, test, web, FromRequest};
use forum_api::{
    auth::{create_jwt, Auth, AuthError, CredentialVerifier, JwtVerifier},
    error::ForumError,
    repo::inmem::InMemRepo,
    routes::AppState,
};
use std::sync::Arc;

const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

fn state() -> web::Data<AppState> {
    web::Data::new(AppState::new(Arc::new(InMemRepo::new()), Arc::new(JwtVerifier::new(SECRET))))
}

#[::core::prelude::v1::test]
fn jwt_roundtrip_ok() {
    let token = create_jwt(SECRET, "user-123", "dicoding").expect("token");
    let claims = JwtVerifier::new(SECRET).verify(&token).expect("verify");
    assert_eq!(claims.sub, "user-123");
    assert_eq!(claims.username, "dicoding");
}

#[::core::prelude::v1::test]
fn verifier_rejects_wrong_secret_and_garbage() {
    let token = create_jwt("another-secret-which-is-also-long!!", "user-123", "dicoding").unwrap();
    assert!(matches!(JwtVerifier::new(SECRET).verify(&token), Err(AuthError::InvalidToken(_))));
    assert!(JwtVerifier::new(SECRET).verify("notatoken").is_err());
}

#[::core::prelude::v1::test]
fn empty_subject_is_rejected() {
    let token = create_jwt(SECRET, "", "nobody").unwrap();
    assert!(matches!(JwtVerifier::new(SECRET).verify(&token), Err(AuthError::EmptySubject)));
}

#[actix_web::test]
async fn extractor_yields_owner() {
    let token = create_jwt(SECRET, "user-123", "dicoding").unwrap();
    let req = test::TestRequest::default()
        .app_data(state())
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .to_http_request();
    let mut pl = Payload::None;
    let auth = Auth::from_request(&req, &mut pl).await.expect("extract");
    assert_eq!(auth.owner(), "user-123");
}

#[actix_web::test]
async fn extractor_rejects_missing_or_invalid_token() {
    let req = test::TestRequest::default().app_data(state()).to_http_request();
    let mut pl = Payload::None;
    assert!(matches!(Auth::from_request(&req, &mut pl).await, Err(ForumError::Unauthorized(_))));

    let req = test::TestRequest::default()
        .app_data(state())
        .insert_header(("Authorization", "Bearer notatoken"))
        .to_http_request();
    let mut pl = Payload::None;
    assert!(matches!(Auth::from_request(&req, &mut pl).await, Err(ForumError::Unauthorized(_))));
}
