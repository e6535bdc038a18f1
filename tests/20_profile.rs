mod common;

use anyhow::Result;
use axum::{extract::Path, routing::get, Json, Router};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use devconnect_api::AppConfig;

async fn with_profile(server: &common::TestServer, token: &str, body: Value) -> Result<Value> {
    let (status, profile) = server.send(Method::POST, "/api/profile", Some(token), Some(body)).await?;
    anyhow::ensure!(status == StatusCode::OK, "upsert failed: {} {}", status, profile);
    Ok(profile)
}

#[tokio::test]
async fn upsert_creates_and_updates_one_profile() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.register("Ada", "ada@example.com").await?;

    let created = with_profile(
        &server,
        &token,
        json!({ "status": "Developer", "skills": "rust, go ,,sql", "company": "Acme", "twitter": "https://twitter.com/ada" }),
    )
    .await?;
    assert_eq!(created["skills"], json!(["rust", "go", "sql"]));
    assert_eq!(created["user"]["name"], "Ada");
    assert_eq!(created["social"]["twitter"], "https://twitter.com/ada");

    let updated = with_profile(&server, &token, json!({ "status": "Lead", "skills": "rust" })).await?;
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["status"], "Lead");
    assert_eq!(updated["company"], "Acme");
    // Social links are rebuilt from each request
    assert_eq!(updated["social"], json!({}));

    let (status, all) = server.send(Method::GET, "/api/profile", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn profile_reads() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.register("Ada", "ada@example.com").await?;

    let (status, body) = server.send(Method::GET, "/api/profile/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "msg": "There is no profile for this user" }));

    let profile = with_profile(&server, &token, json!({ "status": "Developer", "skills": "rust" })).await?;
    let user_id = profile["user"]["id"].as_str().unwrap_or_default().to_string();

    let (status, me) = server.send(Method::GET, "/api/profile/me", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], profile["id"]);

    let (status, by_user) = server
        .send(Method::GET, &format!("/api/profile/user/{}", user_id), None, None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_user["id"], profile["id"]);

    let (status, body) = server.send(Method::GET, "/api/profile/user/not-an-id", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "msg": "Profile not found" }));
    Ok(())
}

#[tokio::test]
async fn upsert_requires_status_and_skills() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.register("Ada", "ada@example.com").await?;

    let (status, body) = server
        .send(Method::POST, "/api/profile", Some(&token), Some(json!({ "company": "Acme" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "errors": [
            { "msg": "Skills is required", "param": "skills" },
            { "msg": "Status is required", "param": "status" }
        ] })
    );
    Ok(())
}

#[tokio::test]
async fn experience_and_education_lifecycle() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.register("Ada", "ada@example.com").await?;
    with_profile(&server, &token, json!({ "status": "Developer", "skills": "rust" })).await?;

    let (status, _) = server
        .send(
            Method::PUT,
            "/api/profile/experience",
            Some(&token),
            Some(json!({ "title": "Junior", "company": "Acme", "from": "2015-01-01", "to": "2017-01-01" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = server
        .send(
            Method::PUT,
            "/api/profile/experience",
            Some(&token),
            Some(json!({ "title": "Senior", "company": "Acme", "from": "2017-01-01", "current": true })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["experience"][0]["title"], "Senior");
    assert_eq!(profile["experience"][1]["title"], "Junior");

    let (status, profile) = server
        .send(
            Method::PUT,
            "/api/profile/education",
            Some(&token),
            Some(json!({ "school": "MIT", "degree": "BSc", "fieldofstudy": "CS", "from": "2010-09-01" })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    let edu_id = profile["education"][0]["id"].as_str().unwrap_or_default().to_string();
    let senior_id = profile["experience"][0]["id"].as_str().unwrap_or_default().to_string();

    // An experience id does not address the education list
    let (status, body) = server
        .send(Method::DELETE, &format!("/api/profile/education/{}", senior_id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "msg": "Education not found" }));

    let (status, profile) = server
        .send(Method::DELETE, &format!("/api/profile/education/{}", edu_id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["education"], json!([]));
    assert_eq!(profile["experience"].as_array().map(Vec::len), Some(2));

    let (status, profile) = server
        .send(Method::DELETE, &format!("/api/profile/experience/{}", senior_id), Some(&token), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["experience"][0]["title"], "Junior");
    Ok(())
}

#[tokio::test]
async fn experience_requires_valid_dates() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.register("Ada", "ada@example.com").await?;
    with_profile(&server, &token, json!({ "status": "Developer", "skills": "rust" })).await?;

    let (status, body) = server
        .send(
            Method::PUT,
            "/api/profile/experience",
            Some(&token),
            Some(json!({ "title": "Dev", "company": "Acme", "from": "last spring" })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "errors": [{ "msg": "From date is invalid", "param": "from" }] }));
    Ok(())
}

#[tokio::test]
async fn delete_account_removes_profile_and_user() -> Result<()> {
    let server = common::spawn_server().await?;
    let token = server.register("Ada", "ada@example.com").await?;
    with_profile(&server, &token, json!({ "status": "Developer", "skills": "rust" })).await?;

    let (status, body) = server.send(Method::DELETE, "/api/profile", Some(&token), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "msg": "User deleted" }));

    let (_, all) = server.send(Method::GET, "/api/profile", None, None).await?;
    assert_eq!(all, json!([]));

    // The token still verifies but the account is gone
    let (status, _) = server.send(Method::GET, "/api/auth", Some(&token), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

/// Local stand-in for the GitHub API.
async fn spawn_fake_github() -> Result<String> {
    async fn repos(Path(username): Path<String>) -> Result<Json<Value>, axum::http::StatusCode> {
        if username == "octocat" {
            Ok(Json(json!([{ "name": "hello-world", "owner": { "login": "octocat" } }])))
        } else {
            Err(axum::http::StatusCode::NOT_FOUND)
        }
    }

    let port = portpicker::pick_unused_port().ok_or_else(|| anyhow::anyhow!("no free port"))?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let router = Router::new().route("/users/:username/repos", get(repos));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

#[tokio::test]
async fn github_repos_proxy() -> Result<()> {
    let mut config = AppConfig::development();
    config.github.api_base = spawn_fake_github().await?;
    let server = common::TestServer::spawn_with(config).await?;

    let (status, repos) = server.send(Method::GET, "/api/profile/github/octocat", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(repos[0]["name"], "hello-world");

    let (status, body) = server.send(Method::GET, "/api/profile/github/nobody", None, None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "msg": "No Github profile found" }));
    Ok(())
}
