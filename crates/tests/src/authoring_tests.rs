use serde_json::Value;

use crate::fixtures::caption_host::SAMPLE_XML;
use crate::fixtures::seed::{VIDEO, html5, sjson, youtube};
use crate::fixtures::test_app::TestApp;

const UK_SRT: &str = "0\n00:00:01,000 --> 00:00:02,000\nПривіт.\n";

#[tokio::test]
async fn choose_keeps_one_html5_transcript() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.html5_sources = vec!["a.mp4".to_string(), "b.mp4".to_string()];
    })
    .await;
    app.seed_sjson("a", "en", &sjson(&[(0, 1000, "Alpha")])).await;
    app.seed_sjson("b", "en", &sjson(&[(0, 1000, "Beta")])).await;

    let resp = app
        .auth_post("/api/transcripts/choose", &app.author_token())
        .json(&serde_json::json!({
            "locator": VIDEO,
            "html5_id": "b",
            "videos": [html5("a"), html5("b")],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "Success");
    assert_eq!(json["subs"], "b");

    assert!(app.stored_sjson("a", "en").await.is_none());
    assert!(app.stored_sjson("b", "en").await.is_some());
    assert_eq!(app.video().await.sub, "b");
}

#[tokio::test]
async fn choose_unknown_transcript_is_404() {
    let app = TestApp::spawn().await;
    app.seed_video(|_| {}).await;
    app.seed_sjson("a", "en", &sjson(&[(0, 1000, "Alpha")])).await;

    let resp = app
        .auth_post("/api/transcripts/choose", &app.author_token())
        .json(&serde_json::json!({
            "locator": VIDEO,
            "html5_id": "zzz",
            "videos": [html5("a")],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
    assert!(app.stored_sjson("a", "en").await.is_some());
}

#[tokio::test]
async fn replace_imports_youtube_captions() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.youtube_id_1_0 = "YT1".to_string()).await;
    app.seed_sjson("YT1", "en", &sjson(&[(0, 1000, "Stale")])).await;
    app.captions.publish("YT1", SAMPLE_XML);

    let resp = app
        .auth_post("/api/transcripts/replace", &app.author_token())
        .json(&serde_json::json!({ "locator": VIDEO, "videos": [youtube("YT1")] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["subs"], "YT1");

    let stored = app.stored_sjson("YT1", "en").await.unwrap();
    assert_eq!(stored.start, vec![270, 2720, 5430]);
    assert_eq!(stored.end, vec![2720, 2720, 7160]);
    assert_eq!(app.video().await.sub, "YT1");
}

#[tokio::test]
async fn replace_requires_youtube_source() {
    let app = TestApp::spawn().await;
    app.seed_video(|_| {}).await;

    let resp = app
        .auth_post("/api/transcripts/replace", &app.author_token())
        .json(&serde_json::json!({ "locator": VIDEO, "videos": [html5("a")] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "YouTube ID is required.");
}

#[tokio::test]
async fn replace_without_remote_captions_keeps_local_state() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "YT9".to_string()).await;
    let local = sjson(&[(0, 1000, "Local")]);
    app.seed_sjson("YT9", "en", &local).await;

    let resp = app
        .auth_post("/api/transcripts/replace", &app.author_token())
        .json(&serde_json::json!({ "locator": VIDEO, "videos": [youtube("YT9")] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "Error");
    assert_eq!(app.stored_sjson("YT9", "en").await, Some(local));
}

#[tokio::test]
async fn rename_copies_current_transcript_to_html5_ids() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "old".to_string()).await;
    let current = sjson(&[(0, 1000, "Current")]);
    app.seed_sjson("old", "en", &current).await;

    let resp = app
        .auth_post("/api/transcripts/rename", &app.author_token())
        .json(&serde_json::json!({
            "locator": VIDEO,
            "videos": [html5("x"), html5("y")],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["subs"], "y");

    assert_eq!(app.stored_sjson("x", "en").await.as_ref(), Some(&current));
    assert_eq!(app.stored_sjson("y", "en").await.as_ref(), Some(&current));
    assert_eq!(app.video().await.sub, "y");
}

#[tokio::test]
async fn save_clearing_sub_removes_current_transcripts() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "old".to_string()).await;
    app.seed_sjson("old", "en", &sjson(&[(0, 1000, "Old")])).await;

    let resp = app
        .auth_post("/api/transcripts/save", &app.author_token())
        .json(&serde_json::json!({
            "locator": VIDEO,
            "metadata": { "sub": "" },
            "current_subs": ["old"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "Success");

    assert!(app.stored_sjson("old", "en").await.is_none());
    assert_eq!(app.video().await.sub, "");
}

#[tokio::test]
async fn save_new_sub_is_copied_to_html5_sources() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.html5_sources = vec!["https://cdn.test/clip.mp4".to_string()])
        .await;
    let subs = sjson(&[(0, 1000, "Shared")]);
    app.seed_sjson("YT1", "en", &subs).await;

    let resp = app
        .auth_post("/api/transcripts/save", &app.author_token())
        .json(&serde_json::json!({
            "locator": VIDEO,
            "metadata": { "sub": "YT1", "youtube_id_1_0": "YT1" },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    assert_eq!(app.stored_sjson("clip", "en").await, Some(subs));
    let video = app.video().await;
    assert_eq!(video.sub, "YT1");
    assert_eq!(video.youtube_id_1_0, "YT1");
}

#[tokio::test]
async fn save_regenerates_translations_from_uploaded_files() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.youtube_id_1_0 = "YT1".to_string();
        b.html5_sources = vec!["clip.mp4".to_string()];
        b.transcripts.insert("fr".to_string(), "fr.srt".to_string());
    })
    .await;
    app.seed_sjson("YT1", "fr", &sjson(&[(0, 1000, "Bonjour")])).await;
    app.seed_asset("uk_intro.srt", UK_SRT.as_bytes()).await;

    let resp = app
        .auth_post("/api/transcripts/save", &app.author_token())
        .json(&serde_json::json!({
            "locator": VIDEO,
            "metadata": { "transcripts": { "uk": "/static/uk_intro.srt" } },
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let expected = sjson(&[(1000, 2000, "Привіт.")]);
    assert_eq!(app.stored_sjson("YT1", "uk").await.as_ref(), Some(&expected));
    assert_eq!(app.stored_sjson("clip", "uk").await.as_ref(), Some(&expected));
    assert!(app.stored_sjson("YT1", "fr").await.is_none());

    let video = app.video().await;
    assert_eq!(
        video.transcripts.get("uk").map(String::as_str),
        Some("uk_intro.srt")
    );
    assert!(!video.transcripts.contains_key("fr"));
}

#[tokio::test]
async fn authoring_other_course_is_forbidden() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "old".to_string()).await;
    app.seed_sjson("old", "en", &sjson(&[(0, 1000, "Old")])).await;

    let resp = app
        .auth_post("/api/transcripts/save", &app.outsider_token())
        .json(&serde_json::json!({
            "locator": VIDEO,
            "metadata": { "sub": "" },
            "current_subs": ["old"],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    assert!(app.stored_sjson("old", "en").await.is_some());
    assert_eq!(app.video().await.sub, "old");
}
