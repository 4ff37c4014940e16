use serde_json::Value;

use crate::fixtures::caption_host::SAMPLE_XML;
use crate::fixtures::seed::{PROBLEM, VIDEO, html5, sjson, youtube};
use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn local_and_remote_differ_suggests_replace() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.youtube_id_1_0 = "YT1".to_string()).await;
    app.seed_sjson("YT1", "en", &sjson(&[(0, 1000, "Old local text.")]))
        .await;
    app.captions.publish("YT1", SAMPLE_XML);

    let resp = app
        .check(&app.author_token(), VIDEO, serde_json::json!([youtube("YT1")]))
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "Success");
    assert_eq!(json["is_youtube_mode"], true);
    assert_eq!(json["youtube_local"], true);
    assert_eq!(json["youtube_server"], true);
    assert_eq!(json["youtube_diff"], true);
    assert_eq!(json["command"], "replace");
    assert_eq!(json["subs"], "YT1");
}

#[tokio::test]
async fn local_matching_remote_is_found() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.youtube_id_1_0 = "YT1".to_string()).await;
    app.seed_sjson(
        "YT1",
        "en",
        &sjson(&[
            (270, 2720, "Test text 1."),
            (2720, 2720, "Test text 2."),
            (5430, 7160, "Test text 3."),
        ]),
    )
    .await;
    app.captions.publish("YT1", SAMPLE_XML);

    let json: Value = app
        .check(&app.author_token(), VIDEO, serde_json::json!([youtube("YT1")]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json["youtube_diff"], false);
    assert_eq!(json["command"], "found");
    assert_eq!(json["subs"], "YT1");
}

#[tokio::test]
async fn remote_only_suggests_import() {
    let app = TestApp::spawn().await;
    app.seed_video(|_| {}).await;
    app.captions.publish("YT2", SAMPLE_XML);

    let json: Value = app
        .check(&app.author_token(), VIDEO, serde_json::json!([youtube("YT2")]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json["youtube_local"], false);
    assert_eq!(json["youtube_server"], true);
    assert_eq!(json["command"], "import");
    assert_eq!(json["subs"], "");
}

#[tokio::test]
async fn two_unequal_html5_transcripts_suggest_choose() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.html5_sources = vec!["a.mp4".to_string(), "b.mp4".to_string()];
    })
    .await;
    app.seed_sjson("a", "en", &sjson(&[(0, 1000, "Alpha")])).await;
    app.seed_sjson("b", "en", &sjson(&[(0, 1000, "Beta")])).await;

    let json: Value = app
        .check(
            &app.author_token(),
            VIDEO,
            serde_json::json!([html5("a"), html5("b")]),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json["html5_local"], serde_json::json!(["a", "b"]));
    assert_eq!(json["html5_equal"], false);
    assert_eq!(json["command"], "choose");
    assert_eq!(json["subs"], "a");
}

#[tokio::test]
async fn equal_html5_transcripts_are_found() {
    let app = TestApp::spawn().await;
    app.seed_video(|_| {}).await;
    let same = sjson(&[(0, 1000, "Same")]);
    app.seed_sjson("a", "en", &same).await;
    app.seed_sjson("b", "en", &same).await;

    let json: Value = app
        .check(
            &app.author_token(),
            VIDEO,
            serde_json::json!([html5("a"), html5("b")]),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json["html5_equal"], true);
    assert_eq!(json["command"], "found");
    assert_eq!(json["subs"], "a");
}

#[tokio::test]
async fn existing_sub_is_reused() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "legacy".to_string()).await;
    app.seed_sjson("legacy", "en", &sjson(&[(0, 1000, "Legacy")]))
        .await;

    let json: Value = app
        .check(&app.author_token(), VIDEO, serde_json::json!([html5("fresh")]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json["current_item_subs"], "legacy");
    assert_eq!(json["command"], "use_existing");
}

#[tokio::test]
async fn nothing_anywhere_is_not_found() {
    let app = TestApp::spawn().await;
    app.seed_video(|_| {}).await;

    let json: Value = app
        .check(&app.author_token(), VIDEO, serde_json::json!([youtube("missing")]))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(json["youtube_server"], false);
    assert_eq!(json["command"], "not_found");
    assert!(json["current_item_subs"].is_null());
}

#[tokio::test]
async fn check_rejects_non_video_items() {
    let app = TestApp::spawn().await;
    app.seed_problem().await;

    let resp = app
        .check(&app.author_token(), PROBLEM, serde_json::json!([html5("a")]))
        .await;
    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "Error");
    assert_eq!(
        json["message"],
        r#"Transcripts are supported only for "video" modules."#
    );
}

#[tokio::test]
async fn check_requires_video_data() {
    let app = TestApp::spawn().await;

    let resp = app
        .auth_get("/api/transcripts/check", &app.author_token())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Incoming video data is empty.");
}

#[tokio::test]
async fn unknown_locator_is_404() {
    let app = TestApp::spawn().await;

    let resp = app
        .check(&app.author_token(), VIDEO, serde_json::json!([html5("a")]))
        .await;
    assert_eq!(resp.status().as_u16(), 404);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Cannot find item by locator.");
}

#[tokio::test]
async fn uploaded_dotted_stem_is_found_by_check() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.html5_sources = vec!["https://cdn.test/lecture.v2.mp4".to_string()])
        .await;
    let token = app.author_token();
    let videos = serde_json::json!([html5("lecture.v2")]);

    let resp = app
        .upload(
            &token,
            "lecture.srt",
            "0\n00:00:00,270 --> 00:00:02,720\nHello\n",
            videos.clone(),
            None,
        )
        .await;
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["subs"], "lecture.v2");
    assert!(app.asset_exists("subs_lecture.v2.srt.sjson").await);

    let json: Value = app.check(&token, VIDEO, videos).await.json().await.unwrap();
    assert_eq!(json["html5_local"], serde_json::json!(["lecture.v2"]));
    assert_eq!(json["command"], "found");
    assert_eq!(json["subs"], "lecture.v2");
}
