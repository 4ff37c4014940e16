use serde_json::Value;

use crate::fixtures::seed::sjson;
use crate::fixtures::test_app::TestApp;

const UK_SRT: &str = "0\n00:00:01,000 --> 00:00:02,000\nПривіт.\n";

#[tokio::test]
async fn translation_serves_stored_sjson() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "legacy".to_string()).await;
    app.seed_sjson("legacy", "en", &sjson(&[(0, 1000, "Hello")])).await;

    let resp = app
        .client
        .get(app.video_path("translation/en"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-type"], "application/json");
    assert_eq!(resp.headers()["content-language"], "en");
    let json: Value = resp.json().await.unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "start": [0], "end": [1000], "text": ["Hello"] })
    );
}

#[tokio::test]
async fn translation_rescales_for_slower_youtube_stream() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.youtube_id_0_75 = "SLOW".to_string();
        b.youtube_id_1_0 = "NORM".to_string();
    })
    .await;
    app.seed_sjson("NORM", "en", &sjson(&[(10, 100, "Hi")])).await;

    let resp = app
        .client
        .get(app.video_path("translation/en"))
        .query(&[("videoId", "SLOW")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["start"], serde_json::json!([13]));
    assert_eq!(json["end"], serde_json::json!([133]));
    assert_eq!(json["text"], serde_json::json!(["Hi"]));
}

#[tokio::test]
async fn translation_reads_uploaded_file_for_other_languages() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.transcripts
            .insert("uk".to_string(), "uk_intro.srt".to_string());
    })
    .await;
    app.seed_asset("uk_intro.srt", UK_SRT.as_bytes()).await;

    let resp = app
        .client
        .get(app.video_path("translation/uk"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-language"], "uk");
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["start"], serde_json::json!([1000]));
    assert_eq!(json["text"], serde_json::json!(["Привіт."]));
}

#[tokio::test]
async fn translation_file_download_encodes_non_ascii_names() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.transcripts.insert("zh".to_string(), "塞.srt".to_string());
    })
    .await;
    app.seed_asset("塞.srt", UK_SRT.as_bytes()).await;

    let resp = app
        .client
        .get(app.video_path("translation/zh"))
        .query(&[("filename", "塞.srt")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename*=UTF-8''%E5%A1%9E.srt"
    );
    assert_eq!(resp.text().await.unwrap(), UK_SRT);
}

#[tokio::test]
async fn translation_for_unknown_language_is_404() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "legacy".to_string()).await;
    app.seed_sjson("legacy", "en", &sjson(&[(0, 1000, "Hello")])).await;

    let resp = app
        .client
        .get(app.video_path("translation/de"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn translation_without_language_is_400() {
    let app = TestApp::spawn().await;
    app.seed_video(|_| {}).await;

    let resp = app
        .client
        .get(app.video_path("translation"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Language is required.");
}

#[tokio::test]
async fn imported_course_falls_back_to_static_redirect() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.sub = "legacy".to_string();
        b.data_dir = Some("demo_course".to_string());
    })
    .await;

    let resp = app
        .client
        .get(app.video_path("translation/en"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 307);
    assert_eq!(
        resp.headers()["location"],
        "/static/demo_course/subs_legacy.srt.sjson"
    );
}

#[tokio::test]
async fn available_translations_lists_resolvable_languages() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| {
        b.sub = "legacy".to_string();
        b.transcripts
            .insert("uk".to_string(), "uk_intro.srt".to_string());
        b.transcripts
            .insert("fr".to_string(), "missing.srt".to_string());
    })
    .await;
    app.seed_sjson("legacy", "en", &sjson(&[(0, 1000, "Hello")])).await;
    app.seed_asset("uk_intro.srt", UK_SRT.as_bytes()).await;

    let resp = app
        .client
        .get(app.video_path("available_translations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let langs: Vec<String> = resp.json().await.unwrap();
    assert_eq!(langs, vec!["en", "uk"]);
}

#[tokio::test]
async fn available_translations_without_any_is_404() {
    let app = TestApp::spawn().await;
    app.seed_video(|_| {}).await;

    let resp = app
        .client
        .get(app.video_path("available_translations"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn learner_download_names_file_after_language() {
    let app = TestApp::spawn().await;
    app.seed_video(|b| b.sub = "legacy".to_string()).await;
    app.seed_sjson("legacy", "en", &sjson(&[(0, 1000, "Hello")])).await;

    let resp = app
        .client
        .get(app.video_path("download"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-language"], "en");
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"en_legacy.srt\""
    );
    assert_eq!(
        resp.text().await.unwrap(),
        "0\n00:00:00,000 --> 00:00:01,000\nHello\n\n"
    );

    let resp = app
        .client
        .get(app.video_path("download"))
        .query(&[("format", "txt")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(resp.text().await.unwrap(), "Hello");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}
