//! Filename conventions for transcript assets.
//!
//! Every asset name written by this crate is produced here.

use chrono::{DateTime, Local};
use lectern_db::models::VideoBlock;
pub use lectern_db::models::video_block::DEFAULT_LANGUAGE;

/// Playback speeds paired with the block fields that carry their YouTube ids.
pub const YOUTUBE_SPEEDS: [f64; 4] = [0.75, 1.0, 1.25, 1.5];

/// `subs_<id>.srt.sjson` for the default language, `<lang>_subs_<id>.srt.sjson` otherwise.
pub fn subs_filename(subs_id: &str, lang: &str) -> String {
    if lang.is_empty() || lang == DEFAULT_LANGUAGE {
        format!("subs_{subs_id}.srt.sjson")
    } else {
        format!("{lang}_subs_{subs_id}.srt.sjson")
    }
}

pub fn backup_filename(filename: &str, at: &DateTime<Local>) -> String {
    format!("{filename}.{}", at.format("%y%m%d%H%M%S"))
}

/// Last path segment of `url` with a single trailing extension removed.
pub fn html5_id(url: &str) -> String {
    let base = url.rsplit('/').next().unwrap_or(url);
    match base.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => base.to_string(),
    }
}

pub fn html5_ids(sources: &[String]) -> Vec<String> {
    sources.iter().map(|s| html5_id(s)).collect()
}

/// `(speed, youtube_id)` for each configured YouTube stream, slowest first.
pub fn youtube_speed_map(item: &VideoBlock) -> Vec<(f64, String)> {
    let ids = [
        &item.youtube_id_0_75,
        &item.youtube_id_1_0,
        &item.youtube_id_1_25,
        &item.youtube_id_1_5,
    ];
    YOUTUBE_SPEEDS
        .iter()
        .zip(ids)
        .filter(|(_, id)| !id.is_empty())
        .map(|(speed, id)| (*speed, id.clone()))
        .collect()
}

pub fn youtube_speed_of(item: &VideoBlock, video_id: &str) -> Option<f64> {
    youtube_speed_map(item)
        .into_iter()
        .find(|(_, id)| id == video_id)
        .map(|(speed, _)| speed)
}

/// Non-empty and safe to embed in an asset filename.
pub fn is_valid_subs_id(subs_id: &str) -> bool {
    !subs_id.is_empty()
        && subs_id != "."
        && subs_id != ".."
        && !subs_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Splits `name.ext` into stem and lowercased extension.
pub fn split_extension(filename: &str) -> (&str, Option<String>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            (stem, Some(ext.to_ascii_lowercase()))
        }
        _ => (filename, None),
    }
}

/// Drops any directory prefix such as `/static/`.
pub fn strip_directory(filename: &str) -> &str {
    filename.rsplit('/').next().unwrap_or(filename)
}
