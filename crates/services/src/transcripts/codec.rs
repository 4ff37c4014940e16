//! Conversion between SJSON and the text caption formats (SubRip, SubViewer, plain text).

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::warn;

use super::sjson::Sjson;
use super::speed::generate_subs;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Something wrong with SubRip transcripts file during parsing.")]
    NoCues,
    #[error("Invalid cue {index}: {reason}")]
    InvalidCue { index: usize, reason: String },
    #[error("Invalid SJSON transcript: {0}")]
    InvalidSjson(String),
    #[error("This transcript file type is not supported.")]
    UnsupportedFormat(String),
    #[error("There is a problem with this transcript file. Try to upload a different file.")]
    InvalidEncoding,
    #[error("Speed must be a positive number, got {0}")]
    InvalidSpeed(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFormat {
    Srt,
    Sbv,
    Sjson,
    Txt,
}

impl TranscriptFormat {
    pub fn from_extension(ext: &str) -> Result<Self, CodecError> {
        match ext.to_ascii_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "sbv" => Ok(Self::Sbv),
            "sjson" => Ok(Self::Sjson),
            "txt" => Ok(Self::Txt),
            other => Err(CodecError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Sbv => "sbv",
            Self::Sjson => "sjson",
            Self::Txt => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Srt => "application/x-subrip; charset=utf-8",
            Self::Sbv => "text/plain; charset=utf-8",
            Self::Sjson => "application/json",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }
}

impl fmt::Display for TranscriptFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One parsed caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start: u64,
    pub end: u64,
    pub text: String,
}

/// `HH:MM:SS,mmm`. Hours are not capped at two digits.
pub fn format_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = ms / 60_000 % 60;
    let seconds = ms / 1000 % 60;
    let millis = ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parses `H:MM:SS,mmm` or `H:MM:SS.mmm`; the fraction may be shorter than three digits.
pub fn parse_timestamp(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (clock, fraction) = match raw.find([',', '.']) {
        Some(pos) => (&raw[..pos], &raw[pos + 1..]),
        None => (raw, "0"),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let [h, m, s] = parts.as_slice() else {
        return None;
    };
    let hours: u64 = h.trim().parse().ok()?;
    let minutes: u64 = m.parse().ok()?;
    let seconds: u64 = s.parse().ok()?;
    if minutes >= 60 || seconds >= 60 || fraction.is_empty() || fraction.len() > 3 {
        return None;
    }
    let millis: u64 = format!("{fraction:0<3}").parse().ok()?;
    hours
        .checked_mul(3_600_000)?
        .checked_add((minutes * 60 + seconds) * 1000 + millis)
}

fn normalize_newlines(data: &str) -> String {
    data.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

fn blocks(data: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in data.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn parse_srt_block(lines: &[&str]) -> Result<Cue, String> {
    let timing_at = lines
        .iter()
        .position(|l| l.contains("-->"))
        .ok_or_else(|| "missing timing line".to_string())?;
    if timing_at > 1 || (timing_at == 1 && lines[0].trim().parse::<u64>().is_err()) {
        return Err("unexpected text before timing line".to_string());
    }
    let (from, to) = lines[timing_at]
        .split_once("-->")
        .ok_or_else(|| "missing arrow".to_string())?;
    // Trailing positioning hints (`X1:.. X2:..`) follow the end time.
    let to = to.split_whitespace().next().unwrap_or_default();
    let start = parse_timestamp(from).ok_or_else(|| format!("bad start time {:?}", from.trim()))?;
    let end = parse_timestamp(to).ok_or_else(|| format!("bad end time {to:?}"))?;
    if end < start {
        return Err(format!("end {end} precedes start {start}"));
    }
    Ok(Cue {
        start,
        end,
        text: lines[timing_at + 1..].join("\n"),
    })
}

/// Parses SubRip text. Malformed cues are skipped; an input without any usable cue is an error.
pub fn parse_srt(data: &str) -> Result<Vec<Cue>, CodecError> {
    let data = normalize_newlines(data);
    let mut cues = Vec::new();
    for (index, block) in blocks(&data).iter().enumerate() {
        match parse_srt_block(block) {
            Ok(cue) => cues.push(cue),
            Err(reason) => warn!(block = index, %reason, "Skipping malformed SubRip cue"),
        }
    }
    if cues.is_empty() {
        return Err(CodecError::NoCues);
    }
    Ok(cues)
}

/// Parses SubViewer (`H:MM:SS.mmm,H:MM:SS.mmm` followed by text lines).
pub fn parse_sbv(data: &str) -> Result<Vec<Cue>, CodecError> {
    let data = normalize_newlines(data);
    let mut cues = Vec::new();
    for (index, block) in blocks(&data).iter().enumerate() {
        let parsed = block[0].split_once(',').and_then(|(from, to)| {
            let start = parse_timestamp(from)?;
            let end = parse_timestamp(to)?;
            (end >= start).then_some((start, end))
        });
        match parsed {
            Some((start, end)) => cues.push(Cue {
                start,
                end,
                text: block[1..].join("\n"),
            }),
            None => warn!(block = index, line = block[0], "Skipping malformed SubViewer cue"),
        }
    }
    if cues.is_empty() {
        return Err(CodecError::NoCues);
    }
    Ok(cues)
}

/// Cue lines are joined with a single space.
pub fn sjson_from_cues(cues: &[Cue]) -> Sjson {
    let mut sjson = Sjson::default();
    for cue in cues {
        sjson.push(cue.start, cue.end, cue.text.replace('\n', " "));
    }
    sjson
}

pub fn srt_to_sjson(data: &str) -> Result<Sjson, CodecError> {
    Ok(sjson_from_cues(&parse_srt(data)?))
}

/// Renders SubRip with zero-based indices. Inconsistent arrays yield an empty document.
pub fn generate_srt_from_sjson(sjson: &Sjson, speed: f64) -> Result<String, CodecError> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(CodecError::InvalidSpeed(speed));
    }
    if !sjson.has_parallel_arrays() {
        return Ok(String::new());
    }
    let scaled = generate_subs(1.0, speed, sjson);
    let mut output = String::new();
    for (i, ((start, end), text)) in scaled
        .start
        .iter()
        .zip(&scaled.end)
        .zip(&scaled.text)
        .enumerate()
    {
        // A blank line would end the cue early.
        let text = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        output.push_str(&format!(
            "{i}\n{} --> {}\n{text}\n\n",
            format_time(*start),
            format_time(*end)
        ));
    }
    Ok(output)
}

/// Builds a 1.0x SJSON from an uploaded file with the given extension.
pub fn sjson_from_source(ext: &str, data: &str) -> Result<Sjson, CodecError> {
    match TranscriptFormat::from_extension(ext)? {
        TranscriptFormat::Srt => srt_to_sjson(data),
        TranscriptFormat::Sbv => Ok(sjson_from_cues(&parse_sbv(data)?)),
        TranscriptFormat::Sjson => {
            let sjson = Sjson::from_json(data)?;
            sjson.validate()?;
            Ok(sjson)
        }
        TranscriptFormat::Txt => Err(CodecError::UnsupportedFormat(ext.to_string())),
    }
}

/// Converts transcript text between formats. Accepted inputs are srt, sbv and sjson.
pub fn convert(
    content: &str,
    input: TranscriptFormat,
    output: TranscriptFormat,
) -> Result<String, CodecError> {
    if input == output {
        return Ok(content.to_string());
    }
    let sjson = match input {
        TranscriptFormat::Srt => {
            if output == TranscriptFormat::Txt {
                let cues = parse_srt(content)?;
                let lines: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
                return Ok(unescape_html(&lines.join("\n")));
            }
            srt_to_sjson(content)?
        }
        TranscriptFormat::Sbv => sjson_from_cues(&parse_sbv(content)?),
        TranscriptFormat::Sjson => Sjson::from_json(content)?,
        TranscriptFormat::Txt => return Err(CodecError::UnsupportedFormat("txt".to_string())),
    };
    match output {
        TranscriptFormat::Srt => generate_srt_from_sjson(&sjson, 1.0),
        TranscriptFormat::Sjson => sjson.to_json(),
        TranscriptFormat::Txt => Ok(to_txt(&sjson)),
        TranscriptFormat::Sbv => Err(CodecError::UnsupportedFormat("sbv".to_string())),
    }
}

/// Cue text, one per line, with HTML entities decoded.
pub fn to_txt(sjson: &Sjson) -> String {
    unescape_html(&sjson.text.join("\n"))
}

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z]{2,8});").expect("entity pattern")
});

/// Decodes numeric references and the common named entities in a single pass.
pub fn unescape_html(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or(body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
