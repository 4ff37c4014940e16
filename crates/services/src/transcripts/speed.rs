//! Re-timing of transcripts for alternate playback speeds.
//!
//! Rounding is half away from zero.

use super::codec::CodecError;
use super::sjson::Sjson;

fn rescale(ms: u64, speed: f64, source_speed: f64) -> u64 {
    (ms as f64 * speed / source_speed).round() as u64
}

/// Converts `source` timed at `source_speed` into timings multiplied by `speed / source_speed`.
pub fn generate_subs(speed: f64, source_speed: f64, source: &Sjson) -> Sjson {
    if speed == source_speed {
        return source.clone();
    }
    Sjson {
        start: source
            .start
            .iter()
            .map(|&ms| rescale(ms, speed, source_speed))
            .collect(),
        end: source
            .end
            .iter()
            .map(|&ms| rescale(ms, speed, source_speed))
            .collect(),
        text: source.text.clone(),
    }
}

fn check_speed(speed: f64) -> Result<(), CodecError> {
    if speed.is_finite() && speed > 0.0 {
        Ok(())
    } else {
        Err(CodecError::InvalidSpeed(speed))
    }
}

/// Timings of a 1.0x transcript as played back at `target` speed (`ms / target`).
pub fn scale_to_speed(subs_1x: &Sjson, target: f64) -> Result<Sjson, CodecError> {
    check_speed(target)?;
    Ok(generate_subs(1.0, target, subs_1x))
}

/// Brings a transcript stored for `source_speed` back to 1.0x (`ms * source_speed`).
pub fn normalize_to_1x(subs: &Sjson, source_speed: f64) -> Result<Sjson, CodecError> {
    check_speed(source_speed)?;
    Ok(generate_subs(source_speed, 1.0, subs))
}
