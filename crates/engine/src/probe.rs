// Media header probing using Symphonia

use liteplay_core::{EngineError, EngineErrorKind};
use std::fs::File;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Track information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u64,
    /// Short codec name, e.g. "mp3" or "pcm_s16le"
    pub codec: String,
}

/// Probe a local file
pub fn probe_file(path: &str) -> Result<TrackInfo, EngineError> {
    let file = File::open(path).map_err(|e| {
        let extra = e.raw_os_error().unwrap_or(0);
        EngineError::new(EngineErrorKind::Io, format!("open file {}: {}", path, e))
            .with_extra(extra)
    })?;
    probe_source(Box::new(file), create_hint_from_path(path))
}

/// Probe any media source and describe its default track
pub fn probe_source(
    media_source: Box<dyn MediaSource>,
    hint: Hint,
) -> Result<TrackInfo, EngineError> {
    let media_source_stream = MediaSourceStream::new(media_source, Default::default());

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            media_source_stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| map_symphonia_error("Failed to probe media", e))?;

    let format_reader = probe_result.format;
    let track = format_reader.default_track().ok_or_else(|| {
        EngineError::new(EngineErrorKind::UnsupportedFormat, "No default track found")
    })?;
    let codec_params = &track.codec_params;

    let sample_rate = codec_params.sample_rate.ok_or_else(|| {
        EngineError::new(EngineErrorKind::UnsupportedFormat, "Sample rate not specified")
    })?;
    let duration_ms = match (codec_params.time_base, codec_params.n_frames) {
        (Some(tb), Some(n_frames)) => frames_to_ms(n_frames, tb.numer, tb.denom)?,
        _ => 0,
    };
    if duration_ms == 0 {
        return Err(EngineError::new(
            EngineErrorKind::UnsupportedFormat,
            "Duration not available",
        ));
    }

    let codec = symphonia::default::get_codecs()
        .get_codec(codec_params.codec)
        .map(|descriptor| descriptor.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(TrackInfo {
        sample_rate,
        channels: codec_params.channels.map(|c| c.count() as u16).unwrap_or(2),
        duration_ms,
        codec,
    })
}

/// Length of `n_frames` frames with the given time base, in milliseconds
fn frames_to_ms(n_frames: u64, numer: u32, denom: u32) -> Result<u64, EngineError> {
    n_frames
        .checked_mul(1000)
        .and_then(|n| n.checked_mul(numer as u64))
        .and_then(|n| n.checked_div(denom as u64))
        .ok_or_else(|| {
            EngineError::new(
                EngineErrorKind::UnsupportedFormat,
                format!("Implausible duration: {} frames at {}/{}", n_frames, numer, denom),
            )
        })
}

/// Create a hint from file extension
pub fn create_hint_from_path(path: &str) -> Hint {
    let mut hint = Hint::new();
    if let Some(extension) = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
    {
        hint.with_extension(extension);
    }
    hint
}

fn map_symphonia_error(context: &str, err: SymphoniaError) -> EngineError {
    match err {
        // Probe hit the end of the data before recognising anything
        SymphoniaError::IoError(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            EngineError::new(
                EngineErrorKind::UnsupportedFormat,
                format!("{}: no recognisable stream", context),
            )
        }
        SymphoniaError::IoError(io) => {
            let extra = io.raw_os_error().unwrap_or(0);
            EngineError::new(EngineErrorKind::Io, format!("{}: {}", context, io)).with_extra(extra)
        }
        SymphoniaError::Unsupported(what) => EngineError::new(
            EngineErrorKind::UnsupportedFormat,
            format!("{}: unsupported {}", context, what),
        ),
        other => EngineError::new(EngineErrorKind::Decode, format!("{}: {}", context, other)),
    }
}
