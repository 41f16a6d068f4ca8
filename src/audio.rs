//! Decoded audio clips.

use crate::error::RemixError;

/// A decoded clip held as planar f32 channels.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
    /// Display name, usually the file name.
    pub name: String,
}

impl AudioClip {
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32, name: impl Into<String>) -> Self {
        AudioClip { channels: vec![samples], sample_rate, name: name.into() }
    }

    /// Split interleaved frames into planar channels. A trailing partial
    /// frame is dropped.
    pub fn from_interleaved(
        data: &[f32],
        channel_count: usize,
        sample_rate: u32,
        name: impl Into<String>,
    ) -> Result<Self, RemixError> {
        if channel_count == 0 {
            return Err(RemixError::Decode("clip has no channels".to_string()));
        }
        if sample_rate == 0 {
            return Err(RemixError::InvalidSampleRate { rate: 0.0 });
        }
        let frames = data.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in data.chunks_exact(channel_count) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Ok(AudioClip { channels, sample_rate, name: name.into() })
    }

    /// Frames per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Average of all channels.
    pub fn mono(&self) -> Vec<f32> {
        match self.channels.as_slice() {
            [] => Vec::new(),
            [only] => only.clone(),
            many => {
                let scale = 1.0 / many.len() as f32;
                (0..self.len())
                    .map(|i| many.iter().map(|ch| ch.get(i).copied().unwrap_or(0.0)).sum::<f32>() * scale)
                    .collect()
            }
        }
    }
}

// ── File decoding ───────────────────────────────────────────

#[cfg(feature = "files")]
impl AudioClip {
    /// Decode a `.wav` (hound) or `.mp3` (minimp3) file.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, RemixError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let clip = match ext.as_str() {
            "wav" | "wave" => decode_wav(path, name)?,
            "mp3" => decode_mp3(path, name)?,
            other => return Err(RemixError::Decode(format!("unsupported file type '{other}'"))),
        };
        log::info!(
            "Loaded '{}': {} ch, {} Hz, {:.2}s",
            clip.name,
            clip.channels.len(),
            clip.sample_rate,
            clip.duration()
        );
        Ok(clip)
    }
}

#[cfg(feature = "files")]
fn decode_wav(path: &std::path::Path, name: String) -> Result<AudioClip, RemixError> {
    let reader = hound::WavReader::open(path).map_err(wav_error)?;
    let spec = reader.spec();
    let data: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(wav_error)?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(wav_error)?,
    };
    AudioClip::from_interleaved(&data, spec.channels as usize, spec.sample_rate, name)
}

#[cfg(feature = "files")]
fn wav_error(e: hound::Error) -> RemixError {
    match e {
        hound::Error::IoError(io) => RemixError::Io(io),
        other => RemixError::Decode(other.to_string()),
    }
}

#[cfg(feature = "files")]
fn decode_mp3(path: &std::path::Path, name: String) -> Result<AudioClip, RemixError> {
    let file = std::fs::File::open(path)?;
    let mut decoder = minimp3::Decoder::new(std::io::BufReader::new(file));
    let mut data = Vec::new();
    let mut format = None;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                format.get_or_insert((frame.channels, frame.sample_rate));
                data.extend(frame.data.iter().map(|&s| s as f32 / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(minimp3::Error::Io(e)) => return Err(RemixError::Io(e)),
            Err(e) => return Err(RemixError::Decode(format!("{e:?}"))),
        }
    }

    let (channels, sample_rate) =
        format.ok_or_else(|| RemixError::Decode("no MP3 frames found".to_string()))?;
    AudioClip::from_interleaved(&data, channels, sample_rate as u32, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_to_planar() {
        let clip = AudioClip::from_interleaved(&[1.0, -1.0, 0.5, 0.0, 0.25], 2, 4, "a.wav").unwrap();
        assert_eq!(clip.channels, vec![vec![1.0, 0.5], vec![-1.0, 0.0]]);
        assert_eq!(clip.len(), 2);
        assert_eq!(clip.duration(), 0.5);
        assert_eq!(clip.mono(), vec![0.0, 0.25]);
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(AudioClip::from_interleaved(&[0.0], 0, 44100, "x").is_err());
        assert!(matches!(
            AudioClip::from_interleaved(&[0.0], 1, 0, "x"),
            Err(RemixError::InvalidSampleRate { .. })
        ));
    }

    #[test]
    fn mono_passthrough() {
        let clip = AudioClip::from_mono(vec![0.1, 0.2], 8000, "tone");
        assert_eq!(clip.mono(), vec![0.1, 0.2]);
        assert!(!clip.is_empty());
        let empty = AudioClip { channels: vec![], sample_rate: 8000, name: String::new() };
        assert!(empty.is_empty());
        assert!(empty.mono().is_empty());
    }

    #[cfg(feature = "files")]
    #[test]
    fn unknown_extension_is_an_error() {
        assert!(matches!(AudioClip::open("clip.flac"), Err(RemixError::Decode(_))));
    }
}
