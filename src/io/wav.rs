use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::info;

use crate::plugin::{GainCompressor, ProcessingUnit};

/// Buffer size used when walking a file through the plugin. Matches a
/// typical host callback size; the result is identical for any block size
/// since no state crosses buffer boundaries.
const BLOCK_SIZE: usize = 512;

/// Deinterleaved audio file contents.
pub struct AudioFile {
    pub spec: WavSpec,
    /// Channel-major samples, one `Vec` per channel, all the same length.
    pub channels: Vec<Vec<f32>>,
}

/// Read a WAV file into channel-major f32 buffers. 16-bit int and 32-bit
/// float files are supported.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<AudioFile> {
    let path = path.as_ref();
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("Failed to read float samples")?,
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|s| f32::from(s) / f32::from(i16::MAX)))
            .collect::<std::result::Result<_, _>>()
            .context("Failed to read int samples")?,
        (format, bits) => anyhow::bail!("Unsupported WAV format: {bits}-bit {format:?}"),
    };

    let num_channels = spec.channels as usize;
    let num_frames = interleaved.len() / num_channels;
    let mut channels: Vec<Vec<f32>> = (0..num_channels)
        .map(|_| Vec::with_capacity(num_frames))
        .collect();
    for frame in interleaved.chunks_exact(num_channels) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    Ok(AudioFile { spec, channels })
}

/// Write channel-major buffers back out in the file's original format.
pub fn write_wav<P: AsRef<Path>>(path: P, file: &AudioFile) -> Result<()> {
    let path = path.as_ref();
    let mut writer = WavWriter::create(path, file.spec)
        .with_context(|| format!("Failed to create WAV file {}", path.display()))?;

    let num_frames = file.channels.first().map_or(0, Vec::len);
    for frame in 0..num_frames {
        for channel in &file.channels {
            let sample = channel[frame];
            match (file.spec.sample_format, file.spec.bits_per_sample) {
                (SampleFormat::Float, 32) => writer.write_sample(sample)?,
                (SampleFormat::Int, 16) => {
                    let clamped = sample.clamp(-1.0, 1.0);
                    writer.write_sample((clamped * f32::from(i16::MAX)) as i16)?;
                }
                (format, bits) => anyhow::bail!("Unsupported WAV format: {bits}-bit {format:?}"),
            }
        }
    }

    writer.finalize().context("Failed to finalize WAV file")?;
    Ok(())
}

/// Run the plugin over a whole file, block by block, and write the result.
/// Channel count and sample rate are preserved.
pub fn process_file<P: AsRef<Path>, Q: AsRef<Path>>(
    plugin: &mut GainCompressor,
    input: P,
    output: Q,
) -> Result<()> {
    let mut file = read_wav(&input)?;
    let num_frames = file.channels.first().map_or(0, Vec::len);

    info!(
        "Processing {} ({} ch, {} Hz, {num_frames} frames)",
        input.as_ref().display(),
        file.spec.channels,
        file.spec.sample_rate
    );

    plugin.prepare(file.spec.sample_rate as f32);

    let mut start = 0;
    while start < num_frames {
        let end = (start + BLOCK_SIZE).min(num_frames);
        let mut block: Vec<&mut [f32]> = file
            .channels
            .iter_mut()
            .map(|c| &mut c[start..end])
            .collect();
        plugin.process(&mut block);
        start = end;
    }

    let meter = plugin.meter().get_info();
    info!(
        "Peak {:.1} dB, final-buffer gain reduction {:.1} dB",
        meter.peak_db, meter.gain_reduction_db
    );

    plugin.release();

    write_wav(&output, &file)?;
    info!("Wrote {}", output.as_ref().display());

    Ok(())
}
