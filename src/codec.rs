//! OpenEXR load/store collaborators.
//!
//! The pipeline only ever talks to [`ImageIo`]; [`ExrCodec`] is the real
//! implementation backed by the `exr` crate, reading the R/G/B (and
//! optional A) channels of the first valid layer as 32-bit floats.

use anyhow::{Context, anyhow};

use crate::foundation::buffer::PixelBuffer;
use crate::foundation::error::{ExrmixError, ExrmixResult};

/// OpenEXR compression applied to stored outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Uncompressed output.
    None,
    /// Run-length encoding.
    Rle,
    /// zlib, one scan line at a time.
    ZipSingle,
    /// zlib in blocks of 16 scan lines (the default).
    #[default]
    Zip,
    /// PIZ wavelet compression.
    Piz,
    /// Lossy 24-bit float compression.
    Pxr24,
    /// Lossy 4x4 block compression, fixed rate.
    B44,
    /// Lossy 4x4 block compression, flat fields compressed more.
    B44a,
    /// Lossy DCT compression, 32-scanline blocks.
    Dwaa,
    /// Lossy DCT compression, 256-scanline blocks.
    Dwab,
}

/// Options forwarded to the store operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub compression: Compression,
}

/// The two collaborator operations the compose pipeline consumes.
///
/// `Sync` because a batch shares one implementation across its rayon
/// workers.
pub trait ImageIo: Sync {
    /// Decode the image at `path`.
    fn load(&self, path: &str) -> ExrmixResult<PixelBuffer>;

    /// Encode `buffer` to `path`.
    fn store(&self, path: &str, buffer: &PixelBuffer, options: &StoreOptions) -> ExrmixResult<()>;
}

/// Filesystem-backed OpenEXR codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExrCodec;

impl ImageIo for ExrCodec {
    fn load(&self, path: &str) -> ExrmixResult<PixelBuffer> {
        load_exr(path).map_err(|e| ExrmixError::read(path, e))
    }

    fn store(&self, path: &str, buffer: &PixelBuffer, options: &StoreOptions) -> ExrmixResult<()> {
        store_exr(path, buffer, options).map_err(|e| ExrmixError::write(path, e))
    }
}

fn load_exr(path: &str) -> anyhow::Result<PixelBuffer> {
    use exr::prelude::*;

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .all_channels()
        .first_valid_layer()
        .all_attributes()
        .from_file(path)
        .context("decode exr")?;

    let layer = image.layer_data;
    let width = layer.size.0;
    let height = layer.size.1;

    let mut red = None;
    let mut green = None;
    let mut blue = None;
    let mut alpha = None;
    for channel in &layer.channel_data.list {
        let samples: Vec<f32> = channel.sample_data.values_as_f32().collect();
        match channel.name.to_string().as_str() {
            "R" => red = Some(samples),
            "G" => green = Some(samples),
            "B" => blue = Some(samples),
            "A" => alpha = Some(samples),
            _ => {}
        }
    }

    let red = red.ok_or_else(|| anyhow!("missing 'R' channel"))?;
    let green = green.ok_or_else(|| anyhow!("missing 'G' channel"))?;
    let blue = blue.ok_or_else(|| anyhow!("missing 'B' channel"))?;

    let pixels = width * height;
    for (name, channel) in [("R", &red), ("G", &green), ("B", &blue)] {
        if channel.len() != pixels {
            return Err(anyhow!(
                "channel '{name}' has {} samples, expected {pixels}",
                channel.len()
            ));
        }
    }
    if let Some(a) = &alpha
        && a.len() != pixels
    {
        return Err(anyhow!(
            "channel 'A' has {} samples, expected {pixels}",
            a.len()
        ));
    }

    let has_alpha = alpha.is_some();
    let channels = if has_alpha { 4 } else { 3 };
    let mut data = Vec::with_capacity(pixels * channels);
    for i in 0..pixels {
        data.push(red[i]);
        data.push(green[i]);
        data.push(blue[i]);
        if let Some(a) = &alpha {
            data.push(a[i]);
        }
    }

    Ok(PixelBuffer::from_raw(
        width as u32,
        height as u32,
        has_alpha,
        data,
    )?)
}

fn store_exr(path: &str, buffer: &PixelBuffer, options: &StoreOptions) -> anyhow::Result<()> {
    use exr::prelude::*;

    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let pixels = width * height;
    let step = buffer.channels();
    let samples = buffer.samples();

    let plane = |offset: usize| -> Vec<f32> {
        (0..pixels).map(|i| samples[i * step + offset]).collect()
    };

    let mut channels: smallvec::SmallVec<[AnyChannel<FlatSamples>; 4]> = smallvec::smallvec![
        AnyChannel::new("R", FlatSamples::F32(plane(0))),
        AnyChannel::new("G", FlatSamples::F32(plane(1))),
        AnyChannel::new("B", FlatSamples::F32(plane(2))),
    ];
    if buffer.has_alpha() {
        channels.push(AnyChannel::new("A", FlatSamples::F32(plane(3))));
    }

    let encoding = Encoding {
        compression: exr_compression(options.compression),
        blocks: Blocks::ScanLines,
        line_order: LineOrder::Increasing,
    };
    let layer = Layer::new(
        (width, height),
        LayerAttributes::default(),
        encoding,
        AnyChannels::sort(channels),
    );

    Image::from_layer(layer)
        .write()
        .to_file(path)
        .context("encode exr")?;
    Ok(())
}

fn exr_compression(compression: Compression) -> exr::compression::Compression {
    use exr::compression::Compression as Exr;
    match compression {
        Compression::None => Exr::Uncompressed,
        Compression::Rle => Exr::RLE,
        Compression::ZipSingle => Exr::ZIP1,
        Compression::Zip => Exr::ZIP16,
        Compression::Piz => Exr::PIZ,
        Compression::Pxr24 => Exr::PXR24,
        Compression::B44 => Exr::B44,
        Compression::B44a => Exr::B44A,
        Compression::Dwaa => Exr::DWAA(None),
        Compression::Dwab => Exr::DWAB(None),
    }
}
