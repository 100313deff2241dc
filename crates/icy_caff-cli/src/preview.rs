//! Animated GIF previews of decoded animations.

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use icy_caff::CaffAnimation;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use tracing::debug;

/// Converts a frame duration to a GIF delay in hundredths of a second, rounding to nearest.
pub fn delay_centis(duration_ms: u64) -> u16 {
    let centis = duration_ms / 10 + u64::from(duration_ms % 10 >= 5);
    u16::try_from(centis).unwrap_or(u16::MAX)
}

/// Writes `animation` as a looping GIF to `path`.
pub fn write_preview(animation: &CaffAnimation, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = BufWriter::new(File::create(path)?);
    encode_preview(animation, &mut writer)?;
    writer.flush()?;
    Ok(())
}

pub fn encode_preview<W: Write>(animation: &CaffAnimation, writer: W) -> Result<(), Box<dyn Error>> {
    let width = u32::try_from(animation.width())
        .map_err(|_| format!("width {} is too large for a GIF", animation.width()))?;
    let height = u32::try_from(animation.height())
        .map_err(|_| format!("height {} is too large for a GIF", animation.height()))?;

    let mut encoder = GifEncoder::new(writer);
    encoder.set_repeat(Repeat::Infinite)?;

    for (idx, frame) in animation.frames().iter().enumerate() {
        // CIFF has no alpha channel; decoded pixels carry alpha 0
        let rgba = frame
            .image()
            .pixels()
            .iter()
            .flat_map(|p| p.opaque().to_rgba())
            .collect();
        let buffer = RgbaImage::from_raw(width, height, rgba)
            .ok_or("frame buffer does not match the animation size")?;

        let centis = delay_centis(frame.duration_ms());
        let delay = Delay::from_numer_denom_ms(u32::from(centis) * 10, 1);
        encoder.encode_frame(Frame::from_parts(buffer, 0, 0, delay))?;
        debug!(frame = idx + 1, delay = centis, "encoded preview frame");
    }
    Ok(())
}
