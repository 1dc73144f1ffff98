// photo-prep/src/processors/metadata.rs
use exif::{In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

pub const ORIENTATION_NORMAL: u32 = 1;

/// Reads the EXIF orientation of encoded image bytes and applies it to pixels.
pub struct MetadataProcessor;

impl MetadataProcessor {
    pub fn new() -> Self {
        Self
    }

    /// EXIF orientation (1-8) of `bytes`, or `None` when there is no usable tag.
    pub fn read_orientation(&self, bytes: &[u8]) -> Option<u32> {
        let mut cursor = Cursor::new(bytes);
        let exif = match Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => exif,
            Err(exif::Error::NotFound(_)) => return None,
            Err(e) => {
                log::debug!("Ignoring unreadable EXIF block: {}", e);
                return None;
            }
        };

        exif.get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .filter(|value| (1..=8).contains(value))
    }

    pub fn apply_orientation(&self, image: DynamicImage, orientation: u32) -> DynamicImage {
        match orientation {
            2 => image.fliph(),
            3 => image.rotate180(),
            4 => image.flipv(),
            5 => image.rotate90().fliph(),
            6 => image.rotate90(),
            7 => image.rotate270().fliph(),
            8 => image.rotate270(),
            _ => image,
        }
    }
}

impl Default for MetadataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts an APP1 Exif segment holding only `orientation` right after the
/// SOI marker of `jpeg`.
#[cfg(test)]
pub(crate) fn with_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    // big-endian TIFF header, first IFD at offset 8
    payload.extend_from_slice(b"MM\0\x2A");
    payload.extend_from_slice(&8u32.to_be_bytes());
    // one entry: Orientation, SHORT, count 1
    payload.extend_from_slice(&1u16.to_be_bytes());
    payload.extend_from_slice(&0x0112u16.to_be_bytes());
    payload.extend_from_slice(&3u16.to_be_bytes());
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&orientation.to_be_bytes());
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&0u32.to_be_bytes());

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn marked_image() -> DynamicImage {
        // 2x1, red on the left
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn quarter_turns_swap_dimensions() {
        let processor = MetadataProcessor::new();
        for orientation in 5..=8 {
            let rotated = processor.apply_orientation(marked_image(), orientation);
            assert_eq!((rotated.width(), rotated.height()), (1, 2));
        }
    }

    #[test]
    fn mirror_moves_pixels() {
        let processor = MetadataProcessor::new();
        let flipped = processor.apply_orientation(marked_image(), 2).to_rgb8();
        assert_eq!(flipped.get_pixel(0, 0), &Rgb([0, 0, 255]));

        let untouched = processor.apply_orientation(marked_image(), ORIENTATION_NORMAL).to_rgb8();
        assert_eq!(untouched.get_pixel(0, 0), &Rgb([255, 0, 0]));
    }

    #[test]
    fn no_orientation_in_plain_bytes() {
        let processor = MetadataProcessor::new();
        assert_eq!(processor.read_orientation(b"not an image"), None);

        let mut png = Vec::new();
        marked_image()
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert_eq!(processor.read_orientation(&png), None);
    }

    #[test]
    fn reads_orientation_from_exif_segment() {
        let mut jpeg = Vec::new();
        marked_image()
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let processor = MetadataProcessor::new();
        assert_eq!(processor.read_orientation(&jpeg), None);
        for orientation in [3u16, 6, 8] {
            let tagged = with_orientation(&jpeg, orientation);
            assert_eq!(processor.read_orientation(&tagged), Some(orientation as u32));
        }
        // out of range values are ignored
        assert_eq!(processor.read_orientation(&with_orientation(&jpeg, 9)), None);
    }
}
