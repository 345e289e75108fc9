//! CSS-equivalent image filters applied to decoded pixels before drawing.

use image::RgbaImage;
use meme_core::ImageFilter;

/// Blur radius of the `blur(5px)` filter, in document pixels.
pub const BLUR_RADIUS: f32 = 5.0;

/// Brightness/contrast factor of the `brightness(150%)` and
/// `contrast(150%)` filters.
const AMOUNT: f32 = 1.5;

/// Apply `filter` to straight-alpha RGBA pixels.
///
/// `draw_width` is the element width the image will be stretched to; the blur
/// radius is converted from document pixels into source pixels with it.
#[must_use]
pub fn apply(filter: ImageFilter, image: RgbaImage, draw_width: f32) -> RgbaImage {
    match filter {
        ImageFilter::None => image,
        ImageFilter::Blur => {
            #[allow(clippy::cast_precision_loss)]
            let source_width = image.width() as f32;
            let sigma = if draw_width > 0.0 {
                BLUR_RADIUS * source_width / draw_width
            } else {
                BLUR_RADIUS
            };
            image::imageops::blur(&image, sigma)
        }
        ImageFilter::Grayscale => map_rgb(image, |r, g, b| {
            let l = 0.0722f32.mul_add(b, 0.2126f32.mul_add(r, 0.7152 * g));
            (l, l, l)
        }),
        ImageFilter::Sepia => map_rgb(image, |r, g, b| {
            (
                0.189f32.mul_add(b, 0.393f32.mul_add(r, 0.769 * g)),
                0.168f32.mul_add(b, 0.349f32.mul_add(r, 0.686 * g)),
                0.131f32.mul_add(b, 0.272f32.mul_add(r, 0.534 * g)),
            )
        }),
        ImageFilter::Brightness => map_rgb(image, |r, g, b| (r * AMOUNT, g * AMOUNT, b * AMOUNT)),
        ImageFilter::Contrast => map_rgb(image, |r, g, b| {
            let c = |v: f32| (v - 127.5).mul_add(AMOUNT, 127.5);
            (c(r), c(g), c(b))
        }),
    }
}

fn map_rgb<F>(mut image: RgbaImage, f: F) -> RgbaImage
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32),
{
    for pixel in image.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let (r, g, b) = f(f32::from(r), f32::from(g), f32::from(b));
        pixel.0 = [channel(r), channel(g), channel(b), a];
    }
    image
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(r: u8, g: u8, b: u8) -> RgbaImage {
        RgbaImage::from_pixel(4, 4, Rgba([r, g, b, 200]))
    }

    #[test]
    fn test_none_is_identity() {
        let img = solid(10, 20, 30);
        assert_eq!(apply(ImageFilter::None, img.clone(), 4.0), img);
    }

    #[test]
    fn test_grayscale_equalises_channels() {
        let out = apply(ImageFilter::Grayscale, solid(255, 0, 0), 4.0);
        let [r, g, b, a] = out.get_pixel(0, 0).0;
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 54);
        assert_eq!(a, 200);
    }

    #[test]
    fn test_sepia_white_is_warm() {
        let out = apply(ImageFilter::Sepia, solid(255, 255, 255), 4.0);
        let [r, g, b, _] = out.get_pixel(1, 1).0;
        assert_eq!(r, 255);
        assert!(r >= g && g > b);
    }

    #[test]
    fn test_brightness_saturates() {
        let out = apply(ImageFilter::Brightness, solid(100, 200, 0), 4.0);
        assert_eq!(out.get_pixel(0, 0).0, [150, 255, 0, 200]);
    }

    #[test]
    fn test_contrast_pushes_away_from_mid() {
        let out = apply(ImageFilter::Contrast, solid(200, 128, 50), 4.0);
        let [r, g, b, _] = out.get_pixel(0, 0).0;
        assert!(r > 200);
        assert_eq!(g, 128);
        assert!(b < 50);
    }

    #[test]
    fn test_blur_spreads_edges() {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        for y in 0..20 {
            for x in 10..20 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let out = apply(ImageFilter::Blur, img, 20.0);
        let edge = out.get_pixel(9, 10).0[0];
        assert!(edge > 0 && edge < 255, "edge pixel {edge}");
    }
}
