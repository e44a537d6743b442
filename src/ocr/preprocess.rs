use image::{GrayImage, Luma, RgbaImage};

/// Converts a crop into the grayscale image handed to the OCR engine.
///
/// With a threshold, pixels whose luminance is above it become white
/// (paper) and everything else black (ink). Without one the plain
/// grayscale image is returned and binarization is left to the engine.
pub fn prepare_for_ocr(img: &RgbaImage, threshold: Option<u8>) -> GrayImage {
    let gray = image::imageops::grayscale(img);
    match threshold {
        Some(t) => binarize(&gray, t),
        None => gray,
    }
}

/// Binarizes a grayscale image: luminance > threshold → white, else black.
///
/// Recommended thresholds:
/// - Printed pages in good light: 140
/// - Glossy or dim pages: 100
pub fn binarize(img: &GrayImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel[0] > threshold { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}
