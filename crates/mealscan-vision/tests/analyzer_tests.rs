use std::io::Cursor;

use mealscan_core::config::{VisionBackend, VisionSettings};
use mealscan_core::types::RawSignal;
use mealscan_vision::caption::{image_seed, preprocess};
use mealscan_vision::get_default_analyzer;

#[tokio::test]
async fn fake_analyzer_echoes_text_as_caption() {
    let settings = VisionSettings { backend: VisionBackend::Fake, ..VisionSettings::default() };
    let analyzer = get_default_analyzer(&settings, &[]).expect("analyzer");

    let signal = analyzer.analyze(b"  A Bowl of RICE with egg\n").await.expect("analyze");

    assert_eq!(analyzer.name(), "fake");
    assert_eq!(signal, RawSignal::Caption("a bowl of rice with egg".into()));
}

#[test]
fn preprocess_produces_normalized_chw_tensor() {
    let img = image::RgbImage::from_pixel(20, 10, image::Rgb([255, 128, 0]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .expect("encode png");

    let tensor = preprocess(&png).expect("preprocess");
    assert_eq!(tensor.dims(), &[3, 384, 384]);
}

#[test]
fn preprocess_rejects_non_images() {
    assert!(preprocess(b"definitely not an image").is_err());
}

#[test]
fn image_seed_is_stable_per_image() {
    assert_eq!(image_seed(b"abc"), image_seed(b"abc"));
    assert_ne!(image_seed(b"abc"), image_seed(b"abd"));
}
