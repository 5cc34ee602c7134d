//! Both execution strategies against the same inputs.

#![allow(clippy::unwrap_used, clippy::cast_possible_truncation)]

use pano_pipeline::{
    ErrorKind, InlineNormalizer, NormalizeConfig, NormalizeError, Normalizer, OffloadedNormalizer,
    ResampleFilter, RoundingMode,
};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 251) as u8, (y % 241) as u8, 128])
    });
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )
    .unwrap();
    buf
}

fn strategies() -> Vec<Box<dyn Normalizer>> {
    vec![
        Box::new(InlineNormalizer),
        Box::new(OffloadedNormalizer::spawn().unwrap()),
    ]
}

#[test]
fn strategies_agree_on_geometry() {
    let config = NormalizeConfig::default();
    for (w, h) in [(400, 100), (100, 400), (160, 120), (210, 100), (3, 1000)] {
        let bytes = png_bytes(w, h);
        let results: Vec<_> = strategies()
            .iter()
            .map(|s| s.normalize(bytes.clone(), &config).unwrap())
            .collect();
        let (inline, offloaded) = (&results[0], &results[1]);
        assert_eq!(inline.geometry.pano_width, offloaded.geometry.pano_width, "{w}x{h}");
        assert_eq!(inline.geometry.pano_height, offloaded.geometry.pano_height, "{w}x{h}");
        assert_eq!(
            inline.geometry.aspect_ratio.to_bits(),
            offloaded.geometry.aspect_ratio.to_bits(),
            "{w}x{h}"
        );
        assert_eq!(inline.analysis, offloaded.analysis, "{w}x{h}");
        assert_eq!(inline.stretched, offloaded.stretched, "{w}x{h}");
        assert_eq!(inline.image.dimensions(), offloaded.image.dimensions(), "{w}x{h}");
    }
}

#[test]
fn strategies_report_decode_failure_identically() {
    let config = NormalizeConfig::default();
    let errors: Vec<NormalizeError> = strategies()
        .iter()
        .map(|s| s.normalize(b"definitely not an image".to_vec(), &config).unwrap_err())
        .collect();
    assert_eq!(errors[0], errors[1]);
    assert_eq!(errors[0].kind(), ErrorKind::Decode);
}

#[test]
fn strategies_report_empty_input_identically() {
    let config = NormalizeConfig::default();
    for strategy in strategies() {
        assert_eq!(
            strategy.normalize(Vec::new(), &config),
            Err(NormalizeError::EmptyInput)
        );
    }
}

/// `8192 × 2049` puts the wide-branch height exactly on `1024.5`.
#[test]
fn strategies_honor_configured_rounding_at_ties() {
    let bytes = png_bytes(8192, 2049);
    for (rounding, expected_height) in [
        (RoundingMode::HalfAwayFromZero, 1025),
        (RoundingMode::HalfToEven, 1024),
    ] {
        let config = NormalizeConfig {
            rounding,
            resample_filter: ResampleFilter::Nearest,
            jpeg_quality: 50,
            ..NormalizeConfig::default()
        };
        for strategy in strategies() {
            let result = strategy.normalize(bytes.clone(), &config).unwrap();
            assert_eq!(result.geometry.pano_width, 4096);
            assert_eq!(
                result.geometry.pano_height, expected_height,
                "{rounding:?} via {}",
                strategy.kind()
            );
            assert_eq!(result.image.height, expected_height);
        }
    }
}

#[test]
fn many_offloaded_requests_resolve_out_of_order() {
    let offloaded = OffloadedNormalizer::spawn().unwrap();
    let config = NormalizeConfig::default();
    let tickets: Vec<_> = (1..=4)
        .map(|i| (i * 10, offloaded.submit(png_bytes(i * 10, 10), &config)))
        .collect();
    for (width, ticket) in tickets.into_iter().rev() {
        assert_eq!(ticket.wait().unwrap().analysis.width, width);
    }
}
