#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::{Command, Output};

fn pano(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pano"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbImage::from_pixel(width, height, image::Rgb([90, 140, 200]))
        .save(path)
        .unwrap();
}

fn dims(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

#[test]
fn normalize_writes_stretched_canvas_and_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("wide.png");
    write_png(&input, 400, 100);
    let output = dir.path().join("out.jpg");

    let result = pano(&[
        "normalize",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--strategy",
        "inline",
        "--filter",
        "nearest",
        "--json",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(dims(&output), (4096, 1024));

    let report: serde_json::Value = serde_json::from_slice(&result.stdout).unwrap();
    assert_eq!(report["strategy"], "inline");
    assert_eq!(report["normalized"]["geometry"]["panoHeight"], 1024);
    assert_eq!(report["normalized"]["stretched"], true);
    assert_eq!(report["view"]["vaov"], 90.0);
    assert_eq!(report["diagnostics"].as_array().unwrap().len(), 1);
}

#[test]
fn normalize_passes_panoramas_through() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pano.png");
    write_png(&input, 400, 200);

    let result = pano(&["normalize", input.to_str().unwrap(), "--strategy", "offload"]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let output = dir.path().join("pano-pano.png");
    assert_eq!(std::fs::read(&output).unwrap(), std::fs::read(&input).unwrap());
    assert!(String::from_utf8_lossy(&result.stdout).contains("source passed through"));
}

#[test]
fn normalize_reports_undecodable_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.png");
    std::fs::write(&input, b"definitely not a png").unwrap();

    let result = pano(&["normalize", input.to_str().unwrap()]);
    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("failed to decode image"));
}

#[test]
fn compress_bounds_width_then_height() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("big.png");
    write_png(&input, 1000, 800);
    let output = dir.path().join("small.jpg");

    let result = pano(&[
        "compress",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--max-width",
        "500",
        "--max-height",
        "300",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(dims(&output), (375, 300));
}

#[test]
fn thumbnail_is_fixed_size() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tall.png");
    write_png(&input, 100, 400);

    let result = pano(&["thumbnail", input.to_str().unwrap()]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));
    assert_eq!(dims(&dir.path().join("tall-thumb.png")), (100, 50));
}

#[test]
fn tour_links_scenes_and_writes_saved_json() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("hall.png");
    let second = dir.path().join("yard.png");
    write_png(&first, 400, 200);
    write_png(&second, 300, 100);
    let output = dir.path().join("tour.json");

    let result = pano(&[
        "tour",
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--chain",
        "--filter",
        "nearest",
    ]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let json = std::fs::read_to_string(&output).unwrap();
    let saved = pano_tour::SavedTour::from_json(&json).unwrap();
    assert_eq!(saved.version, "1.0");
    assert!(humantime::parse_rfc3339(&saved.created_at).is_ok());

    let tour = pano_tour::Tour::from_saved(saved).unwrap();
    let ids: Vec<String> = tour.scene_ids().map(str::to_owned).collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(
        tour.directional_target(&ids[0], pano_tour::Direction::Forward),
        Some(ids[1].clone())
    );
    assert_eq!(
        tour.directional_target(&ids[1], pano_tour::Direction::Backward),
        Some(ids[0].clone())
    );

    let yard = tour.scene(&ids[1]).unwrap();
    assert_eq!(yard.title, "View 2");
    assert!(!yard.is_panorama);
    assert_eq!(dims(&dir.path().join(&yard.image)), (4096, 1365));
    assert_eq!(
        dims(&dir.path().join(yard.thumbnail.as_deref().unwrap())),
        (100, 50)
    );
}

#[test]
fn tour_thumbnail_is_drawn_from_the_stretched_canvas() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("photo.png");
    write_png(&photo, 160, 120);
    let output = dir.path().join("tour.json");

    let result = pano(&["tour", photo.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

    let json = std::fs::read_to_string(&output).unwrap();
    let saved = pano_tour::SavedTour::from_json(&json).unwrap();
    let scene = &saved.scenes[0];
    assert!(!scene.is_panorama);

    // The 4096x2048 canvas fills the whole 80x40 box at (10, 5).
    let tile = image::open(dir.path().join(scene.thumbnail.as_deref().unwrap()))
        .unwrap()
        .to_rgb8();
    for (x, y) in [(10, 5), (89, 5), (10, 44), (89, 44)] {
        assert!(tile.get_pixel(x, y).0[2] > 150, "({x}, {y}) should be image, not border");
    }
    assert_eq!(tile.get_pixel(5, 25).0, [0, 0, 0]);
}
