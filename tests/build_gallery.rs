//! End-to-end builds with the pure-Rust backend on synthetic images.
//!
//! Images are generated into a temp dir, mirrored, and the written files are
//! inspected with `image::image_dimensions`.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use photo_mirror::config::{GallerySettings, load_config};
use photo_mirror::process::{Gallery, ProcessConfig, ProcessEvent};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let file = fs::File::create(path).unwrap();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(file, 90))
        .unwrap();
}

fn dims(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

struct Tree {
    _tmp: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn tree() -> Tree {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("photos");
    let output = tmp.path().join("web");
    write_jpeg(&input.join("landscape.jpg"), 800, 600);
    write_jpeg(&input.join("trip/portrait.JPG"), 600, 800);
    fs::write(input.join("trip/album_description"), "Road trip").unwrap();
    fs::write(input.join("trip/notes.txt"), "not an image").unwrap();
    Tree {
        _tmp: tmp,
        input,
        output,
    }
}

fn settings(edit: impl FnOnce(&mut GallerySettings)) -> ProcessConfig {
    let mut settings = GallerySettings::default();
    settings.images.target_size = [400, 300];
    settings.thumbnails.size = [100, 75];
    edit(&mut settings);
    ProcessConfig::from_settings(&settings)
}

#[test]
fn mirrors_tree_with_oriented_sizes() {
    let t = tree();
    let summary = Gallery::new(settings(|_| {}), &t.input)
        .build(&t.output, false)
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);

    assert_eq!(dims(&t.output.join("landscape.jpg")), (400, 300));
    assert_eq!(dims(&t.output.join("thumbnails/landscape.jpg")), (100, 75));
    assert_eq!(dims(&t.output.join("trip/portrait.JPG")), (300, 400));
    assert_eq!(dims(&t.output.join("trip/thumbnails/portrait.JPG")), (75, 100));

    assert_eq!(
        fs::read_to_string(t.output.join("trip/album_description")).unwrap(),
        "Road trip"
    );
    assert!(!t.output.join("trip/notes.txt").exists());
}

#[test]
fn square_thumbnails_and_big_images() {
    let t = tree();
    let config = settings(|s| {
        s.thumbnails.square = true;
        s.thumbnails.prefix = "tn_".into();
        s.big_images.enabled = true;
    });

    Gallery::new(config, &t.input).build(&t.output, false).unwrap();

    assert_eq!(dims(&t.output.join("thumbnails/tn_landscape.jpg")), (100, 100));
    assert_eq!(dims(&t.output.join("trip/thumbnails/tn_portrait.JPG")), (100, 100));
    assert_eq!(dims(&t.output.join("original/landscape.jpg")), (800, 600));
    assert_eq!(dims(&t.output.join("trip/original/portrait.JPG")), (600, 800));
}

#[test]
fn second_build_skips_everything() {
    let t = tree();
    let gallery = Gallery::new(settings(|_| {}), &t.input);
    gallery.build(&t.output, false).unwrap();
    let before = fs::read(t.output.join("landscape.jpg")).unwrap();

    let summary = gallery.build(&t.output, false).unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(fs::read(t.output.join("landscape.jpg")).unwrap(), before);
}

#[test]
fn missing_thumbnail_is_rebuilt() {
    let t = tree();
    let gallery = Gallery::new(settings(|_| {}), &t.input);
    gallery.build(&t.output, false).unwrap();
    fs::remove_file(t.output.join("thumbnails/landscape.jpg")).unwrap();

    let summary = gallery.build(&t.output, false).unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(dims(&t.output.join("thumbnails/landscape.jpg")), (100, 75));
}

#[test]
fn corrupt_image_does_not_stop_build() {
    let t = tree();
    fs::write(t.input.join("broken.jpg"), b"not really a jpeg").unwrap();

    let (tx, rx) = mpsc::channel();
    let summary = Gallery::new(settings(|_| {}), &t.input)
        .with_events(tx)
        .build(&t.output, false)
        .unwrap();
    let events: Vec<ProcessEvent> = rx.into_iter().collect();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 2);
    assert!(!t.output.join("broken.jpg").exists());
    assert!(events.iter().any(|e| matches!(
        e,
        ProcessEvent::ImageFailed { filename, .. } if filename == "broken.jpg"
    )));
}

#[test]
fn copyright_overlay_changes_pixels() {
    let t = tree();
    let plain_out = t.output.join("plain");
    let marked_out = t.output.join("marked");
    Gallery::new(settings(|_| {}), &t.input)
        .build(&plain_out, false)
        .unwrap();
    Gallery::new(settings(|s| s.images.copyright = "Jane".into()), &t.input)
        .build(&marked_out, false)
        .unwrap();

    let plain = image::open(plain_out.join("landscape.jpg")).unwrap().to_rgb8();
    let marked = image::open(marked_out.join("landscape.jpg")).unwrap().to_rgb8();
    assert_eq!(plain.dimensions(), marked.dimensions());

    // The text sits at (5, h - 15); compare the band it occupies
    let band_differs = (285..293)
        .flat_map(|y| (5..60).map(move |x| (x, y)))
        .any(|(x, y)| plain.get_pixel(x, y) != marked.get_pixel(x, y));
    assert!(band_differs);
}

#[test]
fn config_file_in_input_is_honored() {
    let t = tree();
    fs::write(
        t.input.join("config.toml"),
        r#"
[images]
target_size = [200, 150]

[thumbnails]
dir = "small"
"#,
    )
    .unwrap();

    let settings = load_config(&t.input).unwrap();
    Gallery::new(ProcessConfig::from_settings(&settings), &t.input)
        .build(&t.output, false)
        .unwrap();

    assert_eq!(dims(&t.output.join("landscape.jpg")), (200, 150));
    assert!(t.output.join("small/landscape.jpg").exists());
    assert!(!t.output.join("config.toml").exists());
}
