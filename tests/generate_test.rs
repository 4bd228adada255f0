use image::{Rgba, RgbaImage};
use picon_gen::overlay::{Background, Logo};
use picon_gen::{generate_picons, Config, GenerationReport};
use std::fs;
use tempfile::TempDir;

const GREY: Rgba<u8> = Rgba([90, 90, 90, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

fn write_sources(root: &std::path::Path) -> Config {
    let background_dir = root.join("backgrounds");
    let logo_dir = root.join("picons");

    for (kind, variation) in [("classic", "default"), ("classic", "light"), ("Glass", "default")] {
        let dir = background_dir.join(kind);
        fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(100, 60, GREY)
            .save(dir.join(format!("{variation}.png")))
            .unwrap();
    }

    fs::create_dir_all(&logo_dir).unwrap();
    for name in ["one", "two"] {
        RgbaImage::from_pixel(30, 10, GREEN)
            .save(logo_dir.join(format!("{name}.png")))
            .unwrap();
    }

    Config {
        logo_dir,
        background_dir,
        out_dir: root.join("out"),
        ..Default::default()
    }
}

#[test]
fn test_generate_every_combination() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_sources(temp_dir.path());

    let report = generate_picons(&config).unwrap();
    assert_eq!(
        report,
        GenerationReport {
            total: 6,
            generated: 6,
            skipped: 0,
            failed: 0,
        }
    );

    for dir in [
        "picons-classic-default",
        "picons-classic-light",
        "picons-glass-default",
    ] {
        for logo in ["one.png", "two.png"] {
            let path = config.out_dir.join(dir).join(logo);
            let picon = image::open(&path).unwrap();
            assert_eq!((picon.width(), picon.height()), (100, 60));
        }
    }
}

#[test]
fn test_second_run_skips_everything() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_sources(temp_dir.path());
    generate_picons(&config).unwrap();

    // Age the logos so the picons are clearly newer
    let past = std::time::SystemTime::now() - std::time::Duration::from_secs(3600);
    for name in ["one.png", "two.png"] {
        fs::File::options()
            .write(true)
            .open(config.logo_dir.join(name))
            .unwrap()
            .set_modified(past)
            .unwrap();
    }

    let report = generate_picons(&config).unwrap();
    assert_eq!(report.skipped, 6);
    assert_eq!(report.generated, 0);

    let forced = Config {
        force: true,
        ..config.clone()
    };
    let report = generate_picons(&forced).unwrap();
    assert_eq!(report.generated, 6);
    assert_eq!(report.skipped, 0);
}

#[test]
fn test_filters_narrow_the_batch() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        background_types: vec!["classic".to_string()],
        background_variations: vec!["light,unknown".to_string()],
        logos: vec!["two".to_string()],
        ..write_sources(temp_dir.path())
    };

    let report = generate_picons(&config).unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.generated, 1);
    assert!(config
        .out_dir
        .join("picons-classic-light")
        .join("two.png")
        .exists());
    assert!(!config.out_dir.join("picons-classic-default").exists());
}

#[test]
fn test_merge_overlay_keeps_background_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_sources(temp_dir.path());

    let mut background = Background::new(
        config.background_dir.join("classic").join("default.png"),
        "classic",
        "default",
    );
    let mut one = Logo::new(config.logo_dir.join("one.png"));
    let mut two = Logo::new(config.logo_dir.join("two.png"));

    let first = background.merge_overlay(&mut one).unwrap();
    assert!(background.is_open());
    assert!(one.is_open());

    let second = background.merge_overlay(&mut two).unwrap();
    assert_eq!(first, second);

    // border = ceil(100 * 15 / 256) = 6, logo scales to 88x29 at (6, 16)
    assert_eq!(*first.get_pixel(5, 30), GREY);
    assert_eq!(*first.get_pixel(50, 15), GREY);
    assert!(first.get_pixel(50, 30)[1] > 200);

    background.close();
    one.close();
    assert!(!background.is_open());
    assert!(!one.is_open());
}
