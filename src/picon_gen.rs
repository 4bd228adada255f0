use crate::discovery::{find_backgrounds, find_logos, parse_filter_list};
use crate::overlay::{Background, Logo};
use crate::progress::ProgressBar;
use anyhow::{bail, Context, Result};
use image::{DynamicImage, RgbaImage};
use log::{info, warn};
use std::{
    fs::{self, create_dir_all},
    path::{Path, PathBuf},
};

pub const LOGO_DIR_DEFAULT: &str = "./picons";
pub const BACKGROUND_DIR_DEFAULT: &str = "./backgrounds";
pub const OUT_DIR_DEFAULT: &str = "./ocram-picons";

/// Settings for a picon generation run
#[derive(Debug, Clone)]
pub struct Config {
    pub logo_dir: PathBuf,
    pub background_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Comma separated background type filters, empty for all
    pub background_types: Vec<String>,
    /// Comma separated background variation filters, empty for all
    pub background_variations: Vec<String>,
    /// Comma separated logo filters, empty for all
    pub logos: Vec<String>,
    /// Regenerate picons even when they are newer than their logo
    pub force: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logo_dir: PathBuf::from(LOGO_DIR_DEFAULT),
            background_dir: PathBuf::from(BACKGROUND_DIR_DEFAULT),
            out_dir: PathBuf::from(OUT_DIR_DEFAULT),
            background_types: Vec::new(),
            background_variations: Vec::new(),
            logos: Vec::new(),
            force: false,
        }
    }
}

/// Outcome of a generation run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    pub total: u64,
    pub generated: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Generate a picon for every background and logo combination.
///
/// Problems with single picons are logged and skipped; missing inputs and
/// unwritable output directories abort the run.
pub fn generate_picons(config: &Config) -> Result<GenerationReport> {
    prepare_out_dir(&config.out_dir)?;

    let mut backgrounds = find_backgrounds(
        &config.background_dir,
        &parse_filter_list(&config.background_types),
        &parse_filter_list(&config.background_variations),
    )?;
    let mut logos = find_logos(&config.logo_dir, &parse_filter_list(&config.logos))?;

    let mut report = GenerationReport {
        total: (backgrounds.len() * logos.len()) as u64,
        ..Default::default()
    };
    info!(
        "Generating {} picons from {} backgrounds and {} logos",
        report.total,
        backgrounds.len(),
        logos.len()
    );

    let progress = ProgressBar::new("Processed picon", report.total);
    for background in backgrounds.iter_mut() {
        let picon_dir = config.out_dir.join(picon_dir_name(background));
        for logo in logos.iter_mut() {
            let Some(file_name) = logo.file_name() else {
                progress.inc(1);
                continue;
            };
            let picon_path = picon_dir.join(file_name);

            if !config.force && is_up_to_date(&picon_path, logo.path()) {
                report.skipped += 1;
                progress.inc(1);
                continue;
            }

            if !picon_dir.is_dir() {
                create_dir_all(&picon_dir).with_context(|| {
                    format!("Failed to create picons directory {}", picon_dir.display())
                })?;
            }

            match create_picon(background, logo, &picon_path) {
                Ok(()) => report.generated += 1,
                Err(err) => {
                    report.failed += 1;
                    progress.suspend(|| {
                        warn!(
                            "Failed to create picon {}: {:#}, skipping!",
                            picon_path.display(),
                            err
                        )
                    });
                }
            }
            logo.close();
            progress.inc(1);
        }
        background.close();
    }
    progress.finish();

    info!(
        "Generated {} picons, {} up to date, {} failed",
        report.generated, report.skipped, report.failed
    );
    Ok(report)
}

fn prepare_out_dir(out_dir: &Path) -> Result<()> {
    if !out_dir.is_dir() {
        create_dir_all(out_dir).with_context(|| {
            format!("Failed to create output directory {}", out_dir.display())
        })?;
    }
    // Mode bits alone miss ownership and ACLs
    if let Err(err) = tempfile::tempfile_in(out_dir) {
        bail!("Output directory {} not writable: {}", out_dir.display(), err);
    }
    Ok(())
}

fn create_picon(background: &mut Background, logo: &mut Logo, picon_path: &Path) -> Result<()> {
    let picon = background.merge_overlay(logo)?;
    save_png(picon, picon_path)
}

/// Name of the output directory for the picons of a background.
pub fn picon_dir_name(background: &Background) -> String {
    format!(
        "picons-{}-{}",
        background.kind().to_lowercase(),
        background.variation()
    )
}

/// Whether the picon exists and was modified after its source logo.
pub fn is_up_to_date(picon_path: &Path, logo_path: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();

    if !picon_path.is_file() {
        return false;
    }
    match (modified(picon_path), modified(logo_path)) {
        (Some(picon), Some(logo)) => picon > logo,
        _ => false,
    }
}

fn save_png(picon: RgbaImage, path: &Path) -> Result<()> {
    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create PNG file {}", path.display()))?;
    DynamicImage::ImageRgba8(picon)
        .write_to(&mut file, image::ImageOutputFormat::Png)
        .context("Failed to write PNG")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logo_dir, PathBuf::from("./picons"));
        assert_eq!(config.background_dir, PathBuf::from("./backgrounds"));
        assert_eq!(config.out_dir, PathBuf::from("./ocram-picons"));
        assert!(!config.force);
    }

    #[test]
    fn test_picon_dir_name() {
        let background = Background::new("bg/Reflection/dark-blue.png", "Reflection", "dark-blue");
        assert_eq!(picon_dir_name(&background), "picons-reflection-dark-blue");
    }

    #[test]
    fn test_is_up_to_date() {
        let dir = TempDir::new().unwrap();
        let logo = dir.path().join("logo.png");
        let picon = dir.path().join("picon.png");
        fs::write(&logo, b"logo").unwrap();

        assert!(!is_up_to_date(&picon, &logo));

        fs::write(&picon, b"picon").unwrap();
        let now = SystemTime::now();
        set_mtime(&logo, now - Duration::from_secs(3600));
        set_mtime(&picon, now);
        assert!(is_up_to_date(&picon, &logo));

        // Equal timestamps mean the logo may have changed
        set_mtime(&logo, now);
        assert!(!is_up_to_date(&picon, &logo));

        set_mtime(&logo, now + Duration::from_secs(3600));
        assert!(!is_up_to_date(&picon, &logo));
    }

    #[cfg(unix)]
    #[test]
    fn test_prepare_out_dir_rejects_read_only_directory() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("out");
        fs::create_dir(&out_dir).unwrap();
        fs::set_permissions(&out_dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users can write regardless of the mode bits
        let writable = fs::write(out_dir.join("check"), b"").is_ok();
        let result = prepare_out_dir(&out_dir);
        fs::set_permissions(&out_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            assert!(result.is_ok());
            return;
        }

        let err = result.unwrap_err().to_string();
        assert!(err.contains("not writable"), "unexpected error: {err}");
    }

    #[test]
    fn test_prepare_out_dir_creates_nested_directories() {
        let dir = TempDir::new().unwrap();
        let out_dir = dir.path().join("a").join("b");
        prepare_out_dir(&out_dir).unwrap();
        assert!(out_dir.is_dir());
    }
}
