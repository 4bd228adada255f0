//! Discovery of background templates and logos on disk
//!
//! Backgrounds live in `<dir>/<type>/<variation>.png`, logos in
//! `<dir>/<name>.png`. Optional filters restrict what is picked up; filter
//! entries that match nothing are reported and ignored.

use crate::overlay::{Background, Logo};
use anyhow::{bail, Context, Result};
use log::warn;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::{self, File},
    path::Path,
};

const PNG_SUFFIX: &str = ".png";

/// Split repeated comma separated filter arguments into a set of names.
pub fn parse_filter_list<S: AsRef<str>>(values: &[S]) -> BTreeSet<String> {
    values
        .iter()
        .flat_map(|value| value.as_ref().split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn add_png(name: &str) -> String {
    if name.ends_with(PNG_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{PNG_SUFFIX}")
    }
}

fn remove_png(name: &str) -> &str {
    name.strip_suffix(PNG_SUFFIX).unwrap_or(name)
}

fn check_directory(dir: &Path, label: &str) -> Result<()> {
    if !dir.is_dir() {
        bail!("{label} directory {} not found", dir.display());
    }
    fs::read_dir(dir).with_context(|| format!("{label} directory {} not readable", dir.display()))?;
    Ok(())
}

fn is_readable_dir(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok()
}

fn is_readable_file(path: &Path) -> bool {
    File::open(path).is_ok()
}

/// Names of the entries of `dir` accepted by `keep`, sorted.
fn list_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<BTreeSet<String>> {
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if !keep(&entry.path()) {
            continue;
        }
        // Names that are not valid UTF-8 cannot be requested nor written back
        match entry.file_name().to_str() {
            Some(name) => {
                names.insert(name.to_string());
            }
            None => warn!(
                "Ignoring {}, its name is not valid UTF-8",
                entry.path().display()
            ),
        }
    }
    Ok(names)
}

/// Find the background templates below `background_dir`.
///
/// Empty filter sets select everything that was detected.
pub fn find_backgrounds(
    background_dir: &Path,
    requested_types: &BTreeSet<String>,
    requested_variations: &BTreeSet<String>,
) -> Result<Vec<Background>> {
    check_directory(background_dir, "Background")?;

    let detected_types = list_entries(background_dir, Path::is_dir)?;
    let types: Vec<String> = if requested_types.is_empty() {
        detected_types.into_iter().collect()
    } else {
        requested_types
            .iter()
            .filter(|kind| {
                let found = detected_types.contains(*kind)
                    && is_readable_dir(&background_dir.join(kind));
                if !found {
                    warn!("Background type {kind} not found or readable, ignoring");
                }
                found
            })
            .cloned()
            .collect()
    };
    if types.is_empty() {
        bail!("No valid background types found");
    }

    let requested_variations: BTreeSet<&str> =
        requested_variations.iter().map(|v| remove_png(v)).collect();

    let mut backgrounds_by_type: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for kind in types {
        let type_dir = background_dir.join(&kind);
        let detected_variations: BTreeSet<String> =
            list_entries(&type_dir, |path| path.is_file())?
                .iter()
                .filter(|name| name.ends_with(PNG_SUFFIX))
                .map(|name| remove_png(name).to_string())
                .collect();

        let variations: Vec<String> = if requested_variations.is_empty() {
            detected_variations.into_iter().collect()
        } else {
            requested_variations
                .iter()
                .filter(|variation| {
                    let found = detected_variations.contains(**variation)
                        && is_readable_file(&type_dir.join(add_png(variation)));
                    if !found {
                        warn!(
                            "Background variation {variation} for background type {kind} not found or readable, ignoring"
                        );
                    }
                    found
                })
                .map(|variation| variation.to_string())
                .collect()
        };

        if variations.is_empty() {
            warn!("No valid background variations found for background type {kind}, ignoring");
            continue;
        }
        backgrounds_by_type.insert(kind, variations);
    }
    if backgrounds_by_type.is_empty() {
        bail!("No valid backgrounds found");
    }

    Ok(backgrounds_by_type
        .iter()
        .flat_map(|(kind, variations)| {
            variations.iter().map(move |variation| {
                let path = background_dir.join(kind).join(add_png(variation));
                Background::new(path, kind, variation)
            })
        })
        .collect())
}

/// Find the logos in `logo_dir`. Symbolic links are skipped.
pub fn find_logos(logo_dir: &Path, requested_logos: &BTreeSet<String>) -> Result<Vec<Logo>> {
    check_directory(logo_dir, "Logo")?;

    let detected_logos = list_entries(logo_dir, |path| !path.is_symlink() && path.is_file())?
        .into_iter()
        .filter(|name| name.ends_with(PNG_SUFFIX))
        .collect::<BTreeSet<String>>();

    let logos: BTreeSet<String> = if requested_logos.is_empty() {
        detected_logos
    } else {
        requested_logos
            .iter()
            .map(|logo| add_png(logo))
            .filter(|logo| {
                let found =
                    detected_logos.contains(logo) && is_readable_file(&logo_dir.join(logo));
                if !found {
                    warn!("Logo {logo} not found or readable, ignoring");
                }
                found
            })
            .collect()
    };
    if logos.is_empty() {
        bail!("No valid logos found");
    }

    Ok(logos
        .iter()
        .map(|logo| Logo::new(logo_dir.join(logo)))
        .collect())
}
