//! Predefined thought seeds, compiled in, plus load/save for user presets.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::schema::ThoughtSeed;

const BUILTIN_SEEDS: &[(&str, &str)] = &[
    ("reflective", include_str!("presets/reflective.toml")),
    ("interpretive", include_str!("presets/interpretive.toml")),
    ("questioning", include_str!("presets/questioning.toml")),
];

/// Names of the built-in seed presets.
pub fn available_seeds() -> Vec<&'static str> {
    BUILTIN_SEEDS.iter().map(|(name, _)| *name).collect()
}

/// Load a built-in seed preset by name.
pub fn load_seed(name: &str) -> Option<ThoughtSeed> {
    let (_, raw) = BUILTIN_SEEDS.iter().find(|(seed, _)| *seed == name)?;
    match toml::from_str(raw) {
        Ok(seed) => Some(seed),
        Err(e) => {
            tracing::error!("built-in seed preset '{}' failed to parse: {}", name, e);
            None
        }
    }
}

/// Load a user-supplied seed preset `<dir>/<name>.toml`.
pub fn load_seed_from(dir: &Path, name: &str) -> Result<ThoughtSeed> {
    let path = dir.join(format!("{name}.toml"));
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read seed preset from {:?}", path))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse seed preset {:?}", path))
}

/// Save a seed preset as `<dir>/<name>.toml`, creating the directory if
/// needed.
pub fn save_seed(dir: &Path, name: &str, seed: &ThoughtSeed) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create preset directory {:?}", dir))?;
    let path = dir.join(format!("{name}.toml"));
    let toml_string = toml::to_string_pretty(seed).context("Failed to serialize seed preset")?;
    fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write seed preset to {:?}", path))?;
    Ok(())
}
