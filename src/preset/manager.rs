use super::Preset;
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory-backed preset store: one JSON file per preset, kept sorted by
/// name in memory. Files that fail to parse are skipped with a warning so
/// one bad hand-edit never hides the rest.
pub struct Manager {
    presets_dir: PathBuf,
    presets: Vec<Preset>,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(presets_dir: P) -> Result<Self> {
        let presets_dir = presets_dir.as_ref().to_path_buf();
        fs::create_dir_all(&presets_dir).context("Failed to create presets directory")?;

        let mut manager = Self {
            presets_dir,
            presets: Vec::new(),
        };

        manager.reload()?;

        Ok(manager)
    }

    pub fn reload(&mut self) -> Result<()> {
        self.presets.clear();

        for entry in fs::read_dir(&self.presets_dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match load_preset_file(&path) {
                Ok(preset) => self.presets.push(preset),
                Err(e) => {
                    warn!("Skipping preset {}: {e}", path.display());
                }
            }
        }

        self.presets.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(())
    }

    pub fn save(&mut self, preset: &Preset) -> Result<()> {
        let path = self.preset_path(&preset.name);

        let json = serde_json::to_string_pretty(preset).context("Failed to serialize preset")?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write preset file {}", path.display()))?;

        // Pick up the new or updated file.
        self.reload()
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        let path = self.preset_path(name);

        if !path.exists() {
            anyhow::bail!("Preset not found: {name}");
        }

        fs::remove_file(&path).context("Failed to delete preset file")?;
        self.reload()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.presets.iter().any(|p| p.name == name)
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name == name)
    }

    fn preset_path(&self, name: &str) -> PathBuf {
        self.presets_dir
            .join(format!("{}.json", sanitize_filename(name)))
    }
}

fn load_preset_file(path: &Path) -> Result<Preset> {
    let content = fs::read_to_string(path).context("Failed to read preset file")?;
    serde_json::from_str(&content).context("Failed to parse preset JSON")
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetParams;
    use tempfile::TempDir;

    fn preset(name: &str, ratio: f32) -> Preset {
        Preset::new(
            name,
            PresetParams {
                ratio,
                ..PresetParams::default()
            },
        )
    }

    #[test]
    fn save_load_delete_cycle() -> Result<()> {
        let dir = TempDir::new()?;
        let mut manager = Manager::new(dir.path())?;
        assert!(manager.presets().is_empty());

        manager.save(&preset("Vocal Bus", 3.0))?;
        manager.save(&preset("Drum Bus", 8.0))?;

        // Sorted by name, values intact.
        let names: Vec<_> = manager.presets().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Drum Bus", "Vocal Bus"]);
        assert_eq!(manager.get("Drum Bus").unwrap().params.ratio, 8.0);

        manager.delete("Vocal Bus")?;
        assert!(!manager.exists("Vocal Bus"));
        assert!(manager.exists("Drum Bus"));

        assert!(manager.delete("Vocal Bus").is_err());

        Ok(())
    }

    #[test]
    fn reload_survives_a_corrupt_file() -> Result<()> {
        let dir = TempDir::new()?;
        let mut manager = Manager::new(dir.path())?;
        manager.save(&preset("Good", 4.0))?;

        std::fs::write(dir.path().join("bad.json"), "{ not json")?;
        manager.reload()?;

        assert_eq!(manager.presets().len(), 1);
        assert!(manager.exists("Good"));

        Ok(())
    }

    #[test]
    fn filenames_are_sanitized() -> Result<()> {
        let dir = TempDir::new()?;
        let mut manager = Manager::new(dir.path())?;
        manager.save(&preset("My / Weird: Name", 2.0))?;

        assert!(dir.path().join("My___Weird__Name.json").exists());
        assert!(manager.exists("My / Weird: Name"));

        Ok(())
    }
}
