use super::types::{KolProfile, ProfileFile, PROFILE_FILE_VERSION};
use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Read/write access to KOL profile rows.
pub trait ProfileStore {
    fn load_profiles(&self) -> Result<Vec<KolProfile>>;

    fn get_profile(&self, id: &str) -> Result<Option<KolProfile>> {
        Ok(self.load_profiles()?.into_iter().find(|p| p.id == id))
    }

    fn upsert_profile(&self, profile: KolProfile) -> Result<()>;
}

/// Get the default profile file path (~/.config/kol-board/profiles.json)
pub fn get_profiles_path() -> Result<PathBuf> {
    Ok(crate::config::get_config_dir()?.join("profiles.json"))
}

/// Load the profile document from a JSON file
///
/// If the file doesn't exist, returns a new empty document.
/// If the file exists but has an unsupported version, returns an error.
pub fn load_profile_file(path: &Path) -> Result<ProfileFile> {
    if !path.exists() {
        return Ok(ProfileFile::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open profile file at {}", path.display()))?;

    let document: ProfileFile = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse profile file at {}", path.display()))?;

    if document.version != PROFILE_FILE_VERSION {
        anyhow::bail!("Unsupported profile file version: {}", document.version);
    }

    Ok(document)
}

/// Save the profile document atomically
///
/// Creates the parent directory if it doesn't exist.
pub fn save_profile_file(path: &Path, document: &ProfileFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut file, document)
        .context("Failed to serialize profiles")?;

    file.commit().context("Failed to save profiles")?;

    Ok(())
}

/// Profile store backed by a single JSON document
#[derive(Debug, Clone)]
pub struct JsonProfileStore {
    path: PathBuf,
}

impl JsonProfileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for JsonProfileStore {
    fn load_profiles(&self) -> Result<Vec<KolProfile>> {
        Ok(load_profile_file(&self.path)?.profiles)
    }

    fn get_profile(&self, id: &str) -> Result<Option<KolProfile>> {
        Ok(load_profile_file(&self.path)?.get(id).cloned())
    }

    fn upsert_profile(&self, profile: KolProfile) -> Result<()> {
        let mut document = load_profile_file(&self.path)?;
        let id = profile.id.clone();
        let replaced = document.upsert(profile);
        save_profile_file(&self.path, &document)?;
        tracing::debug!(id = %id, replaced, path = %self.path.display(), "profile saved");
        Ok(())
    }
}
