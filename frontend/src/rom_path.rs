//! ROM directory resolution: loads the four Space Invaders program ROMs
//! from a directory of loose files.

use invaders_machine::rom_loader::{RomLoadError, RomSet};
use std::path::Path;

/// Load all files under `dir` into a [`RomSet`].
pub fn load_rom_set(dir: &Path) -> Result<RomSet, RomLoadError> {
    if !dir.is_dir() {
        return Err(RomLoadError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("ROM directory not found: {}", dir.display()),
        )));
    }
    RomSet::from_directory(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_loose_files_from_a_directory() {
        let dir = std::env::temp_dir().join("invaders_rom_path_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("invaders.h"), [0xAA; 4]).unwrap();

        let rom_set = load_rom_set(&dir).unwrap();
        assert_eq!(rom_set.get("invaders.h"), Some(&[0xAA; 4][..]));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = std::env::temp_dir().join("invaders_rom_path_missing");
        let _ = std::fs::remove_dir_all(&dir);
        assert!(load_rom_set(&dir).is_err());
    }
}
