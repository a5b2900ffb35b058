//! Font loading for the report renderer.
//!
//! `genpdf` embeds TrueType fonts, so a font family has to be found on disk before anything can be
//! rendered.  The bundled Roboto family is searched first, in this order:
//!
//! 1. the directory named by `CHAMPION_REPORT_FONTS_DIR`,
//! 2. `assets/fonts` next to the running executable,
//! 3. `assets/fonts` in the crate manifest directory.
//!
//! When none of them holds the four Roboto files, common system families (DejaVu Sans, Liberation
//! Sans, Arial) are tried and a warning names the family that was picked.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory with the bundled font files.
pub const FONTS_DIR_ENV: &str = "CHAMPION_REPORT_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

/// A font family installed by the operating system.
struct SystemFontFamily {
    name: &'static str,
    directories: &'static [&'static str],
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const SYSTEM_FAMILIES: &[SystemFontFamily] = &[
    SystemFontFamily {
        name: "DejaVu Sans",
        directories: &[
            "/usr/share/fonts/truetype/dejavu",
            "/usr/share/fonts/dejavu",
            "/usr/share/fonts/TTF",
        ],
        regular: "DejaVuSans.ttf",
        bold: "DejaVuSans-Bold.ttf",
        italic: "DejaVuSans-Oblique.ttf",
        bold_italic: "DejaVuSans-BoldOblique.ttf",
    },
    SystemFontFamily {
        name: "Liberation Sans",
        directories: &[
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/truetype/liberation2",
            "/usr/share/fonts/liberation",
        ],
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    SystemFontFamily {
        name: "Arial",
        directories: &[
            "C:\\Windows\\Fonts",
            "/Library/Fonts",
            "/System/Library/Fonts/Supplemental",
        ],
        regular: "arial.ttf",
        bold: "arialbd.ttf",
        italic: "ariali.ttf",
        bold_italic: "arialbi.ttf",
    },
];

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env_path(FONTS_DIR_ENV) {
        candidates.push(path);
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            let candidate = bin_dir.join("assets/fonts");
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    if !candidates.contains(&manifest_candidate) {
        candidates.push(manifest_candidate);
    }

    candidates
}

fn missing_font_files(path: &Path) -> Vec<PathBuf> {
    FONT_FILES
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory() -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        let exists = candidate.is_dir();
        let missing = missing_font_files(&candidate);

        if exists && missing.is_empty() {
            return Ok(candidate);
        }

        let reason = if !exists {
            format!("directory missing at {}", candidate.display())
        } else {
            let missing_list = missing
                .iter()
                .map(|path| path.file_name().unwrap_or_default().to_string_lossy())
                .collect::<Vec<_>>()
                .join(", ");
            format!("missing files [{}]", missing_list)
        };

        attempts.push(format!("{} ({})", candidate.display(), reason));
    }

    Err(Error::new(
        format!(
            "Unable to locate bundled font directory. Checked: {}. Set {} to a directory holding the {} files.",
            attempts.join(", "),
            FONTS_DIR_ENV,
            DEFAULT_FONT_FAMILY_NAME
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_font_family() -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory()?;

    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        Error::new(
            format!(
                "Failed to load default font family '{}' from {}: {}",
                DEFAULT_FONT_FAMILY_NAME,
                directory.display(),
                err
            ),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

fn load_font(path: &Path, family: &str) -> Result<FontData, Error> {
    FontData::load(path, None).map_err(|err| {
        Error::new(
            format!("Failed to load {} font at {}: {}", family, path.display(), err),
            io::Error::new(io::ErrorKind::Other, err.to_string()),
        )
    })
}

impl SystemFontFamily {
    fn files(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }

    fn locate(&self) -> Option<PathBuf> {
        self.directories
            .iter()
            .map(PathBuf::from)
            .find(|directory| self.files().iter().all(|file| directory.join(file).is_file()))
    }

    fn load(&self, directory: &Path) -> Result<FontFamily<FontData>, Error> {
        Ok(FontFamily {
            regular: load_font(&directory.join(self.regular), self.name)?,
            bold: load_font(&directory.join(self.bold), self.name)?,
            italic: load_font(&directory.join(self.italic), self.name)?,
            bold_italic: load_font(&directory.join(self.bold_italic), self.name)?,
        })
    }
}

fn system_font_family() -> Result<(&'static str, FontFamily<FontData>), Error> {
    for family in SYSTEM_FAMILIES {
        if let Some(directory) = family.locate() {
            debug!("Found {} fonts in {}", family.name, directory.display());
            return Ok((family.name, family.load(&directory)?));
        }
    }

    let names = SYSTEM_FAMILIES
        .iter()
        .map(|family| family.name)
        .collect::<Vec<_>>()
        .join(", ");
    Err(Error::new(
        format!("No system fallback font family found (tried {})", names),
        io::Error::new(io::ErrorKind::NotFound, "system fonts not found"),
    ))
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the bundled Roboto family, falling back to an installed system family when the bundled
/// files are missing.
pub fn default_font_family() -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family() {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => match system_font_family() {
            Ok((name, family)) => {
                warn!(
                    "Bundled fonts unavailable ({}); falling back to system '{}' family.",
                    err, name
                );
                Ok(family)
            }
            Err(fallback_err) => Err(Error::new(
                format!(
                    "Bundled fonts unavailable ({}) and system fallback failed: {}",
                    err, fallback_err
                ),
                io::Error::new(io::ErrorKind::NotFound, "default fonts are not available"),
            )),
        },
        Err(err) => Err(err),
    }
}

/// Indicates whether any usable font family (bundled or system) can be found on disk.
pub fn default_fonts_available() -> bool {
    resolve_font_directory().is_ok()
        || SYSTEM_FAMILIES
            .iter()
            .any(|family| family.locate().is_some())
}
