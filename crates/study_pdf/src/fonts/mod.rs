//! Font loading for the `study_pdf` crate.
//!
//! `genpdf` needs TrueType files for glyph metrics. The bundled Roboto family is searched first;
//! when it is missing, common system families are tried so a stock server can still render.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{self, FontData, FontFamily};
use log::warn;

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

/// Environment variable pointing at a directory with the bundled font files.
pub const FONTS_DIR_ENV: &str = "STUDY_PDF_FONTS_DIR";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

struct SystemFamily {
    name: &'static str,
    directories: &'static [&'static str],
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

const SYSTEM_FAMILIES: &[SystemFamily] = &[
    SystemFamily {
        name: "Liberation Sans",
        directories: &[
            "/usr/share/fonts/truetype/liberation",
            "/usr/share/fonts/truetype/liberation2",
            "/usr/share/fonts/liberation-sans",
            "/usr/share/fonts/liberation",
        ],
        regular: "LiberationSans-Regular.ttf",
        bold: "LiberationSans-Bold.ttf",
        italic: "LiberationSans-Italic.ttf",
        bold_italic: "LiberationSans-BoldItalic.ttf",
    },
    SystemFamily {
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
    SystemFamily {
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

fn font_directory_candidates(override_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = override_dir {
        candidates.push(dir.to_path_buf());
    }

    if let Ok(path) = env::var(FONTS_DIR_ENV) {
        if !path.trim().is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            candidates.push(bin_dir.join("assets/fonts"));
        }
    }

    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));
    candidates.dedup();
    candidates
}

fn missing_font_files(path: &Path) -> Vec<PathBuf> {
    FONT_FILES
        .iter()
        .map(|name| path.join(name))
        .filter(|candidate| !candidate.is_file())
        .collect()
}

fn resolve_font_directory(override_dir: Option<&Path>) -> Result<PathBuf, Error> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(override_dir) {
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
            "Unable to locate bundled font directory. Checked: {}. Set {} to a directory with the Roboto family.",
            attempts.join(", "),
            FONTS_DIR_ENV
        ),
        io::Error::new(io::ErrorKind::NotFound, "bundled fonts directory not found"),
    ))
}

fn load_bundled_font_family(override_dir: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let directory = resolve_font_directory(override_dir)?;

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

impl SystemFamily {
    fn directory(&self) -> Option<&'static Path> {
        let files = [self.regular, self.bold, self.italic, self.bold_italic];
        self.directories
            .iter()
            .map(Path::new)
            .find(|dir| files.iter().all(|file| dir.join(file).is_file()))
    }

    fn load(&self, directory: &Path) -> Result<FontFamily<FontData>, Error> {
        let load = |file: &str| {
            let path = directory.join(file);
            FontData::load(&path, None).map_err(|err| {
                Error::new(
                    format!("Failed to load {} font at {}: {}", self.name, path.display(), err),
                    io::Error::new(io::ErrorKind::Other, err.to_string()),
                )
            })
        };

        Ok(FontFamily {
            regular: load(self.regular)?,
            bold: load(self.bold)?,
            italic: load(self.italic)?,
            bold_italic: load(self.bold_italic)?,
        })
    }
}

fn system_font_family() -> Result<FontFamily<FontData>, Error> {
    let mut last_error = None;

    for family in SYSTEM_FAMILIES {
        let Some(directory) = family.directory() else {
            continue;
        };
        match family.load(directory) {
            Ok(loaded) => {
                warn!(
                    "Bundled fonts unavailable; using system '{}' family from {}",
                    family.name,
                    directory.display()
                );
                return Ok(loaded);
            }
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error.unwrap_or_else(|| {
        Error::new(
            "No system font family found",
            io::Error::new(io::ErrorKind::NotFound, "system fonts not found"),
        )
    }))
}

fn fonts_missing(err: &Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::IoError(io_err)
            if io_err.kind() == io::ErrorKind::NotFound
                || io_err.kind() == io::ErrorKind::PermissionDenied
    )
}

/// Returns the bundled Roboto family, or a system family when the bundled files are missing.
///
/// `override_dir` is searched before the `STUDY_PDF_FONTS_DIR` variable and the default paths.
pub fn font_family(override_dir: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    match load_bundled_font_family(override_dir) {
        Ok(family) => Ok(family),
        Err(err) if fonts_missing(&err) => system_font_family().map_err(|fallback_err| {
            warn!(
                "Bundled fonts unavailable ({}); system fallback failed: {}",
                err, fallback_err
            );
            Error::new(
                format!(
                    "Bundled fonts unavailable and system fallback failed: {}",
                    fallback_err
                ),
                io::Error::new(io::ErrorKind::NotFound, "default fonts are not available"),
            )
        }),
        Err(err) => Err(err),
    }
}

/// Indicates whether any usable font family is present on disk.
pub fn default_fonts_available() -> bool {
    resolve_font_directory(None).is_ok() || SYSTEM_FAMILIES.iter().any(|f| f.directory().is_some())
}
