use crate::error::{Error, Result};
use crate::kicad_models::*;
use std::fs;
use std::path::PathBuf;

const SYMBOL_LIB_HEADER: &str = "(kicad_symbol_lib\n  (version 20211014)\n  (generator lcsc2kicad)\n)\n";

/// Manages the on-disk output library: one symbol library file, one
/// directory of footprints and one directory of 3D models, all sharing the
/// library name.
pub struct KicadLibrary {
    pub path: PathBuf,
    pub name: String,
}

impl KicadLibrary {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KicadLibrary {
            path: path.into(),
            name: "lcsc2kicad".to_string(),
        }
    }

    pub fn symbol_lib_path(&self) -> PathBuf {
        self.path.join(format!("{}.kicad_sym", self.name))
    }

    pub fn footprint_dir(&self) -> PathBuf {
        self.path.join(format!("{}.pretty", self.name))
    }

    pub fn model_dir(&self) -> PathBuf {
        self.path.join(format!("{}.3dshapes", self.name))
    }

    /// Directory reference emitted into footprint model blocks.
    pub fn model_path_reference(&self) -> String {
        format!("${{LCSC2KICAD}}/{}.3dshapes", self.name)
    }

    /// Footprint references inside symbols are qualified with the library
    /// name so cross-references resolve.
    pub fn footprint_reference(&self, package: &str) -> String {
        format!("{}:{}", self.name, package)
    }

    /// Creates the library directories and the symbol library envelope if
    /// they do not exist yet.
    pub fn setup_directories(&self) -> Result<()> {
        fs::create_dir_all(self.footprint_dir())?;
        fs::create_dir_all(self.model_dir())?;
        let lib_path = self.symbol_lib_path();
        if !lib_path.exists() {
            fs::write(&lib_path, SYMBOL_LIB_HEADER)?;
        }
        Ok(())
    }

    /// Adds a symbol to the library file, replacing an existing record with
    /// the same identifier in place. With overwrite disabled an existing
    /// record is left untouched and the call still succeeds.
    pub fn add_symbol(&self, symbol: &KiSymbol, overwrite: bool) -> Result<()> {
        let lib_path = self.symbol_lib_path();
        let mut content = if lib_path.exists() {
            fs::read_to_string(&lib_path)?
        } else {
            SYMBOL_LIB_HEADER.to_string()
        };

        let id = symbol_id(&symbol.info.name);
        let marker = format!("(symbol \"{}\"", id);
        if let Some(start) = content.find(&marker) {
            if !overwrite {
                log::info!("Symbol {} already exists in the library; skipping", id);
                return Ok(());
            }
            content = remove_record(content, start);
            log::info!("Replacing existing symbol {}", id);
        }

        let insert_pos = content
            .rfind(')')
            .ok_or_else(|| Error::ParseError("symbol library has no closing delimiter".into()))?;
        content.insert_str(insert_pos, &symbol.to_library_record());
        fs::write(&lib_path, content)?;
        Ok(())
    }

    /// Writes a footprint to its own `.kicad_mod` file inside the `.pretty`
    /// directory. An existing file is skipped unless overwrite is enabled.
    pub fn add_footprint(&self, footprint: &KiFootprint, overwrite: bool) -> Result<()> {
        let fp_path = self
            .footprint_dir()
            .join(format!("{}.kicad_mod", sanitize_filename(&footprint.name)));
        if fp_path.exists() && !overwrite {
            log::info!("Footprint {} already exists; skipping", footprint.name);
            return Ok(());
        }
        fs::create_dir_all(self.footprint_dir())?;
        fs::write(fp_path, footprint.to_mod_file())?;
        Ok(())
    }

    /// Writes the 3D model files (`.wrl`, `.step`). A missing payload for
    /// one format is not an error as long as the other one is present.
    pub fn add_3d_model(&self, model: &Ki3dModel, overwrite: bool) -> Result<()> {
        if model.wrl_data.is_none() && model.step_data.is_none() {
            return Err(Error::MissingData(format!(
                "3D model {} has no payload in either format",
                model.name
            )));
        }
        fs::create_dir_all(self.model_dir())?;
        let base_path = self.model_dir().join(sanitize_filename(&model.name));
        let wrl_path = base_path.with_extension("wrl");
        let step_path = base_path.with_extension("step");
        if !overwrite && (wrl_path.exists() || step_path.exists()) {
            log::info!("3D model {} already exists; skipping", model.name);
            return Ok(());
        }
        if let Some(wrl_data) = &model.wrl_data {
            fs::write(wrl_path, wrl_data)?;
        }
        if let Some(step_data) = &model.step_data {
            fs::write(step_path, step_data)?;
        }
        Ok(())
    }
}

/// Removes the record whose opening marker sits at `start` by scanning for
/// its balanced closing parenthesis. Parentheses inside quoted strings do
/// not count toward the depth.
fn remove_record(content: String, start: usize) -> String {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut end = None;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        match byte {
            b'"' => in_string = !in_string,
            b'(' if !in_string => depth += 1,
            b')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let Some(mut end) = end else {
        // Unbalanced record; leave the file content alone.
        return content;
    };

    // Take the surrounding indentation and line break with the record.
    let mut record_start = start;
    while record_start > 0 && matches!(bytes[record_start - 1], b' ' | b'\t') {
        record_start -= 1;
    }
    if bytes.get(end) == Some(&b'\n') {
        end += 1;
    }

    let mut trimmed = content;
    trimmed.replace_range(record_start..end, "");
    trimmed
}
