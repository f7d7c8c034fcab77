// src/lib.rs

pub mod api;
pub mod converter;
pub mod easyeda_models;
pub mod error;
pub mod fallback;
pub mod file_writer;
pub mod geometry;
pub mod importer;
pub mod kicad_models;

use crate::api::EasyedaApi;
use crate::error::Result;
use crate::file_writer::KicadLibrary;
use crate::kicad_models::sanitize_filename;
use serde_json::Value;
use std::path::Path;

/// Per-artifact outcome of one conversion. Each flag reflects whether that
/// artifact was produced, or skipped successfully because it already existed
/// and overwrite was disabled. Partial success is distinct from both total
/// success and total failure.
#[derive(Debug, Clone, Copy)]
pub struct ConversionReport {
    pub symbol_ok: bool,
    pub footprint_ok: bool,
    pub model_ok: bool,
}

impl ConversionReport {
    pub fn all_ok(&self) -> bool {
        self.symbol_ok && self.footprint_ok && self.model_ok
    }

    pub fn any_ok(&self) -> bool {
        self.symbol_ok || self.footprint_ok || self.model_ok
    }

    pub fn is_partial(&self) -> bool {
        self.any_ok() && !self.all_ok()
    }
}

/// Fetches a component by LCSC id and converts it into the KiCad library at
/// `output_dir`. A fetch failure is terminal; individual artifact failures
/// are reported through the returned [`ConversionReport`].
pub async fn import_component(
    lcsc_id: &str,
    output_dir: &Path,
    overwrite: bool,
) -> Result<ConversionReport> {
    let api = EasyedaApi::new();
    let library = KicadLibrary::new(output_dir);
    library.setup_directories()?;

    let cad_data = api.get_cad_data(lcsc_id).await?;
    let report = convert_component(&api, &cad_data, &library, overwrite).await;
    if report.all_ok() {
        log::info!("Successfully converted {}", lcsc_id);
    } else if report.is_partial() {
        log::error!("Partially converted {}: {:?}", lcsc_id, report);
    } else {
        log::error!("Failed to convert {}", lcsc_id);
    }
    Ok(report)
}

/// Converts already-fetched CAD data. The symbol, footprint and 3D model
/// steps run independently: a failure in one is logged and reflected in its
/// flag without aborting the others.
pub async fn convert_component(
    api: &EasyedaApi,
    cad_data: &Value,
    library: &KicadLibrary,
    overwrite: bool,
) -> ConversionReport {
    let component_name = sanitize_filename(cad_data["title"].as_str().unwrap_or("Unknown"));

    let symbol_ok = convert_symbol_step(cad_data, library, overwrite);

    let ee_footprint = match importer::import_footprint(cad_data) {
        Ok(footprint) => Some(footprint),
        Err(e) => {
            log::error!("Failed to import footprint for {}: {}", component_name, e);
            None
        }
    };

    // The 3D model rides along with the footprint: its reference record
    // lives in the footprint shape list and its placement needs the
    // footprint origin.
    let mut model_ok = true;
    let mut ki_model = None;
    if let Some(footprint) = &ee_footprint {
        if let Some(mut model) = importer::find_3d_model(&footprint.raw_shapes) {
            let (obj, step) = tokio::join!(
                api.get_3d_model_obj(&model.uuid),
                api.get_3d_model_step(&model.uuid)
            );
            model.obj_data = obj
                .map_err(|e| log::warn!("No OBJ payload for {}: {}", model.uuid, e))
                .ok();
            model.step_data = step
                .map_err(|e| log::warn!("No STEP payload for {}: {}", model.uuid, e))
                .ok();

            if model.obj_data.is_none() && model.step_data.is_none() {
                log::error!("3D model {} has no fetchable payload", model.uuid);
                model_ok = false;
            } else {
                let converted = converter::convert_3d_model(
                    model,
                    footprint.info.bbox_x,
                    footprint.info.bbox_y,
                    component_name.clone(),
                    library.model_path_reference(),
                );
                match library.add_3d_model(&converted, overwrite) {
                    Ok(()) => ki_model = Some(converted),
                    Err(e) => {
                        log::error!("Failed to export 3D model {}: {}", component_name, e);
                        model_ok = false;
                    }
                }
            }
        } else {
            log::info!("No 3D model found for {}", component_name);
        }
    }

    let mut footprint_ok = false;
    if let Some(footprint) = ee_footprint {
        let ki_footprint = converter::convert_footprint(footprint, ki_model);
        match library.add_footprint(&ki_footprint, overwrite) {
            Ok(()) => {
                log::info!("Exported footprint {}", ki_footprint.name);
                footprint_ok = true;
            }
            Err(e) => log::error!("Failed to export footprint {}: {}", ki_footprint.name, e),
        }
    }

    ConversionReport {
        symbol_ok,
        footprint_ok,
        model_ok,
    }
}

fn convert_symbol_step(cad_data: &Value, library: &KicadLibrary, overwrite: bool) -> bool {
    let ee_symbol = match importer::import_symbol(cad_data) {
        Ok(symbol) => symbol,
        Err(e) => {
            log::error!("Failed to import symbol: {}", e);
            return false;
        }
    };

    let mut ki_symbol = if ee_symbol.has_drawable_content() {
        converter::convert_symbol(ee_symbol)
    } else {
        log::warn!(
            "Component {} has no symbol geometry; synthesizing a fallback symbol",
            ee_symbol.info.name
        );
        let pad_numbers = fallback::pad_numbers_from_cad_data(cad_data);
        fallback::synthesize_symbol(converter::symbol_info(&ee_symbol.info), pad_numbers)
    };

    if !ki_symbol.info.package.is_empty() {
        ki_symbol.info.package = library.footprint_reference(&ki_symbol.info.package);
    }

    match library.add_symbol(&ki_symbol, overwrite) {
        Ok(()) => {
            log::info!("Exported symbol {}", ki_symbol.info.name);
            true
        }
        Err(e) => {
            log::error!("Failed to export symbol {}: {}", ki_symbol.info.name, e);
            false
        }
    }
}
