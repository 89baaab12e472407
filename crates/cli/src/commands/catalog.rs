//! Catalog inspection.

use std::path::Path;

use keepsake_core::catalog::{Catalog, CatalogDefinition};
use tracing::info;

use super::{CommandError, read_yaml};

/// Load a catalog file, or the built-in catalog when no path is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load(path: Option<&Path>) -> Result<Catalog, CommandError> {
    match path {
        Some(path) => {
            let definition: CatalogDefinition = read_yaml(path)?;
            Ok(Catalog::from_definition(definition)?)
        }
        None => Ok(Catalog::builtin()),
    }
}

/// Validate a catalog file.
///
/// # Errors
///
/// Returns the first problem found in the file.
pub fn validate(path: &Path) -> Result<(), CommandError> {
    info!(path = %path.display(), "Validating catalog");

    let catalog = load(Some(path))?;
    let definition = catalog.to_definition();
    for (family, axes) in &definition.families {
        let values: usize = axes.iter().map(|axis| axis.values.len()).sum();
        info!(%family, axes = axes.len(), values, "Family OK");
    }

    info!("Catalog is valid");
    Ok(())
}

/// Print a catalog as YAML.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded or rendered.
#[allow(clippy::print_stdout)]
pub fn show(path: Option<&Path>) -> Result<(), CommandError> {
    let yaml = render(&load(path)?)?;
    print!("{yaml}");
    Ok(())
}

fn render(catalog: &Catalog) -> Result<String, CommandError> {
    serde_yaml::to_string(&catalog.to_definition()).map_err(|e| CommandError::Render(e.to_string()))
}
