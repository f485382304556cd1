//! Reading and writing kinetic models in the YAML model format.
//!
//! The schema is the serde representation of [`Model`]: a `species` list with
//! composition/thermo/transport blocks and a `reactions` list with tagged rate models.
//! Writing then re-reading a model reproduces it exactly (f64 values round-trip).

use crate::chem::model::Model;
use crate::error::ReductionError;
use log::info;
use std::path::Path;

/// Load a model from a YAML file and check the model invariant.
pub fn load_model(path: &Path) -> Result<Model, ReductionError> {
    let text = std::fs::read_to_string(path)?;
    let model: Model = serde_yaml::from_str(&text)
        .map_err(|e| ReductionError::Parse(format!("{}: {}", path.display(), e)))?;
    model.validate()?;
    info!(
        "Loaded model `{}` from {} ({}).",
        model.name,
        path.display(),
        crate::log_model(&model)
    );
    Ok(model)
}

/// Serialize a model to a YAML file.
pub fn write_model(model: &Model, path: &Path) -> Result<(), ReductionError> {
    let text = serde_yaml::to_string(model)
        .map_err(|e| ReductionError::Parse(format!("{}: {}", path.display(), e)))?;
    std::fs::write(path, text)?;
    info!("Wrote model to {} ({}).", path.display(), crate::log_model(model));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_logger, toy_model};

    /// Writing a model and re-reading it yields an equivalent model.
    #[test]
    fn model_round_trips_through_yaml() {
        init_logger();
        let model = toy_model();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.yaml");

        write_model(&model, &path).unwrap();
        let read_back = load_model(&path).unwrap();

        assert!(
            model.equivalent(&read_back),
            "round-tripped model differs from the original"
        );
        assert_eq!(model.n_species(), read_back.n_species());
        assert_eq!(model.n_reactions(), read_back.n_reactions());
    }

    #[test]
    fn dangling_species_reference_is_rejected() {
        init_logger();
        let mut model = toy_model();
        model.species.remove(model.species_index("H2O2").unwrap());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        let text = serde_yaml::to_string(&model).unwrap();
        std::fs::write(&path, text).unwrap();

        let result = load_model(&path);
        assert!(
            matches!(&result, Err(ReductionError::ModelConstruction(_))),
            "expected a model construction error, got {:?}",
            result.as_ref().map(|m| &m.name)
        );
    }
}
