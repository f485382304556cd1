//! Removal of an exclusion set from a kinetic model.


use crate::chem::{Model, Reaction};
use crate::error::ReductionError;
use log::debug;
use std::collections::BTreeSet;

/// Produce a new model without the excluded species.
///
/// Besides dropping the species themselves, this removes every reaction whose
/// reactants or products mention an excluded species, strips excluded species from
/// third-body efficiency maps, and drops reactions whose third body becomes vacuous
/// (explicit third body excluded, no default efficiency left). Species order and the
/// relative order of surviving reactions are preserved.
///
/// Trimming every species away is a fatal [`ReductionError::ModelConstruction`]; a
/// model without reactions is allowed (it simply never ignites).
pub fn trim(model: &Model, exclusion: &BTreeSet<String>) -> Result<Model, ReductionError> {
    let species: Vec<_> = model
        .species
        .iter()
        .filter(|s| !exclusion.contains(&s.name))
        .cloned()
        .collect();
    if species.is_empty() {
        return Err(ReductionError::ModelConstruction(format!(
            "exclusion of {} species removed every species in the model",
            exclusion.len()
        )));
    }

    let reactions: Vec<Reaction> = model
        .reactions
        .iter()
        .filter(|r| !r.references_any(exclusion))
        .filter_map(|r| {
            let mut reaction = r.clone();
            if let Some(third_body) = reaction.rate.third_body_mut() {
                third_body
                    .efficiencies
                    .retain(|name, _| !exclusion.contains(name));
                if third_body.is_vacuous() {
                    debug!(
                        "Dropping `{}`: third body fully excluded.",
                        reaction.equation()
                    );
                    return None;
                }
            }
            Some(reaction)
        })
        .collect();

    debug!(
        "Trimmed {} species and {} reactions from `{}`.",
        model.n_species() - species.len(),
        model.n_reactions() - reactions.len(),
        model.name
    );
    Ok(Model {
        name: model.name.clone(),
        species,
        reactions,
    })
}
