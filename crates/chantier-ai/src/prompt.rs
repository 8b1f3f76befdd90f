//! Prompt templates for the cost estimator.

use chantier_core::{CatalogMaterial, JobParameters};

pub const SYSTEM_PROMPT: &str = "\
Tu es un métreur expérimenté qui chiffre des chantiers de rénovation pour une petite entreprise du bâtiment.

À partir des photos du chantier et de la description des travaux, estime les matériaux, la main d'oeuvre et les frais annexes.

Réponds UNIQUEMENT avec un objet JSON. Pas de bloc markdown, pas d'explication, seulement du JSON brut :
{
  \"tempsRealisation\": \"durée estimée, ex. '5 jours'\",
  \"nombreOuvriers\": nombre d'ouvriers,
  \"materiaux\": [
    {
      \"nom\": \"nom du matériau\",
      \"quantite\": quantité,
      \"unite\": \"m², ml, sac, u...\",
      \"prixUnitaire\": prix unitaire HT,
      \"prixTotal\": prix total HT,
      \"coefficientPerte\": coefficient de perte (ex. 1.1)
    }
  ],
  \"repartitionCouts\": {
    \"materiaux\": total matériaux,
    \"mainOeuvre\": coût main d'oeuvre,
    \"transport\": frais de transport,
    \"outillage\": location et usure d'outillage,
    \"gestionDechets\": évacuation des déchets
  },
  \"coutTotal\": coût total HT,
  \"marge\": marge de l'entreprise,
  \"benefice\": bénéfice,
  \"recommandations\": [\"conseils pour le chantier\"]
}

Quand un matériau de la bibliothèque fournie correspond, reprends exactement son nom.
Tous les montants sont en euros, sans symbole.";

/// Build the user prompt for one job.
///
/// Catalog entries are listed by name, unit and price so the estimator can
/// reuse their exact names, which makes catalog matching reliable.
pub fn build_user_prompt(job: &JobParameters, catalog: &[CatalogMaterial]) -> String {
    let mut prompt = format!(
        "Type de travaux : {job_type}\n\
         Surface : {surface} m²\n",
        job_type = job.job_type,
        surface = job.surface,
    );
    if let Some(description) = &job.materials_description {
        prompt.push_str(&format!("Matériaux souhaités : {description}\n"));
    }
    if let Some(location) = &job.location {
        prompt.push_str(&format!("Localisation : {location}\n"));
    }
    if let Some(deadline) = &job.deadline {
        prompt.push_str(&format!("Délai souhaité : {deadline}\n"));
    }

    if catalog.is_empty() {
        prompt.push_str("\nBibliothèque de matériaux : vide.\n");
    } else {
        prompt.push_str("\nBibliothèque de matériaux (nom | unité | prix unitaire HT) :\n");
        for material in catalog {
            prompt.push_str(&format!(
                "- {} | {} | {:.2}\n",
                material.name, material.unit, material.unit_price
            ));
        }
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobParameters {
        JobParameters {
            surface: 32.5,
            job_type: "Pose de carrelage".into(),
            materials_description: Some("grès cérame".into()),
            location: None,
            deadline: Some("fin mars".into()),
        }
    }

    #[test]
    fn prompt_lists_job_and_catalog() {
        let catalog = vec![CatalogMaterial::new("m1", "Colle flex", 18.0, "sac")];
        let prompt = build_user_prompt(&job(), &catalog);
        assert!(prompt.contains("Type de travaux : Pose de carrelage"));
        assert!(prompt.contains("Surface : 32.5 m²"));
        assert!(prompt.contains("Délai souhaité : fin mars"));
        assert!(!prompt.contains("Localisation"));
        assert!(prompt.contains("- Colle flex | sac | 18.00"));
    }

    #[test]
    fn empty_catalog_is_stated() {
        let prompt = build_user_prompt(&job(), &[]);
        assert!(prompt.contains("Bibliothèque de matériaux : vide."));
    }

    #[test]
    fn system_prompt_names_required_keys() {
        for key in crate::decoder::REQUIRED_FIELDS {
            assert!(SYSTEM_PROMPT.contains(key), "{key}");
        }
        for key in crate::decoder::REQUIRED_MATERIAL_FIELDS {
            assert!(SYSTEM_PROMPT.contains(key), "{key}");
        }
    }
}
