//! Vertical card display for estimates and catalog listings.

use chantier_core::{CatalogMaterial, EnrichedEstimation};
use chantier_service::{EstimationOutcome, ImageRejection};

const MAX_RECOMMENDATIONS: usize = 10;

// ── Public API ──

/// Print an enriched estimate as a card grouped by section.
pub fn print_estimate_card(estimation: &EnrichedEstimation) {
    println!("=== Estimation ===");
    println!();

    println!("Chantier");
    println!("  {:<26} {}", "durée", estimation.labor_time);
    println!("  {:<26} {}", "ouvriers", estimation.worker_count);
    println!();

    println!("Matériaux");
    for m in &estimation.materials {
        let marker = if m.is_real_price { "✓" } else { "?" };
        let unit_price = m
            .line
            .unit_price
            .map(|p| format!("{p:.2} €"))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {marker} {:<36} {:>10} {:<6} {:>10} {:>10.2} €",
            truncate(&m.line.name, 36),
            m.line.quantity.to_string(),
            m.line.unit,
            unit_price,
            m.line.total_price,
        );
        match (m.is_real_price, m.confidence) {
            (true, Some(c)) => println!(
                "      catalogue {} (confiance {:.0}%)",
                m.catalog_material_id.as_deref().unwrap_or("-"),
                c * 100.0
            ),
            (false, Some(c)) if c > 0.0 => {
                println!("      à ajouter au catalogue (meilleure confiance {:.0}%)", c * 100.0)
            }
            (false, _) => println!("      à ajouter au catalogue"),
            _ => {}
        }
    }
    println!();

    let breakdown = &estimation.cost_breakdown;
    println!("Répartition des coûts");
    print_amount("matériaux", breakdown.materials);
    print_amount("main d'oeuvre", breakdown.labor);
    print_amount("transport", breakdown.transport);
    print_amount("outillage", breakdown.tooling);
    print_amount("gestion des déchets", breakdown.waste_management);
    println!();

    println!("Totaux");
    print_amount("coût total", Some(estimation.total_cost));
    print_amount("marge", estimation.margin);
    print_amount("bénéfice", estimation.profit);

    if !estimation.recommendations.is_empty() {
        println!();
        println!("Recommandations");
        for r in estimation.recommendations.iter().take(MAX_RECOMMENDATIONS) {
            println!("  - {r}");
        }
        let hidden = estimation.recommendations.len().saturating_sub(MAX_RECOMMENDATIONS);
        if hidden > 0 {
            println!("  ... and {hidden} more");
        }
    }
}

/// Print an orchestrated estimate with its summary and rejected images.
pub fn print_outcome_card(outcome: &EstimationOutcome) {
    print_estimate_card(&outcome.estimation);
    println!();
    println!(
        "{} matériau(x) au prix catalogue, {} à ajouter. Produit le {}.",
        outcome.summary.matched,
        outcome.summary.needs_adding,
        outcome.produced_at.format("%Y-%m-%d %H:%M UTC"),
    );
    print_rejections(&outcome.rejected);
}

pub fn print_rejections(rejected: &[ImageRejection]) {
    if rejected.is_empty() {
        return;
    }
    println!();
    println!("Images ignorées");
    for r in rejected {
        println!("  {:<26} {}", truncate(&r.name, 26), r.reason);
    }
}

pub fn print_catalog(materials: &[CatalogMaterial]) {
    if materials.is_empty() {
        println!("Catalog is empty.");
        return;
    }
    println!("{:<16} {:<40} {:>10} {}", "ID", "NAME", "PRICE", "UNIT");
    for m in materials {
        println!(
            "{:<16} {:<40} {:>10.2} {}",
            truncate(&m.id, 16),
            truncate(&m.name, 40),
            m.unit_price,
            m.unit
        );
    }
    println!("\n{} material(s)", materials.len());
}

// ── Helpers ──

fn print_amount(label: &str, amount: Option<f64>) {
    match amount {
        Some(v) => println!("  {label:<26} {v:>10.2} €"),
        None => println!("  {label:<26} {:>10}", "-"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
