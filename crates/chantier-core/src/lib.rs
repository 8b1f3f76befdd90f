pub mod catalog;
pub mod estimation;
pub mod lenient;
pub mod quantity;
pub mod request;

pub use catalog::CatalogMaterial;
pub use estimation::{
    CostBreakdown, EnrichedEstimation, EnrichedMaterial, Estimation, EstimationMaterial,
    MaterialLine,
};
pub use quantity::{Quantity, leading_number, round_cents};
pub use request::{EncodedImage, EstimateRequest, JobParameters};
