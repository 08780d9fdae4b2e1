pub mod transformer;
pub mod vit;
