pub mod bom_cost_component;
pub mod bom_version;
pub mod product;
pub mod product_bom;
