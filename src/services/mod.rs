pub mod bom;

pub use bom::BomService;
