pub mod bom;

pub use bom::{
    BomCostComponent, BomLineItem, BomVersion, CostComponentInput, CostType, NewBomLineItem,
    NewBomVersion, Product, VersionStatus,
};
