//! Catalog module - product stock as seen by provisioning.

mod product;

pub use product::Product;
