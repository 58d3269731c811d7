//! Product catalog: products and the categories that group them.

mod category;
mod product;

pub use category::{Category, CategoryPatch, NewCategory};
pub use product::{NewProduct, Product, ProductPatch};
