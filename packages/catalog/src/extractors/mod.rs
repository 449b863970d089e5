pub mod json;
pub mod product_form;
