pub mod health;
pub mod product;
pub mod uploads;
