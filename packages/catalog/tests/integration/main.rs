mod common;
mod health;
mod product;
mod uploads;
