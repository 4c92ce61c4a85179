pub mod admin;
pub mod auth;
pub mod ding;
pub mod health;
pub mod views;
