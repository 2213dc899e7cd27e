pub mod health;
pub mod menu;
pub mod ratings;
pub mod root;
