pub mod menu;
pub mod rating;
