pub mod classify;
pub mod menu;
pub mod merge;
pub mod normalize;
pub mod order;
pub mod ratings;
