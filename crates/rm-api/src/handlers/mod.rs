pub mod health;
pub mod occupations;
pub mod predict;
