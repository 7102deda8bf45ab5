pub mod action;
pub mod health;
pub mod inbox;
