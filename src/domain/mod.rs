pub mod mail;
pub mod message;
