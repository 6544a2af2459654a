pub mod admin;
pub mod dev;
pub mod events;
pub mod health;
pub mod webhook;
