pub mod auth;
pub mod events;
pub mod health;
pub mod invites;
pub mod members;
pub mod organizations;
