pub mod event;
pub mod invite;
pub mod member;
pub mod organization;
pub mod user;
