pub mod api;
pub mod chat;
pub mod notice;
