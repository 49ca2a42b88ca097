pub mod error;
pub mod health;
pub mod message;
pub mod notification;
pub mod subscription;
pub mod validation;
