pub mod health;
pub mod http;
pub mod notifier;
pub mod rbmq;
