pub mod alerts;
pub mod control;
pub mod fills;
pub mod health;
pub mod metrics;
pub mod subscriptions;
pub mod traders;
