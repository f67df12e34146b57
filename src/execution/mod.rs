pub mod engine;
pub mod risk_gates;
pub mod sizer;
pub mod subscriptions;
