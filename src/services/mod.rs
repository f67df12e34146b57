pub mod copy_scheduler;
pub mod notifier;
pub mod pattern_sweep;
