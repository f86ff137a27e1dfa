//! Per-tenant real-time notification plumbing.
//!
//! This crate provides:
//! - `TenantRegistry`: live connections keyed by owning tenant
//! - `NotificationBus`: best-effort fan-out of status events to a tenant's
//!   connections, bounded per-connection so one dead client cannot stall
//!   the pipeline

pub mod bus;
pub mod registry;

pub use bus::NotificationBus;
pub use registry::{ConnectionId, EventSender, TenantRegistry};
