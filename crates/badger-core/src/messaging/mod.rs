//! Outbound chat messaging (Discord today).

pub mod port;
