//! Background tasks
//!
//! The long-running loops of the routing core:
//! - Republish loop (re-announces locally owned records on DHT + gossip)
//! - Cleanup loop (evicts remote label entries past their TTL)
//!
//! The gossip subscription handler lives in `network::gossip`; the
//! provider-notification handler in `handlers::notify`. All loops share
//! the core's running flag and are aborted on stop.

pub(crate) mod cleanup;
pub(crate) mod republish;

pub(crate) use cleanup::run_cleanup_loop;
pub(crate) use republish::{run_republish_loop, RepublishFn};
