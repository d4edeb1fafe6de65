mod access_gate;
mod acl;

pub use access_gate::{AccessGateFactory, AccessGateService};
pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
