//! Application services and ports for the Fleetgrid access engine.

#![forbid(unsafe_code)]

mod access_ports;
mod authorization_service;

pub use access_ports::{
    AccessContext, AccessStore, AssignmentFilter, AssignmentRecord, Decision, PermissionCache,
    PermissionCacheEntry, ResourceRef, RolePermissionRecord,
};
pub use authorization_service::{AuthorizationService, CacheMode, NO_ROLE_LEVEL};
