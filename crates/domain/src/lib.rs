//! Domain types for the Fleetgrid access-control engine.

#![forbid(unsafe_code)]

mod access;
mod assignment;
mod effective;
mod permission;
mod role;

pub use access::{Action, PermissionScope, ReasonCode, Resource};
pub use assignment::RoleAssignment;
pub use effective::{AssignedRole, EffectivePermission, EffectivePermissions};
pub use permission::{Permission, PermissionConditions, RoleGrant};
pub use role::{Role, RoleCapabilities, RoleRef};
