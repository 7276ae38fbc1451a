use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID value.
            #[must_use]
            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            /// Returns the underlying UUID value.
            #[must_use]
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Stable identifier for a user account.
    UserId
}

uuid_id! {
    /// Stable identifier for a role definition.
    RoleId
}

uuid_id! {
    /// Stable identifier for a permission row.
    PermissionId
}

uuid_id! {
    /// Organization identifier used as the partition key for tenant-scoped resources.
    OrganizationId
}

uuid_id! {
    /// Team identifier within an organization.
    TeamId
}

uuid_id! {
    /// Geographic region identifier used for region-scoped grants.
    RegionId
}

#[cfg(test)]
mod tests {
    use super::{OrganizationId, RoleId};

    #[test]
    fn ids_of_distinct_kinds_are_distinct_types() {
        let organization_id = OrganizationId::new();
        let role_id = RoleId::from_uuid(organization_id.as_uuid());
        assert_eq!(organization_id.as_uuid(), role_id.as_uuid());
    }

    #[test]
    fn id_display_is_uuid_formatted() {
        let role_id = RoleId::new();
        assert_eq!(role_id.to_string(), role_id.as_uuid().to_string());
    }
}
