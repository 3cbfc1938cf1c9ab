//! Static role to permission table
//!
//! Permissions are `resource:action` strings. `ADM` holds the wildcard;
//! every other role is granted exactly the entries in its row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod permissions {
    pub const USERS_MANAGE: &str = "users:manage";

    pub const CUSTOMERS_READ: &str = "customers:read";
    pub const CUSTOMERS_WRITE: &str = "customers:write";

    pub const BOOKINGS_READ: &str = "bookings:read";
    pub const BOOKINGS_WRITE: &str = "bookings:write";
    pub const BOOKINGS_DELETE: &str = "bookings:delete";
    pub const BOOKINGS_READ_OWN: &str = "bookings:read_own";
    pub const BOOKINGS_CREATE_OWN: &str = "bookings:create_own";

    pub const BILLING_READ: &str = "billing:read";
    pub const BILLING_WRITE: &str = "billing:write";
    pub const BILLING_READ_OWN: &str = "billing:read_own";

    pub const PAYMENTS_READ: &str = "payments:read";
    pub const PAYMENTS_CREATE: &str = "payments:create";
    pub const PAYMENTS_READ_OWN: &str = "payments:read_own";

    pub const ACCOUNTING_READ: &str = "accounting:read";
    pub const ACCOUNTING_WRITE: &str = "accounting:write";
    pub const ACCOUNTING_DELETE: &str = "accounting:delete";

    pub const REPORTS_READ: &str = "reports:read";
    pub const DASHBOARD_READ: &str = "dashboard:read";

    pub const ALL: &str = "*";
}

use permissions as p;

/// Role codes carried in the token and the `users.role_code` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoleCode {
    /// Administrator
    Adm,
    /// Management, read-only with reports
    Mgt,
    /// Booking agent
    Agt,
    /// Accountant
    Acc,
    /// Customer
    Cus,
}

impl RoleCode {
    pub const ALL: [RoleCode; 5] = [
        RoleCode::Adm,
        RoleCode::Mgt,
        RoleCode::Agt,
        RoleCode::Acc,
        RoleCode::Cus,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoleCode::Adm => "ADM",
            RoleCode::Mgt => "MGT",
            RoleCode::Agt => "AGT",
            RoleCode::Acc => "ACC",
            RoleCode::Cus => "CUS",
        }
    }

    /// The user type a role belongs to
    #[must_use]
    pub fn user_type(self) -> UserType {
        match self {
            RoleCode::Adm => UserType::Admin,
            RoleCode::Cus => UserType::Customer,
            RoleCode::Mgt | RoleCode::Agt | RoleCode::Acc => UserType::Employee,
        }
    }

    /// Permission row for this role
    #[must_use]
    pub fn permissions(self) -> &'static [&'static str] {
        match self {
            RoleCode::Adm => &[p::ALL],
            RoleCode::Mgt => &[
                p::CUSTOMERS_READ,
                p::BOOKINGS_READ,
                p::BILLING_READ,
                p::PAYMENTS_READ,
                p::ACCOUNTING_READ,
                p::REPORTS_READ,
                p::DASHBOARD_READ,
            ],
            RoleCode::Agt => &[
                p::CUSTOMERS_READ,
                p::CUSTOMERS_WRITE,
                p::BOOKINGS_READ,
                p::BOOKINGS_WRITE,
                p::BILLING_READ,
                p::BILLING_WRITE,
                p::PAYMENTS_READ,
                p::PAYMENTS_CREATE,
                p::DASHBOARD_READ,
            ],
            RoleCode::Acc => &[
                p::CUSTOMERS_READ,
                p::BOOKINGS_READ,
                p::BILLING_READ,
                p::BILLING_WRITE,
                p::PAYMENTS_READ,
                p::PAYMENTS_CREATE,
                p::ACCOUNTING_READ,
                p::ACCOUNTING_WRITE,
                p::REPORTS_READ,
                p::DASHBOARD_READ,
            ],
            RoleCode::Cus => &[
                p::BOOKINGS_READ_OWN,
                p::BOOKINGS_CREATE_OWN,
                p::BILLING_READ_OWN,
                p::PAYMENTS_READ_OWN,
                p::DASHBOARD_READ,
            ],
        }
    }

    #[must_use]
    pub fn has_permission(self, permission: &str) -> bool {
        self.permissions()
            .iter()
            .any(|granted| *granted == p::ALL || *granted == permission)
    }
}

impl fmt::Display for RoleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADM" => Ok(RoleCode::Adm),
            "MGT" => Ok(RoleCode::Mgt),
            "AGT" => Ok(RoleCode::Agt),
            "ACC" => Ok(RoleCode::Acc),
            "CUS" => Ok(RoleCode::Cus),
            other => Err(format!("unknown role code: {other}")),
        }
    }
}

impl TryFrom<String> for RoleCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Coarse account category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Admin,
    Employee,
    Customer,
}

impl UserType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Admin => "ADMIN",
            UserType::Employee => "EMPLOYEE",
            UserType::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(UserType::Admin),
            "EMPLOYEE" => Ok(UserType::Employee),
            "CUSTOMER" => Ok(UserType::Customer),
            other => Err(format!("unknown user type: {other}")),
        }
    }
}

impl TryFrom<String> for UserType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_permission() {
        for perm in [p::USERS_MANAGE, p::BOOKINGS_DELETE, p::ACCOUNTING_DELETE, "anything:else"] {
            assert!(RoleCode::Adm.has_permission(perm));
        }
    }

    #[test]
    fn roles_get_exactly_their_row() {
        let every = [
            p::USERS_MANAGE,
            p::CUSTOMERS_READ,
            p::CUSTOMERS_WRITE,
            p::BOOKINGS_READ,
            p::BOOKINGS_WRITE,
            p::BOOKINGS_DELETE,
            p::BOOKINGS_READ_OWN,
            p::BOOKINGS_CREATE_OWN,
            p::BILLING_READ,
            p::BILLING_WRITE,
            p::BILLING_READ_OWN,
            p::PAYMENTS_READ,
            p::PAYMENTS_CREATE,
            p::PAYMENTS_READ_OWN,
            p::ACCOUNTING_READ,
            p::ACCOUNTING_WRITE,
            p::ACCOUNTING_DELETE,
            p::REPORTS_READ,
            p::DASHBOARD_READ,
        ];
        for role in [RoleCode::Mgt, RoleCode::Agt, RoleCode::Acc, RoleCode::Cus] {
            for perm in every {
                assert_eq!(
                    role.has_permission(perm),
                    role.permissions().contains(&perm),
                    "{role} / {perm}"
                );
            }
        }
    }

    #[test]
    fn only_admin_manages_users_and_deletes() {
        for role in [RoleCode::Mgt, RoleCode::Agt, RoleCode::Acc, RoleCode::Cus] {
            assert!(!role.has_permission(p::USERS_MANAGE));
            assert!(!role.has_permission(p::BOOKINGS_DELETE));
            assert!(!role.has_permission(p::ACCOUNTING_DELETE));
        }
    }

    #[test]
    fn management_is_read_only() {
        assert!(RoleCode::Mgt
            .permissions()
            .iter()
            .all(|perm| perm.ends_with(":read")));
    }

    #[test]
    fn customer_only_sees_own_records() {
        assert!(RoleCode::Cus.has_permission(p::BOOKINGS_READ_OWN));
        assert!(!RoleCode::Cus.has_permission(p::BOOKINGS_READ));
        assert!(!RoleCode::Cus.has_permission(p::ACCOUNTING_READ));
    }

    #[test]
    fn role_codes_parse_and_map_to_user_types() {
        assert_eq!("agt".parse::<RoleCode>(), Ok(RoleCode::Agt));
        assert!("XYZ".parse::<RoleCode>().is_err());
        assert_eq!(RoleCode::Adm.user_type(), UserType::Admin);
        assert_eq!(RoleCode::Acc.user_type(), UserType::Employee);
        assert_eq!(RoleCode::Cus.user_type(), UserType::Customer);
    }
}
