// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account roles for authorization.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account roles on the charging platform.
///
/// ## Roles
///
/// - `Admin` - Platform administration, account management
/// - `Driver` - EV driver: reservations, charging sessions, invoices
/// - `Manager` - Station manager: stations, chargers, staff
/// - `Employee` - Station staff: sessions on site, incident reports
///
/// Authorization compares roles for equality; there is no implicit hierarchy.
/// Rules that accept several roles list them explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Platform administrator
    Admin,
    /// EV driver (self-registered accounts)
    Driver,
    /// Charging station manager
    Manager,
    /// Charging station employee
    Employee,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Driver, Role::Manager, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Driver => "DRIVER",
            Role::Manager => "MANAGER",
            Role::Employee => "EMPLOYEE",
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "DRIVER" => Some(Role::Driver),
            "MANAGER" => Some(Role::Manager),
            "EMPLOYEE" => Some(Role::Employee),
            _ => None,
        }
    }
}

impl Default for Role {
    /// Self-registered accounts are drivers.
    fn default() -> Self {
        Role::Driver
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
