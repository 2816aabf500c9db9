// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EV Charging Platform - Authentication Server
//!
//! Stateless JWT authentication and role-based authorization in front of the
//! charging platform's HTTP API.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers and router (Axum)
//! - `auth` - Token service, authentication gate and access policy
//! - `store` - Credential store (accounts and roles)
//! - `config` - Environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod store;
