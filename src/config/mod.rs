// ABOUTME: Configuration management modules
// ABOUTME: Environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

/// Environment-based configuration management
pub mod environment;

pub use environment::{AuthConfig, DatabaseConfig, Environment, ServerConfig};
