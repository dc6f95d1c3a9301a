// ABOUTME: Common data models for hydration tracking, social, and gamification domains
// ABOUTME: Plain structs and enums shared between database, services, and routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Aqualog contributors

mod gamification;
mod hydration;
mod social;
mod user;

pub use gamification::*;
pub use hydration::*;
pub use social::*;
pub use user::*;
