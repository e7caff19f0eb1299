// ABOUTME: Test helper modules shared by integration tests
// ABOUTME: Currently provides the in-process Axum request builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pebble Contributors
#![allow(dead_code)]

pub mod axum_test;
