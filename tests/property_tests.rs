// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify properties that must hold for all
//! valid inputs: seat inventory bounds, enrollment uniqueness and index
//! projection idempotence.

mod property;
