// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module

mod index_projection;
mod seat_inventory;
