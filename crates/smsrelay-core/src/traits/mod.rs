// SPDX-FileCopyrightText: 2026 SMS Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for the device-side collaborator boundaries.

pub mod device;

pub use device::DeviceTransport;
