// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Utilities for testing code that uses `bytewise_io` abstractions.

mod fake_read;
mod fake_write;

pub use fake_read::*;
pub use fake_write::*;
