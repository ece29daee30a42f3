// Copyright © 2024 The qFALL-persist Authors
//
// This file is part of qFALL-persist.
//
// qFALL-persist is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains common functions that are used by sub functions.
//!
//! This includes the construction of the ring `Z_q[X]/(X^n + 1)`, the
//! conversion of ring elements into a portable coefficient list, and digests.

pub mod coefficients;
pub mod common_moduli;
pub mod digest;
