// SPDX-FileCopyrightText: 2025 softras contributors
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod error;
pub mod strid;
pub mod types;

pub use error::{RenderError, Result};
pub use strid::{str_id, StrId};
pub use types::*;
