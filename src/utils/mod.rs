// SPDX-License-Identifier: GPL-3.0-only
pub mod url_validator;

pub use url_validator::validate_backend_url;
