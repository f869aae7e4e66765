// SPDX-License-Identifier: GPL-3.0-only
pub mod profile;
pub mod dob;
pub mod changes;

pub use profile::{check_booking, compute_missing_fields, is_eligible_for_sector, BookingDecision, MissingField};
pub use dob::{is_valid_dob_input, normalize_dob_for_input, to_api_dob};
pub use changes::{validate_profile_changes, ProfileChanges};
