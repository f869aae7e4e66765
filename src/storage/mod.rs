// SPDX-License-Identifier: GPL-3.0-only
pub mod traits;
pub mod sqlite;

pub use traits::KeyValueStore;
pub use sqlite::SqliteStore;
