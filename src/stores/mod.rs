// SPDX-License-Identifier: GPL-3.0-only
pub mod persisted;
pub mod cart;
pub mod saved;
pub mod notifications;
pub mod clubs;

pub use persisted::PersistedDocument;
pub use cart::{CartItem, CartStore, CartSummary};
pub use saved::SavedEventsStore;
pub use notifications::{NotificationItem, NotificationStore};
pub use clubs::{Club, ClubCache, ClubStore};
