//! Interface definitions for the masjid store.
//!
//! This module defines the abstract `MasjidStore` trait that allows for
//! dependency injection and swappable storage backends.

mod masjid_store;

pub use masjid_store::MasjidStore;
