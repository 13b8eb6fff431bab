//! City Weather Library
//!
//! A read-through lookup service: given a city name, return current weather,
//! computed once per normalized city and replayed from the cache thereafter.
//! The binary in `main.rs` only wires configuration, logging and the server.

pub mod cache;
pub mod cli;
pub mod cors;
pub mod data;
pub mod key;
pub mod lookup;
pub mod server;

pub use cache::{CacheBackend, CacheStore, StoreError};
pub use data::{Coordinates, GeocodeMatch, WeatherResult};
pub use key::CityKey;
pub use lookup::{LookupError, WeatherLookup};
