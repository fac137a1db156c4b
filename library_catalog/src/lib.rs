pub mod api;

#[cfg(any(feature = "client", test))]
pub mod client;

#[cfg(any(feature = "server", test))]
pub mod app_config;
#[cfg(any(feature = "server", test))]
pub mod catalog_repository;
#[cfg(any(feature = "server", test))]
pub mod catalog_service;
#[cfg(any(feature = "server", test))]
pub mod errors;
#[cfg(any(feature = "server", test))]
mod handlers;
#[cfg(any(feature = "server", test))]
pub mod settings;
