//! Saldo, an embeddable customer/payment ledger data service.
//!
//! The crate turns a `(search, page_index, page_size)` parameter tuple into
//! a stable, paginated view of a customer collection, keeps a query cache
//! coherent across create/update/delete mutations, and reconciles
//! row-selection state as the visible page changes. Presentational
//! collaborators (table renderers, modals, cards) talk to
//! [`application::ledger::LedgerService`]; persistence sits behind the
//! [`application::repos::CustomerStore`] trait so a network-backed store
//! can be substituted without touching the query, cache, or selection
//! layers.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
