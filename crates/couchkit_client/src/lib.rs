//! # CouchKit Client
//!
//! Blocking CouchDB client focused on two write paths.
//!
//! This crate provides:
//! - Design document seeding: compute and apply the additions, changes and
//!   deletions that make a database's design documents match a desired set
//! - Bulk writes that re-read and retry documents rejected with a revision
//!   conflict
//! - Single-document upserts
//! - A [`DocumentStore`] abstraction with an HTTP implementation and an
//!   in-memory one for tests
//!
//! ## Architecture
//!
//! ```text
//! Client --use_database--> Database<S: DocumentStore>
//!                               |-- Seeder (seed.rs)
//!                               `-- store / store_many (bulk.rs)
//!
//! DocumentStore: HttpStore<C: HttpClient> | MemoryStore
//! ```
//!
//! Network access sits behind the [`HttpClient`] trait; [`ReqwestClient`]
//! is the production implementation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bulk;
mod client;
mod config;
mod database;
mod design;
mod error;
mod http;
mod memory;
mod seed;
mod store;

pub use bulk::{store, store_many, BulkReport};
pub use client::{Client, ReqwestClient};
pub use config::{ClientConfig, Credentials};
pub use database::Database;
pub use design::{parse_dir, MAP_FILE, REDUCE_FILE};
pub use error::{CouchError, CouchResult};
pub use http::{HttpClient, HttpRequest, HttpResponse, HttpStore, Method};
pub use memory::{MemoryStore, StoreOp};
pub use seed::{diff, ReservedNames, SeedReport, Seeder, UnderscorePrefix};
pub use store::DocumentStore;

pub use couchkit_protocol::{
    AllDocsQuery, AllDocsResponse, BulkItemResult, BulkOutcome, DesignDocument, DesignView,
    Difference, Document, DocumentResponse,
};
