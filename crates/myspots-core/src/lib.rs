//! MySpots Core Library
//!
//! Core functionality for MySpots, a personal points-of-interest catalog:
//! search a places API, keep selected results in an Airtable base, and
//! export the collection as a styled KML document for mapping applications.
//!
//! # Architecture
//!
//! The export pipeline is pure and synchronous: the record store is read
//! once, the category tree is rebuilt from flat parent-referencing records,
//! each place is filed under its resolved root categories, and the assembled
//! document is serialized in one pass. All I/O lives in the API clients; the
//! graph, style, and assembly code take data and policy flags as explicit
//! parameters.
//!
//! # Modules
//!
//! - `models`: place and category records, status flags
//! - `graph`: category tree construction and root resolution
//! - `style`: marker style and visibility policy
//! - `kml`: KML document model and serialization
//! - `export`: export pipeline (document assembly)
//! - `airtable`: record store client
//! - `places`: Google Places client
//! - `config`: application configuration

pub mod airtable;
pub mod config;
pub mod export;
pub mod graph;
pub mod kml;
pub mod models;
pub mod places;
pub mod style;

pub use airtable::{AirtableClient, SkippedRecord};
pub use config::Config;
pub use export::{build_document, ExportOptions};
pub use graph::{CategoryGraph, GraphError, UNCATEGORIZED};
pub use kml::KmlDocument;
pub use models::{CategoryRecord, Flag, PlaceRecord};
pub use places::{PlaceCandidate, PlaceDetails, PlacesClient};
