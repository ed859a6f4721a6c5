//! HTTP API for association and program export.
//!
//! This module serves a small JSON API using Axum. Position and station
//! files are uploaded as multipart form fields.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! feeder-solver serve
//!
//! # Custom port and auto-open browser
//! feeder-solver serve --port 3000 --open
//!
//! # Bind to all interfaces
//! feeder-solver serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /api/config` - Active alias/ignore configuration
//! - `POST /api/classify` - Classify markings (`{"markings": [...]}`)
//! - `POST /api/associate` - Associate parts with stations (multipart: `positions`, `stations`, optional `config`)
//! - `POST /api/export` - Same form, returns `export.dpv`

pub mod server;
