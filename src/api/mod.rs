//! HTTP admin page for viewing stats and editing the override table.
//!
//! # Endpoints
//!
//! ## `/` (GET)
//!
//!   An HTML page with the active hosts file in an editable textarea and a table of the
//!   request counters.
//!
//! ## `/save_hosts` (POST)
//!
//!   Expects a form encoded body with a single `hosts` field holding the complete new hosts
//!   file, one `domain target` entry per line:
//!
//!   ```text
//!   printer.lan 192.168.1.20
//!   *.dev.lan   127.0.0.1
//!   ```
//!
//!   The file is written to [`Config::hosts_path`][crate::config::Config::hosts_path], parsed,
//!   and installed as the new override table in one step. Queries already being resolved
//!   finish against the previous table. Redirects back to `/` on success; returns HTTP 400
//!   (Bad Request) when `hosts` is missing or empty.
//!
//! ## `/stats` (GET)
//!
//!   Returns the request counters as a JSON object, e.g.
//!
//!   ```json
//!   { "local_responses": 3, "proxied_requests": 12, "requests": 15 }
//!   ```
//!
//! ## `/healthcheck` (GET)
//!
//!   Returns HTTP 200 (OK) and the JSON body `{"ok":"healthy"}` when the service is operational.

mod api_error;
mod model;
mod page;
mod routes;
pub mod server;

pub use server::new;
