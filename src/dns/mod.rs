//! DNS listener.
//!
//! hostgate listens on UDP and TCP. Every request is decoded by [`trust_dns_server`], handed
//! to the [`Dispatcher`][dispatcher::Dispatcher] and from there to the
//! [`Engine`][crate::engine::Engine], which decides whether to answer locally, redirect or
//! proxy upstream.
//!
//! # Overrides
//!
//! With a hosts file like:
//!
//! ```text
//! # name            target
//! printer.lan       192.168.1.20
//! *.dev.lan         127.0.0.1
//! mirror.lan        mirror.example.com
//! ```
//!
//! An `A` query for `printer.lan` is answered locally:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 +short printer.lan A
//! 192.168.1.20
//! ```
//!
//! Any name below `dev.lan` (but not `dev.lan` itself) resolves to `127.0.0.1`, and
//! `mirror.lan` resolves to whatever single address upstream returns for
//! `mirror.example.com`:
//!
//! ```bash
//! ❯ dig @127.0.0.1 -p 5353 +short api.dev.lan A
//! 127.0.0.1
//! ❯ dig @127.0.0.1 -p 5353 +short mirror.lan A
//! 93.184.216.34
//! ```
//!
//! # Proxying
//!
//! Every other query (no matching override, a type other than `A`, ...) is forwarded unchanged
//! to one of the configured nameservers, chosen at random, over the same transport the client
//! used. Its response is relayed verbatim. If the upstream doesn't answer in time the client
//! gets `REFUSED`.

pub mod dispatcher;
mod handlers;
pub mod server;

pub use dispatcher::Dispatcher;
pub use server::new;
