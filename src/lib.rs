//! Post-provisioning verification for PostgreSQL hosts.
//!
//! A fixed battery of read-only checks (backup tooling, systemd timer,
//! container health, listening socket, database contents) runs against a
//! local, ssh or docker target and produces a [`report::Report`].

pub mod check;
pub mod commands;
pub mod config;
pub mod error;
pub mod harness;
pub mod host;
pub mod report;
