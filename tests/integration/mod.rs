//! Integration tests for pgverify
//!
//! `scenarios` drives the full check battery against a scripted host;
//! `local_host` exercises the local transport against real files, processes
//! and sockets.

pub mod helpers;
pub mod local_host;
pub mod scenarios;
