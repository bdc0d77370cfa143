// Library root
// ------------
// jflint validates a Declarative Jenkinsfile by handing it to a running
// Jenkins and printing the answer. The binary (`main.rs`) is a thin shell
// over these modules.
//
// Module responsibilities:
// - `api`: the HTTP exchange with Jenkins (crumb issuer, validate endpoint).
// - `config`: flag/env/file layering into a single `Config`.
// - `cli`: clap definitions, the `version` subcommand and the lint flow.
// - `error`: the error type shared by all of the above.
pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use error::{Error, Result};
