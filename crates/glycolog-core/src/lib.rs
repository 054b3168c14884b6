//! # Glycolog Core Library
//!
//! Client-side logic for a diabetes companion app: a glycemia log mirrored
//! from a remote store, account login/registration, and reading statistics.
//! The CLI binary is a thin layer over this crate.
//!
//! ## Key Components
//!
//! - [`GlycemiaLog`]: refresh/submit/delete against the store, server-trust only
//! - [`Reading`]: one measurement, with its timestamp normalized or flagged invalid
//! - [`Severity`]: low/normal/high classification of a value
//! - [`StoreClient`]: HTTP access to the remote store
//! - [`Session`] and [`gate`]: explicit login state and screen gating
//! - [`Config`]: application configuration management

pub mod account;
pub mod config;
pub mod error;
pub mod log;
pub mod reading;
pub mod session;
pub mod stats;
pub mod store;

pub use account::{AccountClient, Answer, RegistrationForm};
pub use config::Config;
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use log::{EntryForm, GlycemiaLog, OpKind, OpState, PendingDelete, SubmitReceipt};
pub use reading::{normalize_value_input, Reading, ReadingTime, ReadingValue, Severity};
pub use session::{gate, Screen, Session, SessionUser};
pub use stats::{daily_averages, DailyAverage, Summary};
pub use store::StoreClient;
