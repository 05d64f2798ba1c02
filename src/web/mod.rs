//! HTTP service for running analyses in the background.
//!
//! Each POST starts an analysis of one run directory under the runs root on a
//! blocking worker; clients poll for the result with the returned task id.
//!
//! ## Starting the Server
//!
//! ```text
//! # Default port 8080, token from AMPLICOUNT_TOKEN
//! amplicount serve --runs-root /runs --plate-map plate.csv --amplicon-map amps.csv
//!
//! # Extra amplicon panel selectable with ?season=winter
//! amplicount serve --runs-root /runs --plate-map plate.csv --amplicon-map amps.csv \
//!     --season winter=amps_winter.csv --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `GET /health` - Liveness check
//! - `POST /swabseq/{run_id}?season=NAME` - Start an analysis, returns `{id, status}`
//! - `GET /swabseq/{run_id}/{task_id}` - Task status, with results once ready
//!
//! Non-GET requests need `Authorization: Bearer <token>` when a token is configured.

pub mod server;
pub mod tasks;
