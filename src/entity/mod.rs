//! Database entity models for session-profile-gate.
//!
//! This module contains the Sea-ORM entity definitions used by
//! [`ProfileStore`](crate::ProfileStore). The gate itself only reads the
//! completeness flag; the remaining columns are written by the
//! profile-completion form.

/// Profile entity model for Sea-ORM database interaction.
///
/// Contains the database schema representation of the `profiles` table.
pub mod profile;
