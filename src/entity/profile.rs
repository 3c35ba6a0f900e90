//! Profile entity model for Sea-ORM database interaction.
//!
//! This module defines the database schema representation for member
//! profiles. Rows are keyed by the backend user id of the session that owns
//! them.

use sea_orm::entity::prelude::*;

/// Sea-ORM entity model representing a member profile.
///
/// # Database Schema
///
/// | Column              | Type               | Description                              |
/// |---------------------|--------------------|------------------------------------------|
/// | id                  | TEXT (Primary Key) | Backend user id                          |
/// | email               | TEXT               | Account email from the auth provider     |
/// | full_name           | TEXT               | Mandatory for completion                 |
/// | company             | TEXT               | Mandatory for completion                 |
/// | job_title           | TEXT               | Mandatory for completion                 |
/// | industry            | TEXT               |                                          |
/// | location            | TEXT               |                                          |
/// | linkedin_url        | TEXT               |                                          |
/// | bio                 | TEXT               |                                          |
/// | phone_number        | TEXT               |                                          |
/// | batch_year          | TEXT               |                                          |
/// | dob                 | DATE               | Date of birth                            |
/// | job_start_date      | DATE               |                                          |
/// | tags                | JSON               | Array of up to three interest tags       |
/// | is_profile_complete | BOOLEAN            | Gate flag; NULL means not complete       |
/// | updated_at          | TIMESTAMPTZ        | Last write                               |
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// The backend user id owning this profile.
    ///
    /// Serves as the primary key. It is the same id the auth provider reports
    /// in a session, so rows are never keyed by a generated value.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    /// Account email as reported by the auth provider at completion time.
    pub email: Option<String>,

    /// Display name. One of the three fields the completion form requires.
    pub full_name: Option<String>,

    /// Current employer. Required by the completion form.
    pub company: Option<String>,

    /// Current role. Required by the completion form.
    pub job_title: Option<String>,

    pub industry: Option<String>,

    /// City, usually first written at signup.
    pub location: Option<String>,

    pub linkedin_url: Option<String>,

    /// Free-text introduction shown on the member card.
    pub bio: Option<String>,

    pub phone_number: Option<String>,

    /// Graduation batch, kept as entered (e.g. `"2019"`).
    pub batch_year: Option<String>,

    /// Date of birth, parsed from the `DD/MM/YYYY` input. NULL when the input
    /// was not a full calendar date.
    pub dob: Option<Date>,

    /// Start of the current job, parsed the same way as `dob`.
    pub job_start_date: Option<Date>,

    /// JSON array of at most three trimmed interest tags.
    pub tags: Option<Json>,

    /// The completeness flag read by the gate.
    ///
    /// Only saving the completion form sets it to `true`. NULL and `false`
    /// both keep the owner on the completion screen.
    pub is_profile_complete: Option<bool>,

    /// Timestamp of the last write through [`ProfileStore`](crate::ProfileStore).
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether the gate should let this profile's owner into the application.
    pub fn is_complete(&self) -> bool {
        self.is_profile_complete.unwrap_or(false)
    }
}

/// Profiles have no relations to other entities.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
