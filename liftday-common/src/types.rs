//! Closed domain enumerations
//!
//! All of these are stored as TEXT in SQLite and round-trip through
//! sqlx/serde with snake_case spellings. Free-form role strings are
//! deliberately not accepted anywhere.

use serde::{Deserialize, Serialize};

/// Athlete gender (competition categories are split by gender)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// The two competition lifts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Discipline {
    Snatch,
    CleanAndJerk,
}

/// Attempt lifecycle status
///
/// Attempts are created `Open` and the transition to `Closed` is
/// terminal; there is no draft or cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttemptStatus {
    Open,
    Closed,
}

/// Verdict derived by the consensus engine, set at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Failed,
}

/// Per-competition official roles
///
/// `Judge` and `Jury` are the voting panel roles; `Secretary` runs the
/// draw and the lifting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CompetitionRole {
    Secretary,
    Judge,
    Jury,
}

impl CompetitionRole {
    /// Whether this role casts votes on attempts
    pub fn is_panel_role(self) -> bool {
        matches!(self, CompetitionRole::Judge | CompetitionRole::Jury)
    }
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl Discipline {
    pub fn as_str(self) -> &'static str {
        match self {
            Discipline::Snatch => "snatch",
            Discipline::CleanAndJerk => "clean_and_jerk",
        }
    }
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Passed => "passed",
            Verdict::Failed => "failed",
        }
    }
}

impl CompetitionRole {
    pub fn as_str(self) -> &'static str {
        match self {
            CompetitionRole::Secretary => "secretary",
            CompetitionRole::Judge => "judge",
            CompetitionRole::Jury => "jury",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_json_spelling_is_snake_case() {
        let json = serde_json::to_string(&Discipline::CleanAndJerk).unwrap();
        assert_eq!(json, "\"clean_and_jerk\"");
        let back: Discipline = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Discipline::CleanAndJerk);
    }

    #[test]
    fn panel_roles() {
        assert!(CompetitionRole::Judge.is_panel_role());
        assert!(CompetitionRole::Jury.is_panel_role());
        assert!(!CompetitionRole::Secretary.is_panel_role());
    }
}
