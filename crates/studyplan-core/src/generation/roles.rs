//! Role table: the personas the pipeline hands to the generation client.
//!
//! Roles differ only in data (a persona and an instruction template), so
//! they are described in an embedded `roles.toml` rather than as types.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;

/// Identifies one of the three pipeline roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKey {
    SyllabusAnalyzer,
    ScheduleArchitect,
    ResourceRecommender,
}

impl RoleKey {
    pub const ALL: [Self; 3] = [
        Self::SyllabusAnalyzer,
        Self::ScheduleArchitect,
        Self::ResourceRecommender,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SyllabusAnalyzer => "syllabus_analyzer",
            Self::ScheduleArchitect => "schedule_architect",
            Self::ResourceRecommender => "resource_recommender",
        }
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persona plus the instruction template used when invoking it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleSpec {
    pub key: RoleKey,
    /// Display name, e.g. "Syllabus Analyzer".
    pub role: String,
    pub goal: String,
    pub backstory: String,
    /// Instruction text with `{name}` placeholders.
    pub instruction_template: String,
}

impl RoleSpec {
    /// Fill the instruction template.
    ///
    /// Each `{name}` occurrence is replaced by the matching value in a single
    /// pass, so substituted text is never re-scanned. Braces that are not a
    /// known placeholder (such as the JSON examples in the templates) are
    /// left untouched.
    pub fn render_instruction(&self, vars: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.instruction_template.len());
        let mut rest = self.instruction_template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let inner = &rest[open + 1..];
            let hit = vars.iter().find_map(|(name, value)| {
                inner
                    .strip_prefix(name)?
                    .strip_prefix('}')
                    .map(|tail| (*value, tail))
            });
            match hit {
                Some((value, tail)) => {
                    out.push_str(value);
                    rest = tail;
                }
                None => {
                    out.push('{');
                    rest = inner;
                }
            }
        }

        out.push_str(rest);
        out
    }

    /// System prompt describing the persona to the model.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}. {}.\nYour goal: {}.",
            self.role, self.backstory, self.goal
        )
    }
}

/// Errors from loading a role table.
#[derive(Debug, Error)]
pub enum RoleTableError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("role {0} is defined more than once")]
    Duplicate(RoleKey),

    #[error("role {0} is missing")]
    Missing(RoleKey),
}

#[derive(Debug, Deserialize)]
struct RoleFile {
    roles: Vec<RoleSpec>,
}

/// The complete set of pipeline roles.
#[derive(Debug, Clone)]
pub struct RoleTable {
    roles: HashMap<RoleKey, RoleSpec>,
}

/// The embedded role definitions.
static ROLES_TOML: &str = include_str!("roles.toml");

impl RoleTable {
    /// Load the built-in role table.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed or incomplete. The file is
    /// compiled into the binary and covered by tests.
    pub fn builtin() -> Self {
        Self::from_toml_str(ROLES_TOML).expect("embedded roles.toml is invalid")
    }

    /// Parse a role table and check that every [`RoleKey`] appears exactly once.
    pub fn from_toml_str(content: &str) -> Result<Self, RoleTableError> {
        let file: RoleFile = toml::from_str(content)?;

        let mut roles = HashMap::new();
        for role in file.roles {
            let key = role.key;
            if roles.insert(key, role).is_some() {
                return Err(RoleTableError::Duplicate(key));
            }
        }

        if let Some(missing) = RoleKey::ALL.iter().find(|k| !roles.contains_key(*k)) {
            return Err(RoleTableError::Missing(*missing));
        }

        Ok(Self { roles })
    }

    /// Look up a role. Every key is guaranteed present after construction.
    pub fn get(&self, key: RoleKey) -> &RoleSpec {
        &self.roles[&key]
    }
}

impl Default for RoleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_has_all_roles() {
        let table = RoleTable::builtin();
        assert_eq!(table.get(RoleKey::SyllabusAnalyzer).role, "Syllabus Analyzer");
        assert_eq!(table.get(RoleKey::ScheduleArchitect).role, "Schedule Architect");
        assert_eq!(
            table.get(RoleKey::ResourceRecommender).role,
            "Resource Recommender"
        );
    }

    #[test]
    fn builtin_templates_carry_their_placeholders() {
        let table = RoleTable::builtin();
        let syllabus = &table.get(RoleKey::SyllabusAnalyzer).instruction_template;
        assert!(syllabus.contains("{syllabus}"));

        let schedule = &table.get(RoleKey::ScheduleArchitect).instruction_template;
        for placeholder in ["{duration_days}", "{subjects}", "{learning_style}"] {
            assert!(schedule.contains(placeholder), "missing {placeholder}");
        }

        let resources = &table.get(RoleKey::ResourceRecommender).instruction_template;
        assert!(resources.contains("{topics}"));
        assert!(resources.contains("{learning_style}"));
    }

    #[test]
    fn render_replaces_only_known_placeholders() {
        let table = RoleTable::builtin();
        let text = table
            .get(RoleKey::SyllabusAnalyzer)
            .render_instruction(&[("syllabus", "Unit 1: Limits")]);
        assert!(text.contains("SYLLABUS:\nUnit 1: Limits"));
        assert!(!text.contains("{syllabus}"));
        // The JSON example braces survive.
        assert!(text.contains("\"total_estimated_hours\": 100"));
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let table = RoleTable::builtin();
        let text = table.get(RoleKey::ScheduleArchitect).render_instruction(&[
            ("duration_days", "14"),
            ("subjects", "[\"{learning_style}\"]"),
            ("learning_style", "visual"),
        ]);
        assert!(text.starts_with("Create a 14-day study schedule."));
        assert!(text.contains("Subjects: [\"{learning_style}\"]"));
        assert!(text.contains("Learning Style: visual"));
    }

    #[test]
    fn system_prompt_mentions_role_and_goal() {
        let table = RoleTable::builtin();
        let prompt = table.get(RoleKey::ResourceRecommender).system_prompt();
        assert!(prompt.contains("Resource Recommender"));
        assert!(prompt.contains("Suggest relevant study materials"));
    }

    #[test]
    fn missing_role_is_rejected() {
        let toml_str = r#"
[[roles]]
key = "syllabus_analyzer"
role = "A"
goal = "g"
backstory = "b"
instruction_template = "t"
"#;
        let err = RoleTable::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, RoleTableError::Missing(RoleKey::ScheduleArchitect)));
    }

    #[test]
    fn duplicate_role_is_rejected() {
        let one = r#"
[[roles]]
key = "syllabus_analyzer"
role = "A"
goal = "g"
backstory = "b"
instruction_template = "t"
"#;
        let err = RoleTable::from_toml_str(&one.repeat(2)).unwrap_err();
        assert!(matches!(err, RoleTableError::Duplicate(RoleKey::SyllabusAnalyzer)));
    }

    #[test]
    fn unknown_role_key_is_a_parse_error() {
        let toml_str = r#"
[[roles]]
key = "tutor"
role = "A"
goal = "g"
backstory = "b"
instruction_template = "t"
"#;
        let err = RoleTable::from_toml_str(toml_str).unwrap_err();
        assert!(matches!(err, RoleTableError::TomlError(_)));
    }
}
