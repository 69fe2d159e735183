use std::fmt;

use super::DomainError;

/// Languages accepted for judging, keyed by the external judge's language id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
    Java,
    Python,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::C, Language::Cpp, Language::Java, Language::Python];

    pub fn judge_id(self) -> i32 {
        match self {
            Language::C => 103,
            Language::Cpp => 105,
            Language::Java => 91,
            Language::Python => 100,
        }
    }

    pub fn from_judge_id(id: i32) -> Result<Self, DomainError> {
        Self::ALL
            .into_iter()
            .find(|language| language.judge_id() == id)
            .ok_or(DomainError::UnsupportedLanguage(id))
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Python => "python",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for Language {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_judge_id(value)
    }
}
