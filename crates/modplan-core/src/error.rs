use std::fmt;

/// Machine-readable codes for every problem the resolver can report.
///
/// Codes starting with `E` are errors that withhold the build plan; codes
/// starting with `W` are warnings by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    DuplicateModule,
    InvalidDescriptor,
    UnknownModule,
    MissingDependency,
    DependencyCycle,
    ConflictingDependencyVisibility,
    UnresolvedDynamicModule,
    IncompatiblePchPolicy,
    InternalConsistency,
}

impl ErrorCode {
    /// Stable code identifier (`E####` / `W####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DuplicateModule => "E1001",
            Self::InvalidDescriptor => "E1002",
            Self::UnknownModule => "E1003",
            Self::MissingDependency => "E2001",
            Self::DependencyCycle => "E2002",
            Self::ConflictingDependencyVisibility => "E2003",
            Self::UnresolvedDynamicModule => "W2004",
            Self::IncompatiblePchPolicy => "W3001",
            Self::InternalConsistency => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::DuplicateModule => "Duplicate module name",
            Self::InvalidDescriptor => "Invalid module descriptor",
            Self::UnknownModule => "Unknown module",
            Self::MissingDependency => "Missing dependency",
            Self::DependencyCycle => "Dependency cycle",
            Self::ConflictingDependencyVisibility => "Dependency declared public and private",
            Self::UnresolvedDynamicModule => "Unresolved dynamically loaded module",
            Self::IncompatiblePchPolicy => "Incompatible PCH policy",
            Self::InternalConsistency => "Internal consistency failure",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::DuplicateModule => Some("Rename one of the modules; names must be unique."),
            Self::InvalidDescriptor => Some("Give every module a non-empty name."),
            Self::UnknownModule => None,
            Self::MissingDependency => {
                Some("Add a descriptor for the dependency or remove it from the declaring module.")
            }
            Self::DependencyCycle => {
                Some("Break the loop by moving shared code into a module both sides depend on.")
            }
            Self::ConflictingDependencyVisibility => {
                Some("Declare the dependency once, either as public or as private.")
            }
            Self::UnresolvedDynamicModule => {
                Some("Check the spelling of the dynamically loaded module name.")
            }
            Self::IncompatiblePchPolicy => Some(
                "Give the listed dependencies a PCH mode, or accept that this module builds its own PCH.",
            ),
            Self::InternalConsistency => {
                Some("This is a resolver bug. Report it with the module descriptors attached.")
            }
        }
    }

    /// Returns `true` for codes that are warnings unless escalated.
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(
            self,
            Self::UnresolvedDynamicModule | Self::IncompatiblePchPolicy
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 9] = [
        ErrorCode::DuplicateModule,
        ErrorCode::InvalidDescriptor,
        ErrorCode::UnknownModule,
        ErrorCode::MissingDependency,
        ErrorCode::DependencyCycle,
        ErrorCode::ConflictingDependencyVisibility,
        ErrorCode::UnresolvedDynamicModule,
        ErrorCode::IncompatiblePchPolicy,
        ErrorCode::InternalConsistency,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ALL {
            let s = code.code();
            assert_eq!(s.len(), 5);
            assert!(s.starts_with('E') || s.starts_with('W'));
            assert!(s.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn warning_prefix_matches_classification() {
        for code in ALL {
            assert_eq!(code.is_warning(), code.code().starts_with('W'), "{code}");
        }
    }
}
