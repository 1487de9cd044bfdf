//! Java language versions the parser can target.

/// Supported Java feature releases, ordered so strategy lookup can fall
/// back from a requested version to the nearest lower registered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JavaVersion {
    Java8,
    Java11,
    Java14,
    Java17,
    Java21,
    Java24,
    Java25,
}

impl JavaVersion {
    pub const LATEST: JavaVersion = JavaVersion::Java25;

    /// Map a feature release number (e.g. `21`) to a version.
    pub fn from_feature(feature: u16) -> Option<Self> {
        let version = match feature {
            8 => JavaVersion::Java8,
            11 => JavaVersion::Java11,
            14 => JavaVersion::Java14,
            17 => JavaVersion::Java17,
            21 => JavaVersion::Java21,
            24 => JavaVersion::Java24,
            25 => JavaVersion::Java25,
            _ => return None,
        };
        Some(version)
    }

    pub fn feature(self) -> u16 {
        match self {
            JavaVersion::Java8 => 8,
            JavaVersion::Java11 => 11,
            JavaVersion::Java14 => 14,
            JavaVersion::Java17 => 17,
            JavaVersion::Java21 => 21,
            JavaVersion::Java24 => 24,
            JavaVersion::Java25 => 25,
        }
    }
}

impl std::fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Java {}", self.feature())
    }
}
