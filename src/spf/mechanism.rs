use std::fmt;

/// Disposition attached to a mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Qualifier {
    #[default]
    Pass,
    Fail,
    SoftFail,
    Neutral,
}

impl Qualifier {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Pass),
            '-' => Some(Self::Fail),
            '~' => Some(Self::SoftFail),
            '?' => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Pass => '+',
            Self::Fail => '-',
            Self::SoftFail => '~',
            Self::Neutral => '?',
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MechanismKind {
    Version,
    A,
    Mx,
    Ptr,
    Ip4,
    Ip6,
    Include,
    Redirect,
    Exists,
    All,
    /// Unrecognised `name` or `name:value` term, kept verbatim.
    Unknown(String),
    /// Unrecognised `name=value` term (e.g. `exp=`), kept verbatim.
    UnknownModifier(String),
}

static KNOWN_KINDS: phf::Map<&'static str, MechanismKind> = phf::phf_map! {
    "v" => MechanismKind::Version,
    "a" => MechanismKind::A,
    "mx" => MechanismKind::Mx,
    "ptr" => MechanismKind::Ptr,
    "ip4" => MechanismKind::Ip4,
    "ip6" => MechanismKind::Ip6,
    "include" => MechanismKind::Include,
    "redirect" => MechanismKind::Redirect,
    "exists" => MechanismKind::Exists,
    "all" => MechanismKind::All,
};

impl MechanismKind {
    /// Maps a term name to its kind. Known names match ASCII
    /// case-insensitively; `modifier` tells whether the term used `=`.
    pub(crate) fn from_name(name: &str, modifier: bool) -> Self {
        if let Some(kind) = KNOWN_KINDS.get(name.to_ascii_lowercase().as_str()) {
            return kind.clone();
        }
        if modifier {
            Self::UnknownModifier(name.to_string())
        } else {
            Self::Unknown(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Version => "v",
            Self::A => "a",
            Self::Mx => "mx",
            Self::Ptr => "ptr",
            Self::Ip4 => "ip4",
            Self::Ip6 => "ip6",
            Self::Include => "include",
            Self::Redirect => "redirect",
            Self::Exists => "exists",
            Self::All => "all",
            Self::Unknown(name) | Self::UnknownModifier(name) => name,
        }
    }

    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Self::Version | Self::Redirect | Self::UnknownModifier(_)
        )
    }

    /// Terms that cost a DNS query when the record is evaluated.
    pub fn requires_lookup(&self) -> bool {
        matches!(
            self,
            Self::A | Self::Mx | Self::Ptr | Self::Exists | Self::Include | Self::Redirect
        )
    }
}

impl fmt::Display for MechanismKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One qualifier/kind/value term of an SPF record.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mechanism {
    qualifier: Qualifier,
    #[cfg_attr(feature = "with-serde", serde(rename = "type"))]
    kind: MechanismKind,
    value: String,
}

impl Mechanism {
    pub fn new(qualifier: Qualifier, kind: MechanismKind, value: impl Into<String>) -> Self {
        Self {
            qualifier,
            kind,
            value: value.into(),
        }
    }

    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    pub fn kind(&self) -> &MechanismKind {
        &self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_version(&self) -> bool {
        self.kind == MechanismKind::Version
    }

    pub fn is_all(&self) -> bool {
        self.kind == MechanismKind::All
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifier != Qualifier::Pass {
            write!(f, "{}", self.qualifier)?;
        }
        f.write_str(self.kind.as_str())?;
        if !self.value.is_empty() && !self.is_all() {
            let separator = if self.kind.is_modifier() { '=' } else { ':' };
            write!(f, "{separator}{}", self.value)?;
        }
        Ok(())
    }
}

/// Renders mechanisms back into a space separated record.
pub fn render_record(mechanisms: &[Mechanism]) -> String {
    mechanisms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(feature = "with-serde")]
impl serde::Serialize for Qualifier {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

#[cfg(feature = "with-serde")]
impl serde::Serialize for MechanismKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
