use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// the name of a block device, e.g. `sda` or `md0`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DeviceName(String);

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum InvalidDeviceName {
    #[error("device name is empty")]
    Empty,
    #[error("device name contains whitespace: {0:?}")]
    Whitespace(String),
}

// === impl DeviceName ===

impl DeviceName {
    pub fn as_str(&self) -> &str {
        let Self(name) = self;
        name
    }
}

impl FromStr for DeviceName {
    type Err = InvalidDeviceName;
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.is_empty() {
            return Err(InvalidDeviceName::Empty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(InvalidDeviceName::Whitespace(name.to_owned()));
        }

        Ok(Self(name.to_owned()))
    }
}

impl Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
