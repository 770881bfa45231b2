// Copyright © 2025 Valve Corporation
// SPDX-License-Identifier: MIT

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum DebugFlag {
    /// Validate the program before and after delay insertion
    Validate = 0,
    /// Skip merging adjacent s_delay_alu
    NoCombine = 1,
    /// Print the program after delay insertion
    Print = 2,
    /// Don't insert s_delay_alu at all
    NoDelay = 3,
}

impl DebugFlag {
    const ALL: [DebugFlag; 4] = [
        DebugFlag::Validate,
        DebugFlag::NoCombine,
        DebugFlag::Print,
        DebugFlag::NoDelay,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DebugFlag::Validate => "validate",
            DebugFlag::NoCombine => "nocombine",
            DebugFlag::Print => "print",
            DebugFlag::NoDelay => "nodelay",
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("unknown ACO_DEBUG flag: {0}")]
pub struct UnknownDebugFlag(pub String);

impl FromStr for DebugFlag {
    type Err = UnknownDebugFlag;

    fn from_str(flag: &str) -> Result<Self, Self::Err> {
        DebugFlag::ALL
            .into_iter()
            .find(|f| f.name() == flag)
            .ok_or_else(|| UnknownDebugFlag(flag.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DebugFlags(u32);

impl DebugFlags {
    pub fn contains(&self, flag: DebugFlag) -> bool {
        self.0 & (1 << (flag as u8)) != 0
    }

    pub fn insert(&mut self, flag: DebugFlag) {
        self.0 |= 1 << (flag as u8);
    }

    /// Parses a comma-separated flag list.  Unknown flags are reported and
    /// otherwise ignored.
    pub fn parse(flags: &str) -> DebugFlags {
        let mut debug = DebugFlags::default();
        for flag in flags.split(',') {
            let flag = flag.trim();
            if flag.is_empty() {
                continue;
            }
            match flag.parse::<DebugFlag>() {
                Ok(flag) => debug.insert(flag),
                Err(e) => log::warn!("{e}"),
            }
        }
        debug
    }

    fn from_env() -> DebugFlags {
        match env::var("ACO_DEBUG") {
            Ok(flags) => DebugFlags::parse(&flags),
            Err(_) => DebugFlags::default(),
        }
    }
}

impl fmt::Display for DebugFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = DebugFlag::ALL
            .iter()
            .filter(|flag| self.contains(**flag))
            .map(|flag| flag.name())
            .collect();
        f.write_str(&names.join(","))
    }
}

static DEBUG_FLAGS: OnceLock<DebugFlags> = OnceLock::new();

pub struct Debug;

pub static DEBUG: Debug = Debug;

pub trait GetDebugFlags {
    fn debug_flags(&self) -> DebugFlags;

    fn validate(&self) -> bool {
        self.debug_flags().contains(DebugFlag::Validate)
    }

    fn no_combine(&self) -> bool {
        self.debug_flags().contains(DebugFlag::NoCombine)
    }

    fn print(&self) -> bool {
        self.debug_flags().contains(DebugFlag::Print)
    }

    fn no_delay(&self) -> bool {
        self.debug_flags().contains(DebugFlag::NoDelay)
    }
}

impl GetDebugFlags for Debug {
    fn debug_flags(&self) -> DebugFlags {
        *DEBUG_FLAGS.get_or_init(DebugFlags::from_env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let flags = DebugFlags::parse("validate,print");
        assert!(flags.contains(DebugFlag::Validate));
        assert!(flags.contains(DebugFlag::Print));
        assert!(!flags.contains(DebugFlag::NoCombine));
        assert_eq!(flags.to_string(), "validate,print");
    }

    #[test]
    fn test_unknown_flag_is_ignored() {
        let flags = DebugFlags::parse("nocombine,,bogus, nodelay");
        assert!(flags.contains(DebugFlag::NoCombine));
        assert!(flags.contains(DebugFlag::NoDelay));
        assert_eq!(flags.to_string(), "nocombine,nodelay");

        assert_eq!(
            "bogus".parse::<DebugFlag>(),
            Err(UnknownDebugFlag("bogus".to_string()))
        );
    }
}
