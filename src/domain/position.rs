//! Discrete position state machine.

use std::fmt;

/// Spread exposure: long means long y and short beta units of x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long,
    Short,
}

impl Position {
    pub fn direction(self) -> i8 {
        match self {
            Position::Flat => 0,
            Position::Long => 1,
            Position::Short => -1,
        }
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.direction())
    }

    pub fn is_flat(self) -> bool {
        self == Position::Flat
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Flat => write!(f, "FLAT"),
            Position::Long => write!(f, "LONG"),
            Position::Short => write!(f, "SHORT"),
        }
    }
}

/// Turn per-bar signals into positions.
///
/// Bar 0 is always flat. After that a long entry wins over a short entry,
/// which wins over an exit; with no signal the previous position carries.
pub fn generate_positions(long_entry: &[bool], short_entry: &[bool], exit_trade: &[bool]) -> Vec<Position> {
    let n = long_entry.len().min(short_entry.len()).min(exit_trade.len());
    let mut positions = vec![Position::Flat; n];

    for i in 1..n {
        positions[i] = if long_entry[i] {
            Position::Long
        } else if short_entry[i] {
            Position::Short
        } else if exit_trade[i] {
            Position::Flat
        } else {
            positions[i - 1]
        };
    }
    positions
}
