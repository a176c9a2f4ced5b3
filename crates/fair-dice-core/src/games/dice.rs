//! Dice and dice set configuration.

use crate::protocol::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

/// A die: an ordered sequence of integer faces.
///
/// Faces need not be distinct or form `1..=n`; negative faces are fine.
/// At least two faces are required so a roll is a real draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDie")]
pub struct Die {
    faces: Vec<i64>,
}

#[derive(Deserialize)]
struct RawDie {
    faces: Vec<i64>,
}

impl TryFrom<RawDie> for Die {
    type Error = ProtocolError;

    fn try_from(raw: RawDie) -> Result<Self, Self::Error> {
        Die::new(raw.faces)
    }
}

impl Die {
    pub fn new(faces: Vec<i64>) -> Result<Self, ProtocolError> {
        if faces.len() < 2 {
            return Err(ProtocolError::InvalidConfiguration(format!(
                "a die needs at least 2 faces, got {}",
                faces.len()
            )));
        }
        Ok(Self { faces })
    }

    pub fn faces(&self) -> &[i64] {
        &self.faces
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn face(&self, index: usize) -> Option<i64> {
        self.faces.get(index).copied()
    }
}

impl FromStr for Die {
    type Err = ProtocolError;

    /// Parse a comma-separated face list such as `2,2,4,4,9,9`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ProtocolError::InvalidConfiguration(
                "empty die".to_string(),
            ));
        }
        let faces = s
            .split(',')
            .map(|face| {
                face.trim().parse::<i64>().map_err(|_| {
                    ProtocolError::InvalidConfiguration(format!(
                        "face {:?} in die {:?} is not an integer",
                        face.trim(),
                        s
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(faces)
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.faces.iter().map(i64::to_string).collect();
        write!(f, "[{}]", faces.join(","))
    }
}

/// How the system side gets its die
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMode {
    /// The system's die is picked by a fair draw over the dice still available
    #[default]
    Automatic,
    /// The presentation layer picks both sides' dice
    Manual,
}

impl SelectionMode {
    /// Fewest dice a round needs under this mode
    pub fn min_dice(&self) -> usize {
        match self {
            // The system may pick second and needs at least two left to draw from.
            SelectionMode::Automatic => 3,
            SelectionMode::Manual => 2,
        }
    }

    pub fn validate(&self, dice: &DiceSet) -> Result<(), ProtocolError> {
        if dice.len() < self.min_dice() {
            return Err(ProtocolError::InvalidConfiguration(format!(
                "{:?} selection needs at least {} dice, got {}",
                self,
                self.min_dice(),
                dice.len()
            )));
        }
        Ok(())
    }
}

/// The dice available in a round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDiceSet")]
pub struct DiceSet {
    dice: Vec<Die>,
}

#[derive(Deserialize)]
struct RawDiceSet {
    dice: Vec<Die>,
}

impl TryFrom<RawDiceSet> for DiceSet {
    type Error = ProtocolError;

    fn try_from(raw: RawDiceSet) -> Result<Self, Self::Error> {
        DiceSet::new(raw.dice)
    }
}

impl DiceSet {
    /// Smallest set that can form a round
    pub const MIN_DICE: usize = 2;

    pub fn new(dice: Vec<Die>) -> Result<Self, ProtocolError> {
        if dice.len() < Self::MIN_DICE {
            return Err(ProtocolError::InvalidConfiguration(format!(
                "at least {} dice are required, got {}",
                Self::MIN_DICE,
                dice.len()
            )));
        }
        Ok(Self { dice })
    }

    /// Parse one die per argument
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, ProtocolError> {
        let dice = args
            .iter()
            .map(|arg| arg.as_ref().parse())
            .collect::<Result<Vec<Die>, _>>()?;
        Self::new(dice)
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Die> {
        self.dice.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Die> {
        self.dice.iter()
    }
}

impl Index<usize> for DiceSet {
    type Output = Die;

    fn index(&self, index: usize) -> &Die {
        &self.dice[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_die() {
        let die: Die = "2, 2,4,4,9,9".parse().unwrap();
        assert_eq!(die.faces(), &[2, 2, 4, 4, 9, 9]);
        assert_eq!(die.face_count(), 6);
        assert_eq!(die.to_string(), "[2,2,4,4,9,9]");
    }

    #[test]
    fn test_negative_faces_allowed() {
        let die: Die = "-1,0,-7".parse().unwrap();
        assert_eq!(die.faces(), &[-1, 0, -7]);
        assert_eq!(die.face(2), Some(-7));
        assert_eq!(die.face(3), None);
    }

    #[test]
    fn test_malformed_dice_rejected() {
        for bad in ["", "  ", "1,,2", "1,2.5,3", "a,b", "4"] {
            assert!(
                matches!(
                    bad.parse::<Die>(),
                    Err(ProtocolError::InvalidConfiguration(_))
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_dice_set_minimum() {
        assert!(DiceSet::parse(&["1,2,3"]).is_err());
        assert!(DiceSet::parse::<&str>(&[]).is_err());

        let dice = DiceSet::parse(&["1,2,3", "4,5,6,7"]).unwrap();
        assert_eq!(dice.len(), 2);
        assert_eq!(dice[1].face_count(), 4);
    }

    #[test]
    fn test_deserialize_validates() {
        let dice = DiceSet::parse(&["1,2,3", "4,5,6"]).unwrap();
        let json = serde_json::to_string(&dice).unwrap();
        assert_eq!(serde_json::from_str::<DiceSet>(&json).unwrap(), dice);

        assert!(serde_json::from_str::<Die>(r#"{"faces":[1]}"#).is_err());
        assert!(serde_json::from_str::<DiceSet>(r#"{"dice":[{"faces":[1,2]}]}"#).is_err());
    }

    #[test]
    fn test_selection_mode_minimums() {
        let two = DiceSet::parse(&["1,2", "3,4"]).unwrap();
        let three = DiceSet::parse(&["1,2", "3,4", "5,6"]).unwrap();

        assert!(SelectionMode::Manual.validate(&two).is_ok());
        assert!(SelectionMode::Automatic.validate(&two).is_err());
        assert!(SelectionMode::Automatic.validate(&three).is_ok());
    }
}
