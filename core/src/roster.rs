//! Rostered players and their simulation attributes.

use crate::types::{PlayerId, TeamId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerRole {
    Passer,
    Rusher,
    Receiver,
    Defender,
}

impl PlayerRole {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Passer   => "passer",
            Self::Rusher   => "rusher",
            Self::Receiver => "receiver",
            Self::Defender => "defender",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passer"   => Some(Self::Passer),
            "rusher"   => Some(Self::Rusher),
            "receiver" => Some(Self::Receiver),
            "defender" => Some(Self::Defender),
            _ => None,
        }
    }
}

/// Attributes are 0..=100. The generator treats them as probability
/// weights, never as hard gates — a 1-speed rusher can still break one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id:       PlayerId,
    pub team_id:  TeamId,
    pub name:     String,
    pub role:     PlayerRole,
    pub throwing: u8,
    pub catching: u8,
    pub speed:    u8,
    pub power:    u8,
    pub agility:  u8,
}
