//! Seed phrase generation and parsing, derivation happens outside of the core

use bip39::{Language, Mnemonic};
use rand::Rng as _;

#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, uniffi::Enum)]
pub enum NumberOfBip39Words {
    Twelve,
    TwentyFour,
}

impl NumberOfBip39Words {
    pub const fn to_word_count(self) -> usize {
        match self {
            NumberOfBip39Words::Twelve => 12,
            NumberOfBip39Words::TwentyFour => 24,
        }
    }

    pub const fn to_entropy_bits(self) -> usize {
        match self {
            NumberOfBip39Words::Twelve => 128,
            NumberOfBip39Words::TwentyFour => 256,
        }
    }

    pub fn generate_mnemonic(self) -> Result<Mnemonic, bip39::Error> {
        match self {
            // 128 / 8 = 16
            NumberOfBip39Words::Twelve => {
                Mnemonic::from_entropy(&rand::rng().random::<[u8; 16]>())
            }
            // 256 / 8 = 32
            NumberOfBip39Words::TwentyFour => {
                Mnemonic::from_entropy(&rand::rng().random::<[u8; 32]>())
            }
        }
    }
}

/// Parse a phrase typed or pasted by the user, casing and extra whitespace are ignored
pub fn parse_mnemonic(phrase: &str) -> Result<Mnemonic, bip39::Error> {
    let phrase = phrase
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<String>>()
        .join(" ");

    Mnemonic::parse_in(Language::English, &phrase)
}
