//! Algorithm flags.
//!
//! Flags are plain bit fields so they can be passed around, stored and
//! printed as integers. The low byte of the conjugate gradient flags picks
//! the update rule for β; the higher bits select optional modifiers.

use crate::core::error::{OptimizerError, OptimizerResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fletcher-Reeves rule.
pub const NLCG_FLETCHER_REEVES: u32 = 1;
/// Hestenes-Stiefel rule.
pub const NLCG_HESTENES_STIEFEL: u32 = 2;
/// Polak-Ribière-Polyak rule.
pub const NLCG_POLAK_RIBIERE_POLYAK: u32 = 3;
/// Fletcher "conjugate descent" rule.
pub const NLCG_FLETCHER: u32 = 4;
/// Liu-Storey rule.
pub const NLCG_LIU_STOREY: u32 = 5;
/// Dai-Yuan rule.
pub const NLCG_DAI_YUAN: u32 = 6;
/// Perry-Shanno memoryless quasi-Newton update.
pub const NLCG_PERRY_SHANNO: u32 = 7;
/// Hager-Zhang rule.
pub const NLCG_HAGER_ZHANG: u32 = 8;
/// Clip β at zero.
pub const NLCG_POWELL: u32 = 1 << 8;
/// Guess the first step of each line search from the previous one.
pub const NLCG_SHANNO_PHUA: u32 = 1 << 9;
/// Default conjugate gradient flags.
pub const NLCG_DEFAULT: u32 = NLCG_HAGER_ZHANG | NLCG_SHANNO_PHUA;

/// Variable metric method emulates BLMVM.
pub const EMULATE_BLMVM: u32 = 1;

const NLCG_RULE_MASK: u32 = 0xff;
const NLCG_KNOWN_BITS: u32 = NLCG_RULE_MASK | NLCG_POWELL | NLCG_SHANNO_PHUA;

/// Update rule for the conjugate gradient parameter β.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NlcgRule {
    /// β = ‖g₁‖² / ‖g₀‖²
    FletcherReeves,
    /// β = ⟨g₁, y⟩ / ⟨d, y⟩
    HestenesStiefel,
    /// β = ⟨g₁, y⟩ / ‖g₀‖²
    PolakRibierePolyak,
    /// β = -‖g₁‖² / ⟨d, g₀⟩
    Fletcher,
    /// β = -⟨g₁, y⟩ / ⟨d, g₀⟩
    LiuStorey,
    /// β = ‖g₁‖² / ⟨d, y⟩
    DaiYuan,
    /// Memoryless BFGS direction.
    PerryShanno,
    /// Hager-Zhang CG_DESCENT rule.
    #[default]
    HagerZhang,
}

impl NlcgRule {
    /// Rule encoded in the low byte of `flags`.
    pub fn from_flags(flags: u32) -> OptimizerResult<Self> {
        match flags & NLCG_RULE_MASK {
            NLCG_FLETCHER_REEVES => Ok(Self::FletcherReeves),
            NLCG_HESTENES_STIEFEL => Ok(Self::HestenesStiefel),
            NLCG_POLAK_RIBIERE_POLYAK => Ok(Self::PolakRibierePolyak),
            NLCG_FLETCHER => Ok(Self::Fletcher),
            NLCG_LIU_STOREY => Ok(Self::LiuStorey),
            NLCG_DAI_YUAN => Ok(Self::DaiYuan),
            NLCG_PERRY_SHANNO => Ok(Self::PerryShanno),
            NLCG_HAGER_ZHANG => Ok(Self::HagerZhang),
            rule => Err(OptimizerError::invalid_argument(format!(
                "unknown conjugate gradient rule {rule}"
            ))),
        }
    }

    /// Flag value of the rule.
    pub fn flag(self) -> u32 {
        match self {
            Self::FletcherReeves => NLCG_FLETCHER_REEVES,
            Self::HestenesStiefel => NLCG_HESTENES_STIEFEL,
            Self::PolakRibierePolyak => NLCG_POLAK_RIBIERE_POLYAK,
            Self::Fletcher => NLCG_FLETCHER,
            Self::LiuStorey => NLCG_LIU_STOREY,
            Self::DaiYuan => NLCG_DAI_YUAN,
            Self::PerryShanno => NLCG_PERRY_SHANNO,
            Self::HagerZhang => NLCG_HAGER_ZHANG,
        }
    }

    /// Name of the rule.
    pub fn name(self) -> &'static str {
        match self {
            Self::FletcherReeves => "Fletcher & Reeves",
            Self::HestenesStiefel => "Hestenes & Stiefel",
            Self::PolakRibierePolyak => "Polak, Ribière & Polyak",
            Self::Fletcher => "Fletcher",
            Self::LiuStorey => "Liu & Storey",
            Self::DaiYuan => "Dai & Yuan",
            Self::PerryShanno => "Perry & Shanno",
            Self::HagerZhang => "Hager & Zhang",
        }
    }
}

impl fmt::Display for NlcgRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded conjugate gradient flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NlcgFlags {
    /// Update rule for β.
    pub rule: NlcgRule,
    /// Clip β at zero.
    pub powell: bool,
    /// Guess the initial step from the previous line search.
    pub shanno_phua: bool,
}

impl NlcgFlags {
    /// Decodes a flag word, rejecting unknown rules and bits.
    pub fn decode(flags: u32) -> OptimizerResult<Self> {
        if flags & !NLCG_KNOWN_BITS != 0 {
            return Err(OptimizerError::invalid_argument(format!(
                "unknown conjugate gradient flags {flags:#x}"
            )));
        }
        Ok(Self {
            rule: NlcgRule::from_flags(flags)?,
            powell: flags & NLCG_POWELL != 0,
            shanno_phua: flags & NLCG_SHANNO_PHUA != 0,
        })
    }

    /// Encodes back into a flag word.
    pub fn bits(self) -> u32 {
        let mut bits = self.rule.flag();
        if self.powell {
            bits |= NLCG_POWELL;
        }
        if self.shanno_phua {
            bits |= NLCG_SHANNO_PHUA;
        }
        bits
    }
}

impl Default for NlcgFlags {
    fn default() -> Self {
        Self {
            rule: NlcgRule::HagerZhang,
            powell: false,
            shanno_phua: true,
        }
    }
}

impl fmt::Display for NlcgFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rule)?;
        if self.powell {
            f.write_str(" with Powell's fix")?;
        }
        if self.shanno_phua {
            f.write_str(if self.powell { " and" } else { " with" })?;
            f.write_str(" Shanno & Phua's step")?;
        }
        Ok(())
    }
}
