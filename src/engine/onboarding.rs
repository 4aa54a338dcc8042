//! First-run onboarding sequence.
//!
//! The sequence only runs when the durable `initialized` marker is missing.
//! It walks handshake → authenticating → success → hold → close on fixed
//! offsets from its start, then finishes. The marker is written at the end,
//! so a restart part-way through begins again at the handshake.

use std::time::Duration;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    /// Returning user; the sequence never runs.
    Dormant,
    Handshake,
    Authenticating,
    Success,
    Hold,
    Close,
    Done,
}

impl OnboardingStage {
    /// Numeric stage shown by the splash screen, `0..=4` while active.
    pub fn index(&self) -> Option<u8> {
        match self {
            Self::Handshake => Some(0),
            Self::Authenticating => Some(1),
            Self::Success => Some(2),
            Self::Hold => Some(3),
            Self::Close => Some(4),
            Self::Dormant | Self::Done => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.index().is_some()
    }

    fn successor(&self) -> Option<Self> {
        match self {
            Self::Handshake => Some(Self::Authenticating),
            Self::Authenticating => Some(Self::Success),
            Self::Success => Some(Self::Hold),
            Self::Hold => Some(Self::Close),
            Self::Close => Some(Self::Done),
            Self::Dormant | Self::Done => None,
        }
    }
}

/// Offsets from sequence start at which each stage is entered.
pub const STAGE_OFFSETS: [(OnboardingStage, Duration); 5] = [
    (OnboardingStage::Authenticating, Duration::from_millis(1000)),
    (OnboardingStage::Success, Duration::from_millis(2500)),
    (OnboardingStage::Hold, Duration::from_millis(4000)),
    (OnboardingStage::Close, Duration::from_millis(5500)),
    (OnboardingStage::Done, Duration::from_millis(6000)),
];

#[derive(Debug, Clone)]
pub struct Onboarding {
    stage: OnboardingStage,
}

impl Onboarding {
    pub fn new(initialized: bool) -> Self {
        let stage = if initialized {
            OnboardingStage::Dormant
        } else {
            OnboardingStage::Handshake
        };
        Self { stage }
    }

    pub fn stage(&self) -> OnboardingStage {
        self.stage
    }

    pub fn is_active(&self) -> bool {
        self.stage.is_active()
    }

    /// Timers to schedule when the sequence starts. Empty for returning users.
    pub fn plan(&self) -> &'static [(OnboardingStage, Duration)] {
        if self.stage == OnboardingStage::Handshake {
            &STAGE_OFFSETS
        } else {
            &[]
        }
    }

    /// Enter `next` if it directly follows the current stage. Anything else
    /// (a skip, a replay, or a stray timer) is refused.
    pub fn advance_to(&mut self, next: OnboardingStage) -> bool {
        if self.stage.successor() == Some(next) {
            self.stage = next;
            true
        } else {
            false
        }
    }
}
