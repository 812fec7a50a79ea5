//! Weighted decision policy.
//!
//! Fuses the statistical scores, metadata flags, keyword matches and the
//! resample-discrepancy score into a composite `stego_score` and a
//! three-tier verdict. Escalation only ever raises severity.

use serde::Serialize;

/// Three-tier verdict, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Decision {
    /// No significant signals; the image may be watermarked and passed on.
    #[serde(rename = "ALLOW")]
    Allow,
    /// Enough signal to quarantine for review.
    #[serde(rename = "SUSPICIOUS")]
    Suspicious,
    /// Strong signal; the image should be rejected.
    #[serde(rename = "BLOCK")]
    Block,
}

impl Decision {
    /// Raise the verdict one severity level. [`Decision::Block`] stays put.
    #[must_use]
    pub fn escalate(self) -> Self {
        match self {
            Self::Allow => Self::Suspicious,
            Self::Suspicious | Self::Block => Self::Block,
        }
    }

    /// Upper-case label used in caller-facing output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Suspicious => "SUSPICIOUS",
            Self::Block => "BLOCK",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scoring weights and decision thresholds.
///
/// The defaults are hand-tuned against the keyword/entropy signals this
/// crate computes; treat them as policy parameters, not fixed truths.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Weight of the LSB-plane entropy term.
    pub lsb_weight: f32,
    /// Weight of the global entropy term (entropy is divided by 8 first).
    pub global_weight: f32,
    /// Weight of the blockiness term.
    pub blockiness_weight: f32,
    /// Flat addition when any metadata flag is present.
    pub metadata_weight: f32,
    /// Composite score at or above which the base verdict is SUSPICIOUS.
    pub suspicious_threshold: f32,
    /// Composite score at or above which the base verdict is BLOCK.
    pub block_threshold: f32,
    /// RDR score at or above which the verdict is escalated one level.
    pub rdr_escalation_threshold: f32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            lsb_weight: 0.35,
            global_weight: 0.15,
            blockiness_weight: 0.25,
            metadata_weight: 0.6,
            suspicious_threshold: 0.55,
            block_threshold: 0.85,
            rdr_escalation_threshold: 0.5,
        }
    }
}

impl PolicyConfig {
    /// Composite steganography score, clamped to `[0, 1]`.
    #[must_use]
    pub fn stego_score(
        &self,
        lsb_entropy: f32,
        global_entropy: f32,
        blockiness: f32,
        has_metadata_flags: bool,
    ) -> f32 {
        let metadata_term = if has_metadata_flags {
            self.metadata_weight
        } else {
            0.0
        };
        let score = self.lsb_weight * lsb_entropy
            + self.global_weight * (global_entropy / 8.0)
            + self.blockiness_weight * blockiness
            + metadata_term;
        score.clamp(0.0, 1.0)
    }

    /// Final verdict from the composite score plus escalation signals.
    ///
    /// Base verdict from the score thresholds, then in fixed order:
    /// 1. RDR at or above its threshold raises the verdict one level.
    /// 2. Any keyword-matched recognized region forces at least SUSPICIOUS.
    ///
    /// Each step only raises severity; BLOCK is never downgraded.
    #[must_use]
    pub fn decide(&self, stego_score: f32, rdr_score: f32, has_keyword_match: bool) -> Decision {
        let mut decision = if stego_score >= self.block_threshold {
            Decision::Block
        } else if stego_score >= self.suspicious_threshold {
            Decision::Suspicious
        } else {
            Decision::Allow
        };

        if rdr_score >= self.rdr_escalation_threshold {
            decision = decision.escalate();
        }
        if has_keyword_match {
            decision = decision.max(Decision::Suspicious);
        }
        decision
    }
}
