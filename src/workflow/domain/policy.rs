//! Keyword routing policy.
//!
//! The policy is plain data: keyword profiles per agent, a priority order
//! for ties, a support table and duration estimates. Scoring is
//! deterministic and independent of profile iteration order.

use super::{Confidence, RoutingPolicyError};
use crate::registry::domain::{AgentName, DEFAULT_AGENT_TYPE};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Version assigned to policies that do not declare one.
pub const DEFAULT_POLICY_VERSION: u32 = 1;

/// Confidence reported for fallback routes, in percent.
pub const DEFAULT_FALLBACK_CONFIDENCE_PERCENT: u32 = 10;

/// Estimate used for agent types without an explicit entry.
pub const DEFAULT_ESTIMATED_MINUTES: u32 = 5;

/// Keyword profile of one routable agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProfile {
    agent: AgentName,
    agent_type: String,
    keywords: BTreeSet<String>,
}

impl AgentProfile {
    /// Creates a profile; keywords are trimmed, lowercased and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingPolicyError::InvalidAgent`] for a malformed agent
    /// name or [`RoutingPolicyError::EmptyProfile`] when no keyword remains.
    pub fn new<I, S>(
        agent: &str,
        agent_type: impl Into<String>,
        keywords: I,
    ) -> Result<Self, RoutingPolicyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = AgentName::new(agent)?;
        let normalized: BTreeSet<String> = keywords
            .into_iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        if normalized.is_empty() {
            return Err(RoutingPolicyError::EmptyProfile(name.to_string()));
        }
        Ok(Self {
            agent: name,
            agent_type: agent_type.into(),
            keywords: normalized,
        })
    }

    /// Scores already case-folded text against this profile.
    ///
    /// Each keyword counts once when it occurs as a substring; the count is
    /// divided by the profile size.
    #[must_use]
    pub fn score(&self, normalized_text: &str) -> Confidence {
        let matched = self
            .keywords
            .iter()
            .filter(|keyword| normalized_text.contains(keyword.as_str()))
            .count();
        Confidence::new(saturate(matched), saturate(self.keywords.len()))
    }

    /// Returns the profiled agent.
    #[must_use]
    pub const fn agent(&self) -> &AgentName {
        &self.agent
    }

    /// Returns the agent's category tag.
    #[must_use]
    pub fn agent_type(&self) -> &str {
        &self.agent_type
    }

    /// Returns the normalised keyword set.
    #[must_use]
    pub const fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }
}

/// Outcome of scoring a request against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSelection {
    /// Selected primary agent.
    pub agent: AgentName,
    /// Score of the selected agent.
    pub confidence: Confidence,
    /// Whether no profile matched and the fallback agent was chosen.
    pub fallback: bool,
}

/// Versioned routing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    version: u32,
    profiles: Vec<AgentProfile>,
    priority: Vec<AgentName>,
    support: BTreeMap<AgentName, Vec<AgentName>>,
    fallback_agent: AgentName,
    fallback_confidence: Confidence,
    default_estimated_minutes: u32,
    estimated_minutes: BTreeMap<String, u32>,
}

impl RoutingPolicy {
    /// Creates an empty policy that always routes to `fallback_agent`.
    #[must_use]
    pub fn new(fallback_agent: AgentName) -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION,
            profiles: Vec::new(),
            priority: Vec::new(),
            support: BTreeMap::new(),
            fallback_agent,
            fallback_confidence: Confidence::new(DEFAULT_FALLBACK_CONFIDENCE_PERCENT, 100),
            default_estimated_minutes: DEFAULT_ESTIMATED_MINUTES,
            estimated_minutes: BTreeMap::new(),
        }
    }

    /// Sets the policy version.
    #[must_use]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Adds a keyword profile.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingPolicyError::DuplicateProfile`] when the agent is
    /// already profiled.
    pub fn with_profile(mut self, profile: AgentProfile) -> Result<Self, RoutingPolicyError> {
        if self.profile(profile.agent()).is_some() {
            return Err(RoutingPolicyError::DuplicateProfile(profile.agent.to_string()));
        }
        self.profiles.push(profile);
        Ok(self)
    }

    /// Sets the tie-break order; earlier agents win ties.
    #[must_use]
    pub fn with_priority(mut self, priority: Vec<AgentName>) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the ordered supporting agents of `primary`.
    #[must_use]
    pub fn with_support(mut self, primary: AgentName, supporting: Vec<AgentName>) -> Self {
        self.support.insert(primary, supporting);
        self
    }

    /// Sets the confidence reported for fallback routes.
    #[must_use]
    pub const fn with_fallback_confidence(mut self, confidence: Confidence) -> Self {
        self.fallback_confidence = confidence;
        self
    }

    /// Sets the estimate for agent types without an entry.
    #[must_use]
    pub const fn with_default_estimated_minutes(mut self, minutes: u32) -> Self {
        self.default_estimated_minutes = minutes;
        self
    }

    /// Sets the estimate for one agent type.
    #[must_use]
    pub fn with_estimated_minutes(mut self, agent_type: impl Into<String>, minutes: u32) -> Self {
        self.estimated_minutes.insert(agent_type.into(), minutes);
        self
    }

    /// Selects the primary agent for case-folded text.
    ///
    /// The highest score wins; ties go to the agent listed first in the
    /// priority order, then to the lexically smallest name. With no
    /// positive score the fallback agent is returned.
    #[must_use]
    pub fn select(&self, normalized_text: &str) -> RouteSelection {
        self.profiles
            .iter()
            .map(|profile| (profile, profile.score(normalized_text)))
            .filter(|(_, confidence)| confidence.is_positive())
            .max_by(|lhs, rhs| self.compare_candidates(lhs, rhs))
            .map_or_else(
                || RouteSelection {
                    agent: self.fallback_agent.clone(),
                    confidence: self.fallback_confidence,
                    fallback: true,
                },
                |(profile, confidence)| RouteSelection {
                    agent: profile.agent.clone(),
                    confidence,
                    fallback: false,
                },
            )
    }

    /// Returns every positive score, best first.
    #[must_use]
    pub fn scores(&self, normalized_text: &str) -> Vec<(AgentName, Confidence)> {
        let mut scored: Vec<(&AgentProfile, Confidence)> = self
            .profiles
            .iter()
            .map(|profile| (profile, profile.score(normalized_text)))
            .filter(|(_, confidence)| confidence.is_positive())
            .collect();
        scored.sort_by(|lhs, rhs| self.compare_candidates(rhs, lhs));
        scored
            .into_iter()
            .map(|(profile, confidence)| (profile.agent.clone(), confidence))
            .collect()
    }

    /// Returns the supporting agents configured for `primary`.
    #[must_use]
    pub fn supporting_agents(&self, primary: &AgentName) -> &[AgentName] {
        self.support.get(primary).map_or(&[], Vec::as_slice)
    }

    /// Returns the static duration estimate for `agent`'s type.
    #[must_use]
    pub fn estimated_minutes(&self, agent: &AgentName) -> u32 {
        let agent_type = self
            .profile(agent)
            .map_or(DEFAULT_AGENT_TYPE, AgentProfile::agent_type);
        self.estimated_minutes
            .get(agent_type)
            .copied()
            .unwrap_or(self.default_estimated_minutes)
    }

    /// Returns the profile of `agent`, if any.
    #[must_use]
    pub fn profile(&self, agent: &AgentName) -> Option<&AgentProfile> {
        self.profiles.iter().find(|profile| profile.agent() == agent)
    }

    /// Returns every profile.
    #[must_use]
    pub fn profiles(&self) -> &[AgentProfile] {
        &self.profiles
    }

    /// Returns the policy version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the fallback agent.
    #[must_use]
    pub const fn fallback_agent(&self) -> &AgentName {
        &self.fallback_agent
    }

    /// Returns the fallback confidence.
    #[must_use]
    pub const fn fallback_confidence(&self) -> Confidence {
        self.fallback_confidence
    }

    /// Ranks `lhs` against `rhs`; `Greater` means `lhs` is preferred.
    fn compare_candidates(
        &self,
        lhs: &(&AgentProfile, Confidence),
        rhs: &(&AgentProfile, Confidence),
    ) -> Ordering {
        lhs.1
            .cmp(&rhs.1)
            .then_with(|| self.rank(&rhs.0.agent).cmp(&self.rank(&lhs.0.agent)))
            .then_with(|| rhs.0.agent.cmp(&lhs.0.agent))
    }

    fn rank(&self, agent: &AgentName) -> usize {
        self.priority
            .iter()
            .position(|candidate| candidate == agent)
            .unwrap_or(usize::MAX)
    }
}

fn saturate(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
