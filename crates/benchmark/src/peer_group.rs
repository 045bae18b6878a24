use crate::error::BenchmarkError;
use configuration::PeerGroupSettings;
use core_types::{ClientProfile, CriterionKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Revenue band used when a `revenue_size` criterion is configured without one.
const DEFAULT_REVENUE_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCriterion {
    pub kind: CriterionKind,
    pub weight: f64,
    /// Relative band for `revenue_size`; `None` for exact-match criteria.
    pub tolerance: Option<f64>,
}

impl MatchCriterion {
    fn matches(&self, target: &ClientProfile, candidate: &ClientProfile) -> bool {
        match self.kind {
            CriterionKind::Industry => candidate.industry_code == target.industry_code,
            CriterionKind::Geography => candidate.region.eq_ignore_ascii_case(&target.region),
            CriterionKind::BusinessModel => {
                candidate.business_model.eq_ignore_ascii_case(&target.business_model)
            }
            CriterionKind::RevenueSize => {
                let tolerance = self.tolerance.unwrap_or(DEFAULT_REVENUE_TOLERANCE);
                revenue_distance(target, candidate) <= tolerance
            }
        }
    }

    /// Degree of match in `[0, 1]`, used to order members.
    fn similarity(&self, target: &ClientProfile, candidate: &ClientProfile, max_tolerance: f64) -> f64 {
        match self.kind {
            CriterionKind::RevenueSize => {
                (1.0 - revenue_distance(target, candidate) / max_tolerance.max(f64::EPSILON)).max(0.0)
            }
            _ => {
                if self.matches(target, candidate) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Revenue difference relative to the target's revenue.
fn revenue_distance(target: &ClientProfile, candidate: &ClientProfile) -> f64 {
    let base = target.annual_revenue.abs().max(1.0);
    (candidate.annual_revenue - target.annual_revenue).abs() / base
}

/// One loosening of the criteria, recorded in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RelaxationStep {
    Widened {
        kind: CriterionKind,
        from: f64,
        to: f64,
        cohort_size: usize,
    },
    Dropped {
        kind: CriterionKind,
        cohort_size: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMember {
    pub profile: ClientProfile,
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerGroup {
    pub target_client_id: Uuid,
    /// Criteria in force after relaxation.
    pub criteria: Vec<MatchCriterion>,
    /// Most similar first. Never contains the target.
    pub members: Vec<PeerMember>,
    pub min_size: usize,
    pub relaxation_path: Vec<RelaxationStep>,
}

impl PeerGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_ids(&self) -> Vec<Uuid> {
        self.members.iter().map(|m| m.profile.client_id).collect()
    }

    pub fn was_relaxed(&self) -> bool {
        !self.relaxation_path.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct PeerGroupSelector {
    criteria: Vec<MatchCriterion>,
    min_size: usize,
    tolerance_growth: f64,
    max_tolerance: f64,
}

impl PeerGroupSelector {
    pub fn new(settings: &PeerGroupSettings) -> Result<Self, BenchmarkError> {
        let criteria = settings
            .criteria
            .iter()
            .map(|c| MatchCriterion {
                kind: c.kind,
                weight: c.weight,
                tolerance: match c.kind {
                    CriterionKind::RevenueSize => Some(c.tolerance.unwrap_or(DEFAULT_REVENUE_TOLERANCE)),
                    _ => None,
                },
            })
            .collect();
        Self::with_criteria(
            criteria,
            settings.min_size,
            settings.tolerance_growth,
            settings.max_tolerance,
        )
    }

    pub fn with_criteria(
        criteria: Vec<MatchCriterion>,
        min_size: usize,
        tolerance_growth: f64,
        max_tolerance: f64,
    ) -> Result<Self, BenchmarkError> {
        if min_size == 0 {
            return Err(BenchmarkError::InvalidParameters(
                "peer group minimum size must be at least 1".to_string(),
            ));
        }
        if !(tolerance_growth > 1.0) || !(max_tolerance > 0.0) {
            return Err(BenchmarkError::InvalidParameters(
                "tolerance growth must exceed 1 and max tolerance must be positive".to_string(),
            ));
        }
        if criteria.iter().any(|c| !(c.weight > 0.0)) {
            return Err(BenchmarkError::InvalidParameters(
                "criterion weights must be positive".to_string(),
            ));
        }
        Ok(Self {
            criteria,
            min_size,
            tolerance_growth,
            max_tolerance,
        })
    }

    /// Builds the cohort for `target` out of `candidates`, relaxing criteria until it
    /// reaches the minimum size.
    ///
    /// Each round widens the lowest-weight tolerance criterion that is still below the
    /// maximum tolerance; when none can widen, the lowest-weight criterion is dropped.
    pub fn select(
        &self,
        target: &ClientProfile,
        candidates: &[ClientProfile],
    ) -> Result<PeerGroup, BenchmarkError> {
        let pool: Vec<&ClientProfile> = candidates
            .iter()
            .filter(|c| c.client_id != target.client_id)
            .collect();

        let mut criteria = self.criteria.clone();
        let mut relaxation_path = Vec::new();
        let mut cohort = filter(&pool, target, &criteria);

        while cohort.len() < self.min_size {
            if let Some(index) = self.widenable(&criteria) {
                let criterion = &mut criteria[index];
                let from = criterion.tolerance.unwrap_or_default();
                let to = (from * self.tolerance_growth).min(self.max_tolerance);
                criterion.tolerance = Some(to);
                let kind = criterion.kind;
                cohort = filter(&pool, target, &criteria);
                relaxation_path.push(RelaxationStep::Widened {
                    kind,
                    from,
                    to,
                    cohort_size: cohort.len(),
                });
            } else if let Some(index) = lowest_weight(&criteria) {
                let dropped = criteria.remove(index);
                cohort = filter(&pool, target, &criteria);
                relaxation_path.push(RelaxationStep::Dropped {
                    kind: dropped.kind,
                    cohort_size: cohort.len(),
                });
            } else {
                tracing::warn!(
                    client_id = %target.client_id,
                    found = cohort.len(),
                    required = self.min_size,
                    "Peer group below minimum after exhausting criteria"
                );
                return Err(BenchmarkError::PeerGroupTooSmall {
                    found: cohort.len(),
                    required: self.min_size,
                    relaxation_path,
                });
            }
            tracing::debug!(client_id = %target.client_id, step = ?relaxation_path.last(), "Peer criteria relaxed");
        }

        let total_weight: f64 = self.criteria.iter().map(|c| c.weight).sum();
        let mut members: Vec<PeerMember> = cohort
            .into_iter()
            .map(|profile| {
                let score: f64 = self
                    .criteria
                    .iter()
                    .map(|c| c.weight * c.similarity(target, profile, self.max_tolerance))
                    .sum();
                PeerMember {
                    profile: profile.clone(),
                    similarity: if total_weight > 0.0 { score / total_weight } else { 0.0 },
                }
            })
            .collect();
        members.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.profile.name.cmp(&b.profile.name))
        });

        Ok(PeerGroup {
            target_client_id: target.client_id,
            criteria,
            members,
            min_size: self.min_size,
            relaxation_path,
        })
    }

    /// The lowest-weight criterion whose positive tolerance can still grow.
    fn widenable(&self, criteria: &[MatchCriterion]) -> Option<usize> {
        criteria
            .iter()
            .enumerate()
            .filter(|(_, c)| c.tolerance.is_some_and(|t| t > 0.0 && t < self.max_tolerance))
            .min_by(|(_, a), (_, b)| a.weight.total_cmp(&b.weight))
            .map(|(i, _)| i)
    }
}

fn filter<'a>(
    pool: &[&'a ClientProfile],
    target: &ClientProfile,
    criteria: &[MatchCriterion],
) -> Vec<&'a ClientProfile> {
    pool.iter()
        .copied()
        .filter(|c| criteria.iter().all(|criterion| criterion.matches(target, c)))
        .collect()
}

/// Among equal weights the later criterion goes first.
fn lowest_weight(criteria: &[MatchCriterion]) -> Option<usize> {
    criteria
        .iter()
        .enumerate()
        .rev()
        .min_by(|(_, a), (_, b)| a.weight.total_cmp(&b.weight))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(name: &str, industry: &str, revenue: f64, region: &str, model: &str) -> ClientProfile {
        ClientProfile {
            client_id: Uuid::new_v4(),
            organization_id: Uuid::nil(),
            name: name.to_string(),
            industry_code: industry.to_string(),
            annual_revenue: revenue,
            region: region.to_string(),
            business_model: model.to_string(),
        }
    }

    fn strict(kind: CriterionKind, weight: f64) -> MatchCriterion {
        MatchCriterion { kind, weight, tolerance: None }
    }

    #[test]
    fn drops_lowest_weight_then_fails_when_exhausted() {
        let target = client("target", "5412", 1e6, "west", "services");
        let mut candidates: Vec<ClientProfile> = (0..4)
            .map(|i| client(&format!("full{i}"), "5412", 1e6, "west", "services"))
            .collect();
        candidates.extend((0..3).map(|i| client(&format!("part{i}"), "5412", 1e6, "west", "retail")));
        candidates.push(client("other", "7372", 1e6, "east", "retail"));
        candidates.push(target.clone());

        let selector = PeerGroupSelector::with_criteria(
            vec![
                strict(CriterionKind::Industry, 0.5),
                strict(CriterionKind::Geography, 0.3),
                strict(CriterionKind::BusinessModel, 0.2),
            ],
            10,
            2.0,
            4.0,
        )
        .unwrap();

        let err = selector.select(&target, &candidates).unwrap_err();
        match err {
            BenchmarkError::PeerGroupTooSmall { found, required, relaxation_path } => {
                assert_eq!(found, 8);
                assert_eq!(required, 10);
                assert_eq!(
                    relaxation_path[0],
                    RelaxationStep::Dropped { kind: CriterionKind::BusinessModel, cohort_size: 7 }
                );
                assert_eq!(relaxation_path.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dropping_a_criterion_can_satisfy_the_minimum() {
        let target = client("target", "5412", 1e6, "west", "services");
        let mut candidates: Vec<ClientProfile> = (0..4)
            .map(|i| client(&format!("full{i}"), "5412", 1e6, "west", "services"))
            .collect();
        candidates.extend((0..3).map(|i| client(&format!("part{i}"), "5412", 1e6, "west", "retail")));

        let selector = PeerGroupSelector::with_criteria(
            vec![
                strict(CriterionKind::Industry, 0.5),
                strict(CriterionKind::Geography, 0.3),
                strict(CriterionKind::BusinessModel, 0.2),
            ],
            5,
            2.0,
            4.0,
        )
        .unwrap();

        let group = selector.select(&target, &candidates).unwrap();
        assert_eq!(group.len(), 7);
        assert_eq!(group.criteria.len(), 2);
        assert!(!group.member_ids().contains(&target.client_id));
        // Full matches rank ahead of partial ones.
        assert!(group.members[..4].iter().all(|m| m.profile.business_model == "services"));
    }

    #[test]
    fn widens_revenue_band_before_dropping() {
        let target = client("target", "5412", 1_000_000.0, "west", "services");
        let candidates: Vec<ClientProfile> = [900_000.0, 1_200_000.0, 1_800_000.0, 2_500_000.0]
            .iter()
            .enumerate()
            .map(|(i, r)| client(&format!("c{i}"), "5412", *r, "west", "services"))
            .collect();

        let selector = PeerGroupSelector::with_criteria(
            vec![
                strict(CriterionKind::Industry, 0.6),
                MatchCriterion { kind: CriterionKind::RevenueSize, weight: 0.4, tolerance: Some(0.25) },
            ],
            3,
            2.0,
            4.0,
        )
        .unwrap();

        let group = selector.select(&target, &candidates).unwrap();
        assert_eq!(group.len(), 3);
        assert!(matches!(
            group.relaxation_path[0],
            RelaxationStep::Widened { kind: CriterionKind::RevenueSize, cohort_size: 2, .. }
        ));
        assert!(group.was_relaxed());
        assert_eq!(group.criteria.len(), 2);
    }

    #[test]
    fn defaults_come_from_settings() {
        let selector = PeerGroupSelector::new(&PeerGroupSettings::default()).unwrap();
        assert_eq!(selector.criteria.len(), 4);
        assert_eq!(selector.min_size, 10);
    }
}
