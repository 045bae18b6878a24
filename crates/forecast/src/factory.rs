use crate::ensemble::EnsembleStrategy;
use crate::error::ForecastError;
use crate::exponential::ExponentialSmoothing;
use crate::trend::TrendExtrapolation;
use crate::ForecastStrategy;
use configuration::ForecastSettings;
use core_types::ModelId;

/// Creates a strategy instance for `id`.
///
/// The match is exhaustive, so adding a `ModelId` variant without handling it here
/// is a compile error.
pub fn create_strategy(
    id: ModelId,
    settings: &ForecastSettings,
) -> Result<Box<dyn ForecastStrategy>, ForecastError> {
    match id {
        ModelId::TrendExtrapolation => Ok(Box::new(TrendExtrapolation::new())),
        ModelId::ExponentialSmoothing => Ok(Box::new(ExponentialSmoothing::new())),
        ModelId::Ensemble => {
            if settings.ensemble_members.contains(&ModelId::Ensemble) {
                return Err(ForecastError::InvalidParameters(
                    "an ensemble cannot contain another ensemble".to_string(),
                ));
            }
            let members = settings
                .ensemble_members
                .iter()
                .map(|&member| create_strategy(member, settings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(EnsembleStrategy::new(members, settings.degraded_penalty)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_model() {
        let settings = ForecastSettings::default();
        for id in [
            ModelId::TrendExtrapolation,
            ModelId::ExponentialSmoothing,
            ModelId::Ensemble,
        ] {
            assert_eq!(create_strategy(id, &settings).unwrap().id(), id);
        }
    }

    #[test]
    fn nested_ensemble_is_rejected() {
        let settings = ForecastSettings {
            ensemble_members: vec![ModelId::Ensemble, ModelId::TrendExtrapolation],
            ..ForecastSettings::default()
        };
        assert!(create_strategy(ModelId::Ensemble, &settings).is_err());
    }
}
