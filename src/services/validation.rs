use crate::errors::{OrderError, TemperatureViolation};
use crate::models::{OrderLine, Temperature};
use crate::services::normalize::Normalizer;

pub fn require_drinks(lines: &[OrderLine]) -> Result<(), OrderError> {
    if lines.is_empty() {
        return Err(OrderError::MissingDrink);
    }
    Ok(())
}

/// Rejects lines whose stated temperature contradicts a hot-only or ice-only drink.
/// Every offending line is reported.
pub fn check_fixed_temperatures(
    normalizer: &Normalizer,
    lines: &[OrderLine],
) -> Result<(), OrderError> {
    let violations: Vec<TemperatureViolation> = lines
        .iter()
        .filter_map(|line| {
            let fixed = normalizer.fixed_temperature(&line.drink)?;
            let requested = line.requested_temperature.unwrap_or(line.temperature);
            (requested != fixed).then(|| TemperatureViolation {
                drink: line.drink.clone(),
                fixed,
            })
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(OrderError::FixedTemperature(violations))
    }
}

/// Same check against a temperature the lines are about to be switched to.
pub fn check_temperature_change(
    normalizer: &Normalizer,
    lines: &[OrderLine],
    new_temperature: Temperature,
) -> Result<(), OrderError> {
    let violations: Vec<TemperatureViolation> = lines
        .iter()
        .filter_map(|line| {
            let fixed = normalizer.fixed_temperature(&line.drink)?;
            (new_temperature != fixed).then(|| TemperatureViolation {
                drink: line.drink.clone(),
                fixed,
            })
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(OrderError::FixedTemperature(violations))
    }
}
