use serde::{Deserialize, Serialize};

/// Operations the dialogue manager can ask the kiosk to run for one utterance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KioskAction {
    OrderConfirmation,
    ModifyOrder,
    SubtractFromOrder,
    AddSubtract,
    SelectCoffeeSize,
    SelectCoffeeTemperature,
    AddAdditionalOption,
    RemoveAdditionalOption,
    OrderFinish,
    CancelOrder,
    TakeOut,
    CoffeeRecommendation,
}

impl KioskAction {
    pub const ALL: [KioskAction; 12] = [
        KioskAction::OrderConfirmation,
        KioskAction::ModifyOrder,
        KioskAction::SubtractFromOrder,
        KioskAction::AddSubtract,
        KioskAction::SelectCoffeeSize,
        KioskAction::SelectCoffeeTemperature,
        KioskAction::AddAdditionalOption,
        KioskAction::RemoveAdditionalOption,
        KioskAction::OrderFinish,
        KioskAction::CancelOrder,
        KioskAction::TakeOut,
        KioskAction::CoffeeRecommendation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            KioskAction::OrderConfirmation => "action_order_confirmation",
            KioskAction::ModifyOrder => "action_modify_order",
            KioskAction::SubtractFromOrder => "action_subtract_from_order",
            KioskAction::AddSubtract => "action_add_subtract",
            KioskAction::SelectCoffeeSize => "action_select_coffee_size",
            KioskAction::SelectCoffeeTemperature => "action_select_coffee_temperature",
            KioskAction::AddAdditionalOption => "action_add_additional_option",
            KioskAction::RemoveAdditionalOption => "action_remove_additional_option",
            KioskAction::OrderFinish => "action_order_finish",
            KioskAction::CancelOrder => "action_cancel_order",
            KioskAction::TakeOut => "action_takeout",
            KioskAction::CoffeeRecommendation => "action_coffee_recommendation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }

    /// Maps an NLU intent name to the action that serves it.
    pub fn from_intent(intent: &str) -> Option<Self> {
        match intent {
            "order_coffee" => Some(KioskAction::OrderConfirmation),
            _ => Self::parse(&format!("action_{intent}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_name() {
        for action in KioskAction::ALL {
            assert_eq!(KioskAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(KioskAction::parse("action_unknown"), None);
    }

    #[test]
    fn test_from_intent() {
        assert_eq!(
            KioskAction::from_intent("order_coffee"),
            Some(KioskAction::OrderConfirmation)
        );
        assert_eq!(
            KioskAction::from_intent("takeout"),
            Some(KioskAction::TakeOut)
        );
        assert_eq!(KioskAction::from_intent("greet"), None);
    }
}
