pub mod attributes;
pub mod checkout;
pub mod options;
pub mod ordering;

use serde::Serialize;

use crate::errors::OrderError;
use crate::models::{Entity, KioskAction, OptionSet, OrderLine};
use crate::services::cart::{Cart, CartGroup};
use crate::services::normalize::Normalizer;
use crate::services::segmenter::{SegmentContext, Segmentation, Segmenter};

pub const FOLLOW_UP: &str = "다른 추가 옵션이 필요하신가요?";
pub const TAKEOUT_PROMPT: &str = "드시고 가시나요, 포장하시나요?";

/// One user utterance as seen by an action.
#[derive(Debug, Clone, Default)]
pub struct Turn {
    pub text: String,
    pub entities: Vec<Entity>,
}

impl Turn {
    pub fn new(text: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            text: text.into(),
            entities,
        }
    }
}

/// Something the caller has to record outside the cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutEffect {
    Finished {
        summary: String,
        cups: u32,
        lines: Vec<CartGroup>,
    },
    DiningChosen { mode: String },
}

#[derive(Debug, Clone, Default)]
pub struct ActionReply {
    pub messages: Vec<String>,
    pub effect: Option<CheckoutEffect>,
}

impl ActionReply {
    fn say(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

/// Runs one action against the session cart. Order errors become customer messages here.
pub fn run_action(cart: &mut Cart, action: KioskAction, turn: &Turn) -> ActionReply {
    let mut reply = ActionReply::default();

    let result = match action {
        KioskAction::OrderConfirmation => ordering::place_order(cart, turn, &mut reply),
        KioskAction::ModifyOrder => ordering::modify_order(cart, turn, &mut reply),
        KioskAction::SubtractFromOrder => ordering::subtract_from_order(cart, turn, &mut reply),
        KioskAction::AddSubtract => ordering::add_subtract(cart, turn, &mut reply),
        KioskAction::SelectCoffeeSize => attributes::change_size(cart, turn, &mut reply),
        KioskAction::SelectCoffeeTemperature => {
            attributes::change_temperature(cart, turn, &mut reply)
        }
        KioskAction::AddAdditionalOption => options::add_option(cart, turn, &mut reply),
        KioskAction::RemoveAdditionalOption => options::remove_option(cart, turn, &mut reply),
        KioskAction::OrderFinish => checkout::finish_order(cart, &mut reply),
        KioskAction::CancelOrder => checkout::cancel_order(cart, &mut reply),
        KioskAction::TakeOut => checkout::take_out(cart, turn, &mut reply),
        KioskAction::CoffeeRecommendation => checkout::recommend(cart, &mut reply),
    };

    if let Err(err) = result {
        tracing::warn!(action = action.as_str(), error = %err, "order action rejected");
        reply.messages.extend(err.user_messages());
    }
    reply
}

fn segment(normalizer: &Normalizer, entities: &[Entity], context: SegmentContext) -> Segmentation {
    let segmentation = Segmenter::new(normalizer)
        .with_context(context)
        .segment(entities);
    tracing::debug!(
        entities = entities.len(),
        mapped = ?segmentation.mapped_data(),
        "segmented utterance"
    );
    segmentation
}

fn add_line(cart: &mut Cart, line: &OrderLine) {
    cart.add(
        &line.drink,
        line.quantity,
        line.temperature,
        line.size,
        &line.option_set(),
    );
}

fn subtract_line(cart: &mut Cart, line: &OrderLine) -> Result<(), OrderError> {
    cart.subtract(
        &line.drink,
        Some(line.quantity),
        line.temperature,
        line.size,
        &line.option_set(),
    )
}

fn describe_line(line: &OrderLine) -> String {
    CartGroup {
        drink: line.drink.clone(),
        temperature: line.temperature,
        size: line.size,
        options: OptionSet::from_names(&line.options),
        count: line.quantity,
    }
    .describe()
}
