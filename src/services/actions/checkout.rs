use crate::errors::OrderError;
use crate::models::EntityKind;
use crate::services::cart::Cart;

use super::{ActionReply, CheckoutEffect, Turn, TAKEOUT_PROMPT};

/// Reads the order back, hands it to the caller for recording and starts a fresh cart.
pub fn finish_order(cart: &mut Cart, reply: &mut ActionReply) -> Result<(), OrderError> {
    if cart.is_empty() {
        reply.say("장바구니에 주문이 없습니다. 다시 주문해 주세요.");
        return Ok(());
    }

    let summary = cart.summary();
    reply.say(format!("주문하신 음료는 {summary}입니다."));
    reply.say(TAKEOUT_PROMPT);
    reply.effect = Some(CheckoutEffect::Finished {
        summary,
        cups: cart.total_cups(),
        lines: cart.grouped(),
    });
    cart.clear();
    Ok(())
}

pub fn cancel_order(cart: &mut Cart, reply: &mut ActionReply) -> Result<(), OrderError> {
    if cart.is_empty() {
        reply.say("취소할 주문이 없습니다.");
        return Ok(());
    }

    let summary = cart.summary();
    let canceled = cart.cancel();
    tracing::info!(drinks = canceled.len(), "order canceled");
    reply.say(format!(
        "모든 주문이 취소되었습니다. 취소된 음료는 {summary}입니다. 새로운 주문을 원하시면 말씀해주세요."
    ));
    Ok(())
}

pub fn take_out(cart: &mut Cart, turn: &Turn, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let mode = turn
        .entities
        .iter()
        .filter(|e| e.kind == EntityKind::Take)
        .max_by_key(|e| e.start)
        .and_then(|e| normalizer.dining_mode(&e.value));

    match mode {
        Some(mode) => {
            reply.say(format!(
                "{mode} 주문이 완료되었습니다. 결제는 하단의 카드리더기로 결제해 주시기 바랍니다. 감사합니다."
            ));
            reply.effect = Some(CheckoutEffect::DiningChosen { mode });
        }
        None => reply.say(TAKEOUT_PROMPT),
    }
    Ok(())
}

pub fn recommend(cart: &mut Cart, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    reply.say(format!(
        "저희 매장이 추천하는 커피로는 {} 등이 있습니다. 어떤 커피를 원하시나요?",
        normalizer.recommendations().join(", ")
    ));
    Ok(())
}
