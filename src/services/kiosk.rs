use std::sync::Arc;

use chrono::Utc;

use crate::db::queries;
use crate::errors::OrderError;
use crate::models::{CompletedOrder, KioskAction, OrderEvent};
use crate::services::actions::{run_action, CheckoutEffect, Turn};
use crate::state::AppState;

/// Runs one action for a session and records whatever it finished. Returns the replies
/// to speak back, in order.
pub fn process_turn(
    state: &Arc<AppState>,
    session_id: &str,
    action: KioskAction,
    turn: &Turn,
) -> Vec<String> {
    tracing::info!(
        session = %session_id,
        action = action.as_str(),
        entities = turn.entities.len(),
        "processing turn"
    );

    // The sessions guard spans the action and the checkout record so that a failed insert
    // puts the cart back before another turn for the same sender can run. Lock order is
    // sessions, then db.
    let mut sessions = state.sessions.lock().unwrap();
    let cart = sessions.cart(session_id);
    let previous = cart.clone();
    let reply = run_action(cart, action, turn);

    match reply.effect {
        Some(CheckoutEffect::Finished {
            summary,
            cups,
            lines,
        }) => {
            let order = CompletedOrder {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: session_id.to_string(),
                summary,
                cups,
                lines: serde_json::to_value(&lines).unwrap_or_else(|_| serde_json::json!([])),
                dining_mode: None,
                created_at: Utc::now().naive_utc(),
            };

            let saved = {
                let db = state.db.lock().unwrap();
                queries::insert_completed_order(&db, &order)
            };
            if let Err(e) = saved {
                tracing::error!(session = %session_id, error = %e, "failed to record completed order");
                *cart = previous;
                return OrderError::Unhandled(e.to_string()).user_messages();
            }
            drop(sessions);

            tracing::info!(session = %session_id, order = %order.id, cups = order.cups, "order completed");
            // No subscribers is fine.
            let _ = state.order_tx.send(OrderEvent::Completed { order });
        }
        Some(CheckoutEffect::DiningChosen { ref mode }) => {
            drop(sessions);
            record_dining_mode(state, session_id, mode);
        }
        None => {}
    }

    reply.messages
}

fn record_dining_mode(state: &Arc<AppState>, session_id: &str, mode: &str) {
    let updated = {
        let db = state.db.lock().unwrap();
        queries::latest_order_for_session(&db, session_id).and_then(|latest| match latest {
            Some(order) => queries::set_dining_mode(&db, &order.id, mode).map(|_| Some(order.id)),
            None => Ok(None),
        })
    };

    match updated {
        Ok(Some(order_id)) => {
            tracing::info!(session = %session_id, order = %order_id, mode, "dining mode recorded");
            let _ = state.order_tx.send(OrderEvent::DiningMode {
                order_id,
                mode: mode.to_string(),
            });
        }
        Ok(None) => tracing::debug!(session = %session_id, "dining mode without a completed order"),
        Err(e) => tracing::error!(session = %session_id, error = %e, "failed to record dining mode"),
    }
}
