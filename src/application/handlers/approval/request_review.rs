//! RequestReviewHandler - (re)sends the admin review request for an order.
//!
//! Read-only with respect to the order: used when an order first enters
//! review and again after an admin fixed stock and needs fresh buttons.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::approval::{notices, MessageRef};
use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::order::OrderStatus;
use crate::ports::{AdminDirectory, ChannelError, NotificationChannel, OrderStore};

#[derive(Debug, Clone)]
pub struct RequestReviewCommand {
    pub order_id: OrderId,
}

#[derive(Debug, Error)]
pub enum RequestReviewError {
    #[error("Order {0} not found")]
    NotFound(OrderId),

    #[error("Order {order_id} is {status}, not awaiting review")]
    NotAwaitingReview { order_id: OrderId, status: OrderStatus },

    #[error("Order store error: {0}")]
    Store(#[from] DomainError),

    #[error("Review request not delivered: {0}")]
    Delivery(#[from] ChannelError),
}

pub struct RequestReviewHandler {
    store: Arc<dyn OrderStore>,
    channel: Arc<dyn NotificationChannel>,
    admins: Arc<dyn AdminDirectory>,
}

impl RequestReviewHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        channel: Arc<dyn NotificationChannel>,
        admins: Arc<dyn AdminDirectory>,
    ) -> Self {
        Self {
            store,
            channel,
            admins,
        }
    }

    pub async fn handle(&self, cmd: RequestReviewCommand) -> Result<MessageRef, RequestReviewError> {
        let order = self
            .store
            .find_order(&cmd.order_id)
            .await?
            .ok_or(RequestReviewError::NotFound(cmd.order_id))?;

        if !order.status.is_awaiting_review() {
            return Err(RequestReviewError::NotAwaitingReview {
                order_id: order.id,
                status: order.status,
            });
        }

        let notice = notices::review_request(&order);
        let message = self.channel.send(self.admins.admin_chat(), &notice).await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            message_id = message.message_id,
            "Review request sent"
        );

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::admins::ConfiguredAdmins;
    use crate::adapters::memory::InMemoryOrderStore;
    use crate::adapters::notify::RecordingChannel;
    use crate::domain::foundation::{ChatId, ProductId};
    use crate::domain::order::test_support::{item, order_with};

    fn handler(store: Arc<InMemoryOrderStore>, channel: Arc<RecordingChannel>) -> RequestReviewHandler {
        RequestReviewHandler::new(
            store,
            channel,
            Arc::new(ConfiguredAdmins::new(["1"], ChatId::new("-5").unwrap())),
        )
    }

    #[tokio::test]
    async fn sends_buttons_for_order_in_review() {
        let store = Arc::new(InMemoryOrderStore::new());
        let channel = Arc::new(RecordingChannel::new());
        let order = order_with(vec![item(ProductId::new(), 1, 1)]);
        store.insert_order(order.clone()).await;

        let message = handler(store.clone(), channel.clone())
            .handle(RequestReviewCommand { order_id: order.id })
            .await
            .unwrap();

        assert_eq!(message.chat_id, ChatId::new("-5").unwrap());
        let sent = channel.sent_to(&ChatId::new("-5").unwrap());
        assert_eq!(sent[0].actions.len(), 2);
        assert_eq!(store.order(&order.id).await.unwrap(), order);
    }

    #[tokio::test]
    async fn refuses_decided_orders() {
        let store = Arc::new(InMemoryOrderStore::new());
        let channel = Arc::new(RecordingChannel::new());
        let mut order = order_with(vec![item(ProductId::new(), 1, 1)]);
        order.status = OrderStatus::Completed;
        store.insert_order(order.clone()).await;

        let err = handler(store, channel.clone())
            .handle(RequestReviewCommand { order_id: order.id })
            .await
            .unwrap_err();

        assert!(matches!(err, RequestReviewError::NotAwaitingReview { status: OrderStatus::Completed, .. }));
        assert!(channel.calls().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_surfaced() {
        let store = Arc::new(InMemoryOrderStore::new());
        let channel = Arc::new(RecordingChannel::new());
        channel.fail_sends(true);
        let order = order_with(vec![item(ProductId::new(), 1, 1)]);
        store.insert_order(order.clone()).await;

        let err = handler(store, channel)
            .handle(RequestReviewCommand { order_id: order.id })
            .await
            .unwrap_err();

        assert!(matches!(err, RequestReviewError::Delivery(_)));
    }
}
