//! CallbackDispatcher - ingress for admin button presses.
//!
//! Every press is acknowledged exactly once, whatever happened. Failures the
//! admin must act on are reported to the admin chat after the acknowledgement.

use std::sync::Arc;

use crate::domain::approval::{
    notices, ApprovalError, CallbackAction, CallbackEvent, DecideOrderCommand, Notice,
};
use crate::domain::order::Decision;
use crate::ports::{AdminDirectory, NotificationChannel};

use super::decide_order::{DecideOrderHandler, DecisionOutcome};

/// What the dispatcher told the channel.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Acknowledged; the decision was committed.
    Acknowledged(DecisionOutcome),
    /// Acknowledged; the error was handled here and not passed to the channel.
    AcknowledgedWithError(ApprovalError),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Acknowledged(_))
    }

    pub fn error(&self) -> Option<&ApprovalError> {
        match self {
            DispatchOutcome::Acknowledged(_) => None,
            DispatchOutcome::AcknowledgedWithError(err) => Some(err),
        }
    }
}

pub struct CallbackDispatcher {
    workflow: Arc<DecideOrderHandler>,
    channel: Arc<dyn NotificationChannel>,
    admins: Arc<dyn AdminDirectory>,
    notify_already_decided: bool,
}

impl CallbackDispatcher {
    pub fn new(
        workflow: Arc<DecideOrderHandler>,
        channel: Arc<dyn NotificationChannel>,
        admins: Arc<dyn AdminDirectory>,
    ) -> Self {
        Self {
            workflow,
            channel,
            admins,
            notify_already_decided: true,
        }
    }

    /// Whether race losers see "already processed" on their press.
    pub fn with_already_decided_notice(mut self, enabled: bool) -> Self {
        self.notify_already_decided = enabled;
        self
    }

    pub async fn dispatch(&self, event: CallbackEvent) -> DispatchOutcome {
        tracing::debug!(
            callback_id = %event.callback_id,
            from_user_id = %event.from_user_id,
            data = %event.data,
            "Callback received"
        );

        let command = match self.command_for(&event) {
            Ok(command) => command,
            Err(err) => {
                self.acknowledge(&event, Some(err.acknowledgement_text())).await;
                return DispatchOutcome::AcknowledgedWithError(err);
            }
        };

        match self.workflow.handle(command.clone()).await {
            Ok(outcome) => {
                let text = match outcome.decision() {
                    Decision::Approve => "Order approved",
                    Decision::Reject => "Order rejected",
                };
                self.acknowledge(&event, Some(text)).await;
                self.clear_buttons(&event).await;
                DispatchOutcome::Acknowledged(outcome)
            }
            Err(err) => {
                let text = match &err {
                    ApprovalError::AlreadyDecided { .. } if !self.notify_already_decided => None,
                    _ => Some(err.acknowledgement_text()),
                };
                self.acknowledge(&event, text).await;

                if let ApprovalError::AlreadyDecided { status, .. } = &err {
                    self.clear_buttons(&event).await;
                    if self.notify_already_decided {
                        self.notify_admins(&command, notices::already_processed(&command, *status))
                            .await;
                    }
                }
                if err.needs_admin_report() {
                    self.report(&command, &err).await;
                }
                DispatchOutcome::AcknowledgedWithError(err)
            }
        }
    }

    /// Authorizes the presser, then decodes the payload.
    fn command_for(&self, event: &CallbackEvent) -> Result<DecideOrderCommand, ApprovalError> {
        let Some(admin) = self.admins.authorize(&event.from_user_id) else {
            tracing::warn!(
                from_user_id = %event.from_user_id,
                callback_id = %event.callback_id,
                "Callback from unauthorized user"
            );
            return Err(ApprovalError::Unauthorized {
                user_id: event.from_user_id.clone(),
            });
        };

        let action = CallbackAction::parse(&event.data).map_err(|err| {
            tracing::warn!(
                callback_id = %event.callback_id,
                data = %event.data,
                error = %err,
                "Invalid callback data"
            );
            err
        })?;

        Ok(DecideOrderCommand::from_action(action, admin))
    }

    async fn acknowledge(&self, event: &CallbackEvent, text: Option<&str>) {
        if let Err(e) = self.channel.acknowledge(&event.callback_id, text).await {
            tracing::warn!(callback_id = %event.callback_id, error = %e, "Acknowledgement failed");
        }
    }

    async fn clear_buttons(&self, event: &CallbackEvent) {
        let Some(message) = &event.message else {
            return;
        };
        if let Err(e) = self.channel.clear_actions(message).await {
            tracing::warn!(message_id = message.message_id, error = %e, "Could not clear buttons");
        }
    }

    async fn report(&self, command: &DecideOrderCommand, err: &ApprovalError) {
        if err.is_retryable() {
            tracing::error!(order_id = %command.order_id, error = %err, "Decision failed, left in review");
        }
        self.notify_admins(command, notices::admin_error_report(command, err))
            .await;
    }

    async fn notify_admins(&self, command: &DecideOrderCommand, notice: Notice) {
        if let Err(e) = self.channel.send(self.admins.admin_chat(), &notice).await {
            tracing::warn!(order_id = %command.order_id, error = %e, "Admin notice not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::access::InstructionAccessAssigner;
    use crate::adapters::admins::ConfiguredAdmins;
    use crate::adapters::memory::InMemoryOrderStore;
    use crate::adapters::notify::{ChannelCall, RecordingChannel};
    use crate::application::handlers::approval::ProvisioningEngine;
    use crate::domain::approval::MessageRef;
    use crate::domain::catalog::Product;
    use crate::domain::foundation::{ChatId, ProductId};
    use crate::domain::order::test_support::{item, order_with};
    use crate::domain::order::{Order, OrderStatus};
    use std::time::Duration;

    const ADMIN_CHAT: &str = "-100200";

    struct Fixture {
        store: Arc<InMemoryOrderStore>,
        channel: Arc<RecordingChannel>,
        dispatcher: CallbackDispatcher,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryOrderStore::new());
        let channel = Arc::new(RecordingChannel::new());
        let admins = Arc::new(ConfiguredAdmins::new(["9001"], ChatId::new(ADMIN_CHAT).unwrap()));
        let workflow = Arc::new(DecideOrderHandler::new(
            store.clone(),
            channel.clone(),
            admins.clone(),
            ProvisioningEngine::new(Arc::new(InstructionAccessAssigner::new())),
            Duration::from_secs(1),
        ));
        let dispatcher = CallbackDispatcher::new(workflow, channel.clone(), admins);
        Fixture {
            store,
            channel,
            dispatcher,
        }
    }

    fn press(data: String, from: &str) -> CallbackEvent {
        CallbackEvent {
            callback_id: "cb-1".to_string(),
            data,
            from_user_id: from.to_string(),
            message: Some(MessageRef {
                chat_id: ChatId::new(ADMIN_CHAT).unwrap(),
                message_id: 77,
            }),
        }
    }

    async fn seeded(f: &Fixture, stock: u32) -> Order {
        let product = Product::new(ProductId::new(), "Streaming", stock);
        let order = order_with(vec![item(product.id, 1, 1)]);
        f.store.insert_product(product).await;
        f.store.insert_order(order.clone()).await;
        order
    }

    #[tokio::test]
    async fn approve_press_is_acknowledged_and_buttons_cleared() {
        let f = fixture();
        let order = seeded(&f, 2).await;

        let outcome = f
            .dispatcher
            .dispatch(press(format!("approve:{}", order.id), "9001"))
            .await;

        assert!(outcome.is_success());
        assert_eq!(
            f.channel.acknowledgements(),
            vec![("cb-1".to_string(), Some("Order approved".to_string()))]
        );
        assert_eq!(f.channel.cleared().len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_press_never_reaches_workflow() {
        let f = fixture();
        let order = seeded(&f, 2).await;

        let outcome = f
            .dispatcher
            .dispatch(press(format!("approve:{}", order.id), "12345"))
            .await;

        assert!(matches!(outcome.error(), Some(ApprovalError::Unauthorized { .. })));
        assert_eq!(f.store.order(&order.id).await.unwrap().status, OrderStatus::PendingReview);
        assert_eq!(f.channel.acknowledgements().len(), 1);
    }

    #[tokio::test]
    async fn malformed_payload_is_acknowledged_once() {
        let f = fixture();

        let outcome = f.dispatcher.dispatch(press("approve:42".to_string(), "9001")).await;

        assert!(matches!(outcome.error(), Some(ApprovalError::InvalidCallback { .. })));
        let calls = f.channel.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], ChannelCall::Acknowledge { .. }));
    }

    #[tokio::test]
    async fn unknown_order_is_acknowledged_and_dropped() {
        let f = fixture();

        let outcome = f
            .dispatcher
            .dispatch(press(format!("reject:{}", crate::domain::foundation::OrderId::new()), "9001"))
            .await;

        assert!(matches!(outcome.error(), Some(ApprovalError::NotFound { .. })));
        assert_eq!(
            f.channel.acknowledgements(),
            vec![("cb-1".to_string(), Some("Order not found".to_string()))]
        );
        assert!(f.channel.sent_to(&ChatId::new(ADMIN_CHAT).unwrap()).is_empty());
    }

    #[tokio::test]
    async fn insufficient_stock_is_acked_then_reported_to_admin() {
        let f = fixture();
        let order = seeded(&f, 0).await;

        let outcome = f
            .dispatcher
            .dispatch(press(format!("approve:{}", order.id), "9001"))
            .await;

        assert!(matches!(outcome.error(), Some(ApprovalError::InsufficientStock { .. })));
        let calls = f.channel.calls();
        assert!(matches!(calls[0], ChannelCall::Acknowledge { .. }));
        let reports = f.channel.sent_to(&ChatId::new(ADMIN_CHAT).unwrap());
        assert_eq!(reports.len(), 1);
        assert!(reports[0].text.contains("Restock"));
        assert!(f.channel.cleared().is_empty());
    }

    #[tokio::test]
    async fn second_press_reports_already_processed() {
        let f = fixture();
        let order = seeded(&f, 2).await;
        let data = format!("approve:{}", order.id);

        f.dispatcher.dispatch(press(data.clone(), "9001")).await;
        let second = f.dispatcher.dispatch(press(data, "9001")).await;

        assert!(matches!(
            second.error(),
            Some(ApprovalError::AlreadyDecided { status: OrderStatus::Completed, .. })
        ));
        let acks = f.channel.acknowledgements();
        assert_eq!(acks[1].1.as_deref(), Some("Order already processed"));
        // Confirmation of the first press, then the already-processed notice.
        let admin_chat = f.channel.sent_to(&ChatId::new(ADMIN_CHAT).unwrap());
        assert_eq!(admin_chat.len(), 2);
        assert!(admin_chat[1].text.contains("already COMPLETED"));
    }

    #[tokio::test]
    async fn already_decided_notice_can_be_silenced() {
        let f = fixture();
        let dispatcher = f.dispatcher.with_already_decided_notice(false);
        let product = Product::new(ProductId::new(), "Streaming", 2);
        let order = order_with(vec![item(product.id, 1, 1)]);
        f.store.insert_product(product).await;
        f.store.insert_order(order.clone()).await;

        dispatcher.dispatch(press(format!("reject:{}", order.id), "9001")).await;
        dispatcher.dispatch(press(format!("reject:{}", order.id), "9001")).await;

        let acks = f.channel.acknowledgements();
        assert_eq!(acks.len(), 2);
        assert_eq!(acks[1].1, None);
        // Only the confirmation of the first press.
        assert_eq!(f.channel.sent_to(&ChatId::new(ADMIN_CHAT).unwrap()).len(), 1);
    }

    #[tokio::test]
    async fn acknowledgement_failure_does_not_undo_decision() {
        let f = fixture();
        f.channel.fail_acknowledgements(true);
        let order = seeded(&f, 1).await;

        let outcome = f
            .dispatcher
            .dispatch(press(format!("reject:{}", order.id), "9001"))
            .await;

        assert!(outcome.is_success());
        assert_eq!(f.store.order(&order.id).await.unwrap().status, OrderStatus::Rejected);
    }
}
