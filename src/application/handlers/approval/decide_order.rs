//! DecideOrderHandler - the approval workflow.
//!
//! One decision is one store transaction: lock the order, check it is still
//! in review, provision on approval, compare-and-swap the status, commit.
//! Notifications go out only after the commit and never undo it.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::approval::{notices, ApprovalError, DecideOrderCommand};
use crate::domain::foundation::{DomainError, OrderId, Timestamp};
use crate::domain::order::{Decision, Order};
use crate::domain::subscription::Subscription;
use crate::ports::{
    AdminDirectory, NotificationChannel, OrderStore, OrderTransaction, StatusChange, StatusWrite,
};

use super::provisioning::{ProvisionError, ProvisioningEngine};

/// Committed result of a decision.
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    Approved {
        order: Order,
        subscriptions: Vec<Subscription>,
    },
    Rejected {
        order: Order,
    },
}

impl DecisionOutcome {
    /// The order as committed.
    pub fn order(&self) -> &Order {
        match self {
            DecisionOutcome::Approved { order, .. } | DecisionOutcome::Rejected { order } => order,
        }
    }

    pub fn decision(&self) -> Decision {
        match self {
            DecisionOutcome::Approved { .. } => Decision::Approve,
            DecisionOutcome::Rejected { .. } => Decision::Reject,
        }
    }
}

pub struct DecideOrderHandler {
    store: Arc<dyn OrderStore>,
    channel: Arc<dyn NotificationChannel>,
    admins: Arc<dyn AdminDirectory>,
    provisioning: ProvisioningEngine,
    transaction_timeout: Duration,
}

impl DecideOrderHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        channel: Arc<dyn NotificationChannel>,
        admins: Arc<dyn AdminDirectory>,
        provisioning: ProvisioningEngine,
        transaction_timeout: Duration,
    ) -> Self {
        Self {
            store,
            channel,
            admins,
            provisioning,
            transaction_timeout,
        }
    }

    pub async fn handle(&self, cmd: DecideOrderCommand) -> Result<DecisionOutcome, ApprovalError> {
        let outcome = self.decide(&cmd).await?;
        self.notify(&cmd, &outcome).await;
        Ok(outcome)
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.transaction_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn store_error(&self, err: DomainError) -> ApprovalError {
        ApprovalError::from_store(err, self.timeout_ms())
    }

    /// Opens the transaction and locks the order, bounded by the timeout.
    async fn lock_order(
        &self,
        order_id: &OrderId,
    ) -> Result<(Box<dyn OrderTransaction>, Option<Order>), ApprovalError> {
        let acquire = async {
            let mut tx = self.store.begin().await?;
            let order = tx.read_order_for_update(order_id).await?;
            Ok::<_, DomainError>((tx, order))
        };

        match tokio::time::timeout(self.transaction_timeout, acquire).await {
            Ok(result) => result.map_err(|e| self.store_error(e)),
            Err(_) => Err(ApprovalError::Timeout {
                timeout_ms: self.timeout_ms(),
            }),
        }
    }

    async fn abort(&self, tx: Box<dyn OrderTransaction>, order_id: &OrderId) {
        if let Err(e) = tx.rollback().await {
            tracing::warn!(order_id = %order_id, error = %e, "Rollback failed");
        }
    }

    async fn decide(&self, cmd: &DecideOrderCommand) -> Result<DecisionOutcome, ApprovalError> {
        let (mut tx, order) = self.lock_order(&cmd.order_id).await?;

        let Some(mut order) = order else {
            self.abort(tx, &cmd.order_id).await;
            return Err(ApprovalError::NotFound {
                order_id: cmd.order_id,
            });
        };

        if order.status_after(cmd.decision).is_err() {
            self.abort(tx, &cmd.order_id).await;
            tracing::info!(
                order_id = %order.id,
                status = %order.status,
                decision = %cmd.decision,
                "Order already decided"
            );
            return Err(ApprovalError::AlreadyDecided {
                order_id: order.id,
                status: order.status,
            });
        }

        let now = Timestamp::now();

        let subscriptions = match cmd.decision {
            Decision::Approve => match self.provisioning.provision(tx.as_mut(), &order, now).await {
                Ok(subscriptions) => subscriptions,
                Err(ProvisionError::Refused(err)) => {
                    self.abort(tx, &cmd.order_id).await;
                    tracing::warn!(order_id = %order.id, error = %err, "Approval refused");
                    return Err(err);
                }
                Err(ProvisionError::Store(err)) => {
                    self.abort(tx, &cmd.order_id).await;
                    return Err(self.store_error(err));
                }
            },
            Decision::Reject => Vec::new(),
        };

        let change = StatusChange::decide(&order, cmd.decision, cmd.admin.clone(), now);
        let new_status = change.new_status;
        match tx.write_order_status(change).await {
            Ok(StatusWrite::Applied) => {}
            Ok(StatusWrite::Conflict(current)) => {
                self.abort(tx, &cmd.order_id).await;
                tracing::info!(order_id = %order.id, status = %current, "Lost status race");
                return Err(ApprovalError::AlreadyDecided {
                    order_id: order.id,
                    status: current,
                });
            }
            Err(e) => {
                self.abort(tx, &cmd.order_id).await;
                return Err(self.store_error(e));
            }
        }

        tx.commit().await.map_err(|e| self.store_error(e))?;

        order.status = new_status;
        order.decided_by = Some(cmd.admin.clone());
        order.decided_at = Some(now);
        order.updated_at = now;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            status = %order.status,
            admin = %cmd.admin,
            subscriptions = subscriptions.len(),
            "Order decision committed"
        );

        Ok(match cmd.decision {
            Decision::Approve => DecisionOutcome::Approved {
                order,
                subscriptions,
            },
            Decision::Reject => DecisionOutcome::Rejected { order },
        })
    }

    /// Sends customer and admin notices. Failures are logged only.
    async fn notify(&self, cmd: &DecideOrderCommand, outcome: &DecisionOutcome) {
        let order = outcome.order();

        let customer = async {
            let Some(chat) = &order.customer_chat else {
                tracing::debug!(order_id = %order.id, "No customer chat, skipping notice");
                return;
            };
            let notice = match outcome {
                DecisionOutcome::Approved { subscriptions, .. } => {
                    notices::approval_notice(order, subscriptions)
                }
                DecisionOutcome::Rejected { .. } => notices::rejection_notice(order),
            };
            if let Err(e) = self.channel.send(chat, &notice).await {
                tracing::warn!(order_id = %order.id, error = %e, "Customer notice not delivered");
            }
        };

        let admin = async {
            let notice = notices::admin_confirmation(order, cmd.decision, &cmd.admin);
            if let Err(e) = self.channel.send(self.admins.admin_chat(), &notice).await {
                tracing::warn!(order_id = %order.id, error = %e, "Admin confirmation not delivered");
            }
        };

        futures::join!(customer, admin);
    }
}
