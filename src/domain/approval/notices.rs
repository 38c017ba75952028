//! Plain-text messages sent to admins and customers.

use crate::domain::foundation::AdminId;
use crate::domain::order::{Decision, Order, OrderStatus};
use crate::domain::subscription::Subscription;

use super::{ApprovalError, CallbackAction, DecideOrderCommand};

/// One inline button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeAction {
    pub label: String,
    pub data: String,
}

/// Outbound message: text plus optional buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub actions: Vec<NoticeAction>,
}

impl Notice {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, label: impl Into<String>, data: impl Into<String>) -> Self {
        self.actions.push(NoticeAction {
            label: label.into(),
            data: data.into(),
        });
        self
    }
}

fn item_lines(order: &Order) -> String {
    order
        .items
        .iter()
        .map(|i| {
            format!(
                "- {} x{} ({}) @ {}",
                i.product_name, i.quantity, i.duration, i.unit_price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Admin request to review a submitted receipt, with approve/reject buttons.
pub fn review_request(order: &Order) -> Notice {
    let receipt = order.receipt.as_deref().unwrap_or("not attached");
    let text = format!(
        "New order {} awaiting review\nCustomer: {}\nItems:\n{}\nTotal: {}\nPayment: {}\nReceipt: {}",
        order.order_number,
        order.user_id,
        item_lines(order),
        order.total,
        order.payment_method,
        receipt
    );
    Notice::text(text)
        .with_action("Approve", CallbackAction::approve(order.id).encode())
        .with_action("Reject", CallbackAction::reject(order.id).encode())
}

/// Customer notice for an approved order, including access details.
pub fn approval_notice(order: &Order, subscriptions: &[Subscription]) -> Notice {
    let mut text = format!(
        "Your order {} has been approved. Your subscriptions:",
        order.order_number
    );
    for (item, sub) in order.items.iter().zip(subscriptions) {
        text.push_str(&format!(
            "\n\n{} (until {})\n{}",
            item.product_name,
            sub.end_date.as_datetime().format("%Y-%m-%d"),
            sub.access_details
        ));
    }
    Notice::text(text)
}

pub fn rejection_notice(order: &Order) -> Notice {
    Notice::text(format!(
        "Your order {} was rejected after payment review. Contact support if you believe this is a mistake.",
        order.order_number
    ))
}

/// Admin confirmation after a committed decision.
pub fn admin_confirmation(order: &Order, decision: Decision, admin: &AdminId) -> Notice {
    let verb = match decision {
        Decision::Approve => "approved",
        Decision::Reject => "rejected",
    };
    Notice::text(format!(
        "Order {} {} by {} (total {})",
        order.order_number, verb, admin, order.total
    ))
}

/// Admin report for a decision that could not be completed.
pub fn admin_error_report(command: &DecideOrderCommand, error: &ApprovalError) -> Notice {
    let action = match error {
        ApprovalError::InsufficientStock { .. } => {
            "Restock the product, then press the button again."
        }
        ApprovalError::StoreUnavailable { .. } | ApprovalError::Timeout { .. } => {
            "The order is still awaiting review. Please retry."
        }
        ApprovalError::InvalidOrder { .. } => {
            "No changes were made. The order lines must be corrected before approval."
        }
        _ => "No changes were made.",
    };
    Notice::text(format!(
        "Could not {} order {}: {}\n{}",
        command.decision, command.order_id, error, action
    ))
}

/// Admin notice for a press on an order that was decided earlier.
pub fn already_processed(command: &DecideOrderCommand, status: OrderStatus) -> Notice {
    Notice::text(format!(
        "Order {} is already {}; the {} press by {} changed nothing.",
        command.order_id, status, command.decision, command.admin
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ProductId, Timestamp};
    use crate::domain::order::test_support::{item, order_with};
    use crate::domain::subscription::AccessDetails;

    #[test]
    fn review_request_carries_both_tokens() {
        let order = order_with(vec![item(ProductId::new(), 1, 1)]);

        let notice = review_request(&order);

        let tokens: Vec<_> = notice.actions.iter().map(|a| a.data.clone()).collect();
        assert_eq!(
            tokens,
            vec![format!("approve:{}", order.id), format!("reject:{}", order.id)]
        );
        assert!(notice.text.contains("ORD-1001"));
        assert!(notice.text.contains("Total: 45.00"));
        assert!(notice.text.contains("receipt-file-1"));
    }

    #[test]
    fn approval_notice_lists_access_details() {
        let order = order_with(vec![item(ProductId::new(), 1, 1)]);
        let sub = Subscription::provision(
            order.user_id.clone(),
            order.items[0].product_id,
            order.id,
            order.items[0].duration,
            AccessDetails::new("login: alice / pass: s3cret"),
            Timestamp::now(),
        )
        .unwrap();

        let notice = approval_notice(&order, &[sub]);

        assert!(notice.text.contains("approved"));
        assert!(notice.text.contains("login: alice / pass: s3cret"));
        assert!(notice.actions.is_empty());
    }

    #[test]
    fn error_report_tells_admin_what_to_do() {
        let cmd = DecideOrderCommand::new(
            crate::domain::foundation::OrderId::new(),
            Decision::Approve,
            AdminId::new("7").unwrap(),
        );
        let notice = admin_error_report(&cmd, &ApprovalError::Timeout { timeout_ms: 5_000 });

        assert!(notice.text.starts_with("Could not approve order"));
        assert!(notice.text.contains("retry"));
    }

    #[test]
    fn already_processed_names_status_and_presser() {
        let cmd = DecideOrderCommand::new(
            crate::domain::foundation::OrderId::new(),
            Decision::Reject,
            AdminId::new("7").unwrap(),
        );

        let notice = already_processed(&cmd, OrderStatus::Completed);

        assert_eq!(
            notice.text,
            format!("Order {} is already COMPLETED; the reject press by 7 changed nothing.", cmd.order_id)
        );
        assert!(notice.actions.is_empty());
    }
}
