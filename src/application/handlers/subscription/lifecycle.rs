//! SubscriptionLifecycle - The ten subscription event handlers.
//!
//! Each handler records the provider's view of the subscription through the
//! [`SubscriptionStore`] and then tells the customer through the [`Notifier`].
//!
//! The customer message is its own idempotent step. Once every state write of
//! a handler has succeeded, a `notified` marker describing the announced state
//! is upserted onto the record. The message is sent only when that upsert
//! changed the marker, so a redelivery stays quiet while a retry after a
//! failed write still reaches the customer. Sends run on a spawned task and
//! never hold up the acknowledgement.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::foundation::{StateMachine, Timestamp};
use crate::domain::subscription::{
    plan_name, templates_count, DispatchDetails, DispatchResult, EventKind, HandlerError,
    InboundNotification, NotificationPayload, PaymentEntity, SubscriptionEntity,
    SubscriptionStatus,
};
use crate::ports::{
    Notification, NotificationTemplate, Notifier, RecordFields, RecordKind, SubscriptionStore,
    UpsertOutcome,
};

/// Days a halted subscription keeps access while the customer fixes payment.
pub const GRACE_PERIOD_DAYS: i64 = 7;

/// Record field holding the marker of the last customer announcement.
const NOTIFIED_FIELD: &str = "notified";

/// Applies subscription lifecycle events.
///
/// Stateless apart from its collaborators; one instance serves every request.
#[derive(Clone)]
pub struct SubscriptionLifecycle {
    store: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    app_url: String,
}

impl SubscriptionLifecycle {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Route a verified notification to its handler.
    ///
    /// Event names outside [`EventKind`] are acknowledged as ignored.
    pub async fn dispatch(
        &self,
        notification: &InboundNotification,
    ) -> Result<DispatchResult, HandlerError> {
        let Some(kind) = notification.kind() else {
            tracing::warn!(event = %notification.event, "Unhandled event type");
            return Ok(DispatchResult::ignored(&notification.event));
        };

        let payload = notification
            .decode_payload()
            .map_err(HandlerError::MalformedPayload)?;

        match kind {
            EventKind::Authenticated => self.authenticated(&payload).await,
            EventKind::Activated => self.activated(&payload).await,
            EventKind::Charged => self.charged(&payload).await,
            EventKind::Paused => self.paused(&payload).await,
            EventKind::Resumed => self.resumed(&payload).await,
            EventKind::Pending => self.pending(&payload).await,
            EventKind::Halted => self.halted(&payload).await,
            EventKind::Cancelled => self.cancelled(&payload).await,
            EventKind::Completed => self.completed(&payload).await,
            EventKind::Updated => self.updated(&payload).await,
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Handlers
    // ════════════════════════════════════════════════════════════════════════

    /// Mandate set up; first charge scheduled.
    async fn authenticated(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;
        let next_charge = subscription.charge_at();

        tracing::info!(
            subscription_id = %subscription.id,
            customer_id = ?subscription.customer_id,
            plan_id = ?subscription.plan_id,
            "Subscription authenticated"
        );

        let written = self
            .record_subscription(
                EventKind::Authenticated,
                subscription,
                fields([("charge_at", json!(next_charge))]),
            )
            .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionAuthenticated,
            subscription,
            &written,
            json!({
                "plan_name": plan_name(subscription.plan_id.as_deref()),
                "next_charge_date": next_charge,
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription authenticated successfully",
            DispatchDetails::Authenticated {
                subscription_id: subscription.id.clone(),
                next_charge,
            },
        ))
    }

    /// First payment succeeded; grant access.
    async fn activated(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;
        let period_start = subscription.current_start();
        let period_end = subscription.current_end();

        tracing::info!(
            subscription_id = %subscription.id,
            period_start = ?period_start,
            period_end = ?period_end,
            "Subscription activated"
        );

        let written = self
            .record_subscription(
                EventKind::Activated,
                subscription,
                fields([
                    ("current_period_start", json!(period_start)),
                    ("current_period_end", json!(period_end)),
                ]),
            )
            .await?;
        self.record_customer(
            EventKind::Activated,
            subscription,
            fields([("plan_id", json!(subscription.plan_id))]),
        )
        .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionActivated,
            subscription,
            &written,
            json!({
                "plan_name": plan_name(subscription.plan_id.as_deref()),
                "access_url": self.link("/dashboard"),
                "templates_count": templates_count(subscription.plan_id.as_deref()),
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription activated and access granted",
            DispatchDetails::Activated {
                subscription_id: subscription.id.clone(),
                plan_id: subscription.plan_id.clone(),
                period_end,
            },
        ))
    }

    /// Recurring payment succeeded; record it once per payment id.
    async fn charged(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;
        let payment = payment_entity(payload)?;
        let amount = payment.amount;
        let next_charge = subscription.charge_at();

        tracing::info!(
            payment_id = %payment.id,
            subscription_id = %subscription.id,
            amount_minor = amount.minor(),
            currency = ?payment.currency,
            next_charge = ?next_charge,
            "Subscription charged"
        );

        let payment_outcome = self
            .store
            .upsert(
                RecordKind::Payment,
                &payment.id,
                payment_fields(payment, &subscription.id),
            )
            .await?;
        let already_recorded = payment_outcome != UpsertOutcome::Inserted;
        if already_recorded {
            tracing::info!(payment_id = %payment.id, "Payment already recorded");
        }

        self.record_subscription(
            EventKind::Charged,
            subscription,
            fields([
                ("last_payment_id", json!(payment.id)),
                ("current_period_start", json!(subscription.current_start())),
                ("current_period_end", json!(subscription.current_end())),
                ("next_charge_at", json!(next_charge)),
            ]),
        )
        .await?;
        self.record_customer(EventKind::Charged, subscription, RecordFields::new())
            .await?;

        // Keyed on the payment record: one receipt per payment id.
        self.announce(
            RecordKind::Payment,
            &payment.id,
            json!(NotificationTemplate::PaymentSuccess.as_str()),
            NotificationTemplate::PaymentSuccess,
            subscription,
            json!({
                "amount": amount.to_string(),
                "payment_id": payment.id,
                "plan_name": plan_name(subscription.plan_id.as_deref()),
                "next_billing_date": next_charge,
                "invoice_url": self.link(&format!("/invoice/{}", payment.id)),
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Payment recorded successfully",
            DispatchDetails::Charged {
                payment_id: payment.id.clone(),
                subscription_id: subscription.id.clone(),
                amount,
                currency: payment.currency.clone(),
                next_charge,
                already_recorded,
            },
        ))
    }

    /// Suspend access but keep data.
    async fn paused(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;

        tracing::info!(subscription_id = %subscription.id, "Subscription paused");

        let written = self
            .record_subscription(EventKind::Paused, subscription, RecordFields::new())
            .await?;
        self.record_customer(EventKind::Paused, subscription, RecordFields::new())
            .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionPaused,
            subscription,
            &written,
            json!({ "resume_url": self.link("/subscription/manage") }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription paused successfully",
            DispatchDetails::Paused {
                subscription_id: subscription.id.clone(),
            },
        ))
    }

    /// Restore access after a pause.
    async fn resumed(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;
        let next_charge = subscription.charge_at();

        tracing::info!(subscription_id = %subscription.id, "Subscription resumed");

        let written = self
            .record_subscription(
                EventKind::Resumed,
                subscription,
                fields([("next_charge_at", json!(next_charge))]),
            )
            .await?;
        self.record_customer(EventKind::Resumed, subscription, RecordFields::new())
            .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionResumed,
            subscription,
            &written,
            json!({
                "access_url": self.link("/dashboard"),
                "next_billing_date": next_charge,
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription resumed successfully",
            DispatchDetails::Resumed {
                subscription_id: subscription.id.clone(),
                next_charge,
            },
        ))
    }

    /// A charge failed and the provider will retry.
    async fn pending(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;
        let next_retry = subscription.charge_at();

        tracing::info!(
            subscription_id = %subscription.id,
            next_retry = ?next_retry,
            remaining = ?subscription.remaining_count,
            "Subscription pending, payment retry scheduled"
        );

        let written = self
            .record_subscription(
                EventKind::Pending,
                subscription,
                fields([
                    ("retry_count", json!(subscription.remaining_count)),
                    ("next_retry_at", json!(next_retry)),
                ]),
            )
            .await?;

        self.announce_state(
            NotificationTemplate::PaymentRetry,
            subscription,
            &written,
            json!({
                "next_retry_date": next_retry,
                "manage_url": self.link("/subscription/manage"),
                "remaining_attempts": subscription.remaining_count,
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription marked as pending",
            DispatchDetails::Pending {
                subscription_id: subscription.id.clone(),
                next_retry,
                remaining_attempts: subscription.remaining_count,
            },
        ))
    }

    /// Retries exhausted; start the grace period.
    ///
    /// A redelivery keeps the grace period that was started first.
    async fn halted(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;

        let existing = self
            .store
            .get(RecordKind::Subscription, &subscription.id)
            .await?;
        let started_grace = existing
            .as_ref()
            .filter(|r| r.str_field("status") == Some(SubscriptionStatus::Halted.as_str()))
            .and_then(|r| r.fields.get("grace_period_ends"))
            .and_then(|v| serde_json::from_value::<Timestamp>(v.clone()).ok());
        let grace_period_ends =
            started_grace.unwrap_or_else(|| Timestamp::now().add_days(GRACE_PERIOD_DAYS));

        tracing::warn!(
            subscription_id = %subscription.id,
            grace_period_ends = %grace_period_ends,
            "Subscription halted, payment failed"
        );

        let written = self
            .record_subscription(
                EventKind::Halted,
                subscription,
                fields([("grace_period_ends", json!(grace_period_ends))]),
            )
            .await?;
        self.record_customer(
            EventKind::Halted,
            subscription,
            fields([("grace_period_ends", json!(grace_period_ends))]),
        )
        .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionHalted,
            subscription,
            &written,
            json!({
                "grace_period_days": GRACE_PERIOD_DAYS,
                "reactivate_url": self.link("/subscription/reactivate"),
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription halted, grace period started",
            DispatchDetails::Halted {
                subscription_id: subscription.id.clone(),
                grace_period_days: GRACE_PERIOD_DAYS,
                grace_period_ends,
            },
        ))
    }

    /// Schedule access revocation at the provider's `end_at`.
    async fn cancelled(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;
        let access_until = subscription.end_at();

        tracing::info!(
            subscription_id = %subscription.id,
            access_until = ?access_until,
            "Subscription cancelled"
        );

        let written = self
            .record_subscription(
                EventKind::Cancelled,
                subscription,
                fields([("access_ends", json!(access_until))]),
            )
            .await?;
        self.record_customer(
            EventKind::Cancelled,
            subscription,
            fields([("access_ends", json!(access_until))]),
        )
        .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionCancelled,
            subscription,
            &written,
            json!({
                "access_until": access_until,
                "resubscribe_url": self.link("/pricing"),
                "feedback_url": self.link("/feedback"),
                "export_data_url": self.link("/export"),
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription cancelled successfully",
            DispatchDetails::Cancelled {
                subscription_id: subscription.id.clone(),
                access_until,
            },
        ))
    }

    /// All billing cycles charged.
    async fn completed(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;

        tracing::info!(
            subscription_id = %subscription.id,
            total_payments = ?subscription.paid_count,
            "Subscription completed"
        );

        let written = self
            .record_subscription(
                EventKind::Completed,
                subscription,
                fields([("total_payments", json!(subscription.paid_count))]),
            )
            .await?;
        self.record_customer(EventKind::Completed, subscription, RecordFields::new())
            .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionCompleted,
            subscription,
            &written,
            json!({
                "total_payments": subscription.paid_count,
                "renewal_url": self.link("/pricing"),
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription completed successfully",
            DispatchDetails::Completed {
                subscription_id: subscription.id.clone(),
                total_payments: subscription.paid_count,
            },
        ))
    }

    /// Plan or quantity changed; billing period recomputed by the provider.
    async fn updated(
        &self,
        payload: &NotificationPayload,
    ) -> Result<DispatchResult, HandlerError> {
        let subscription = subscription_entity(payload)?;
        let period_start = subscription.current_start();

        tracing::info!(
            subscription_id = %subscription.id,
            plan_id = ?subscription.plan_id,
            quantity = ?subscription.quantity,
            "Subscription updated"
        );

        let written = self
            .record_subscription(
                EventKind::Updated,
                subscription,
                fields([
                    ("quantity", json!(subscription.quantity)),
                    ("current_period_start", json!(period_start)),
                    ("current_period_end", json!(subscription.current_end())),
                ]),
            )
            .await?;

        self.announce_state(
            NotificationTemplate::SubscriptionUpdated,
            subscription,
            &written,
            json!({
                "new_plan_name": plan_name(subscription.plan_id.as_deref()),
                "effective_date": period_start,
                "manage_url": self.link("/subscription/manage"),
            }),
        )
        .await?;

        Ok(DispatchResult::success(
            "Subscription updated successfully",
            DispatchDetails::Updated {
                subscription_id: subscription.id.clone(),
                new_plan: subscription.plan_id.clone(),
                quantity: subscription.quantity,
            },
        ))
    }

    // ════════════════════════════════════════════════════════════════════════
    // Collaborator helpers
    // ════════════════════════════════════════════════════════════════════════

    /// Upsert the subscription record with the status `kind` leads to.
    ///
    /// Transitions the state machine does not allow are logged and applied
    /// anyway: deliveries can arrive out of order and the provider is the
    /// source of truth. Returns the fields written.
    async fn record_subscription(
        &self,
        kind: EventKind,
        subscription: &SubscriptionEntity,
        mut extra: RecordFields,
    ) -> Result<RecordFields, HandlerError> {
        let target = kind.resulting_status();

        let current = self
            .store
            .get(RecordKind::Subscription, &subscription.id)
            .await?
            .and_then(|r| r.str_field("status").and_then(SubscriptionStatus::parse));
        if let Some(current) = current.filter(|current| *current != target) {
            if let Err(e) = current.transition_to(target) {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    event = %kind,
                    from_terminal = current.is_terminal(),
                    error = %e,
                    "Out-of-order subscription transition"
                );
            }
        }

        extra.insert("status".to_string(), json!(target.as_str()));
        if let Some(plan_id) = &subscription.plan_id {
            extra.insert("plan_id".to_string(), json!(plan_id));
        }
        if let Some(customer_id) = &subscription.customer_id {
            extra.insert("customer_id".to_string(), json!(customer_id));
        }

        let outcome = self
            .store
            .upsert(RecordKind::Subscription, &subscription.id, extra.clone())
            .await?;
        tracing::debug!(subscription_id = %subscription.id, ?outcome, "Subscription recorded");
        Ok(extra)
    }

    /// Mirror access state onto the customer record, when the customer is known.
    async fn record_customer(
        &self,
        kind: EventKind,
        subscription: &SubscriptionEntity,
        mut extra: RecordFields,
    ) -> Result<(), HandlerError> {
        let Some(customer_id) = subscription.customer_id.as_deref() else {
            return Ok(());
        };
        let status = kind.resulting_status();

        extra.insert("subscription_status".to_string(), json!(status.as_str()));
        extra.insert("has_access".to_string(), json!(status.has_access()));
        extra.insert("subscription_id".to_string(), json!(subscription.id));

        self.store
            .upsert(RecordKind::Customer, customer_id, extra)
            .await?;
        Ok(())
    }

    /// Announce a subscription state, keyed on the template and the fields
    /// just written.
    async fn announce_state(
        &self,
        template: NotificationTemplate,
        subscription: &SubscriptionEntity,
        written: &RecordFields,
        data: Value,
    ) -> Result<(), HandlerError> {
        let marker = json!({ "template": template.as_str(), "state": written });
        self.announce(
            RecordKind::Subscription,
            &subscription.id,
            marker,
            template,
            subscription,
            data,
        )
        .await
    }

    /// Claim the announcement `marker` on a record, then send the message.
    ///
    /// Must run after every state write of the handler. An unchanged marker
    /// means this exact state was already announced.
    async fn announce(
        &self,
        record: RecordKind,
        record_id: &str,
        marker: Value,
        template: NotificationTemplate,
        subscription: &SubscriptionEntity,
        data: Value,
    ) -> Result<(), HandlerError> {
        let claim = self
            .store
            .upsert(record, record_id, fields([(NOTIFIED_FIELD, marker)]))
            .await?;
        if claim == UpsertOutcome::Unchanged {
            tracing::debug!(
                template = template.as_str(),
                subscription_id = %subscription.id,
                "Customer already notified"
            );
            return Ok(());
        }

        self.notify_customer(template, subscription, data);
        Ok(())
    }

    /// Send a customer message in the background; failures are logged and
    /// dropped.
    fn notify_customer(
        &self,
        template: NotificationTemplate,
        subscription: &SubscriptionEntity,
        data: Value,
    ) {
        let notification = Notification::to_customer(
            template,
            subscription.customer_id.as_deref(),
            &subscription.id,
            data,
        );
        let notifier = Arc::clone(&self.notifier);
        let subscription_id = subscription.id.clone();

        tokio::spawn(async move {
            if let Err(e) = notifier.send(notification).await {
                tracing::error!(
                    error = %e,
                    template = template.as_str(),
                    subscription_id = %subscription_id,
                    "Failed to send customer notification"
                );
            }
        });
    }

    fn link(&self, path: &str) -> String {
        format!("{}{}", self.app_url, path)
    }
}

fn subscription_entity(payload: &NotificationPayload) -> Result<&SubscriptionEntity, HandlerError> {
    payload
        .subscription()
        .ok_or(HandlerError::MissingEntity("subscription"))
}

fn payment_entity(payload: &NotificationPayload) -> Result<&PaymentEntity, HandlerError> {
    payload
        .payment()
        .ok_or(HandlerError::MissingEntity("payment"))
}

fn payment_fields(payment: &PaymentEntity, subscription_id: &str) -> RecordFields {
    fields([
        ("subscription_id", json!(subscription_id)),
        ("amount", json!(payment.amount)),
        ("amount_minor", json!(payment.amount.minor())),
        ("currency", json!(payment.currency)),
        ("method", json!(payment.method)),
        ("status", json!(payment.status)),
        ("paid_at", json!(payment.paid_at())),
    ])
}

/// Build a field map, dropping nulls so absent provider values never erase
/// stored ones.
fn fields<const N: usize>(pairs: [(&str, Value); N]) -> RecordFields {
    pairs
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
