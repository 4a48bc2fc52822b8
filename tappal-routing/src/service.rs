//! RoutingService - entry point for tappal operations.
//!
//! Ties the access evaluator and the status rules to the remote
//! collaborators. Every operation runs on behalf of a [`Session`]; local
//! validation happens before any collaborator is called. Operations that
//! take a caller's copy of a tappal decide access on the stored record,
//! and refuse a copy whose version is not the stored one.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use tappal_access::lifecycle::{allowed_targets, apply_transition, check_transition};
use tappal_access::{
    AccessDecision, AccessEvaluator, AccessGrant, Capabilities, Comment, Movement, Officer, Tappal,
    TappalStatus,
};

use crate::comments::{can_delete, CommentStore};
use crate::config::RoutingConfig;
use crate::directory::OfficerDirectory;
use crate::error::{Action, RemoteError, Result, RoutingError, StoreError};
use crate::forwarding::{check_request, check_target, eligible_targets, ForwardError, ForwardOutcome};
use crate::ledger::{path_gaps, PathGap};
use crate::session::Session;
use crate::store::{ForwardCommit, StatusChange, StatusCommit, TappalStore};

/// Everything an officer with view access sees when opening a tappal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TappalDetail {
    pub tappal: Tappal,
    /// Movement history, oldest first
    pub history: Vec<Movement>,
    pub capabilities: Capabilities,
    /// Rule that granted access
    pub grant: AccessGrant,
    /// Statuses the officer may move the tappal to
    pub allowed_statuses: Vec<TappalStatus>,
    /// Custody path discontinuities
    pub path_gaps: Vec<PathGap>,
}

/// Result of opening a tappal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum TappalView {
    Granted(TappalDetail),
    /// The officer may not see this tappal; nothing about it is disclosed
    Denied { tappal_id: String },
}

impl TappalView {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Granted(detail) => detail.capabilities,
            Self::Denied { .. } => Capabilities::none(),
        }
    }
}

/// Result of a committed status change.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    /// Authoritative tappal after the commit
    pub tappal: Tappal,
    /// Requester's capabilities afterwards
    pub capabilities: Capabilities,
}

/// Access decision together with the inputs it was computed from.
struct Evaluation {
    decision: AccessDecision,
    assignee: Option<Officer>,
    history: Vec<Movement>,
}

/// Main entry point for tappal routing.
pub struct RoutingService {
    config: RoutingConfig,
    evaluator: AccessEvaluator,
    store: Arc<dyn TappalStore>,
    directory: Arc<dyn OfficerDirectory>,
    comments: Arc<dyn CommentStore>,
}

impl RoutingService {
    /// Create a service over the given collaborators with default config.
    pub fn new(
        store: Arc<dyn TappalStore>,
        directory: Arc<dyn OfficerDirectory>,
        comments: Arc<dyn CommentStore>,
    ) -> Self {
        Self {
            config: RoutingConfig::default(),
            evaluator: AccessEvaluator::new(),
            store,
            directory,
            comments,
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: RoutingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &AccessEvaluator {
        &self.evaluator
    }

    /// Open a tappal: capabilities, history and the statuses on offer.
    pub async fn open(&self, session: &Session, tappal_id: &str) -> Result<TappalView> {
        self.require_token(session).await?;

        let tappal = self.load(tappal_id).await?;
        if self.config.ledger.verify_on_read {
            self.store.verify_history(tappal_id).await?;
        }

        let evaluation = self.evaluate(session.officer(), &tappal).await?;
        let decision = evaluation.decision;

        if decision.grant.is_denied() {
            warn!(
                tappal_id = %tappal_id,
                officer_id = %session.officer().id,
                "Tappal access denied"
            );
            return Ok(TappalView::Denied {
                tappal_id: tappal_id.to_string(),
            });
        }

        let allowed_statuses = if decision.capabilities.can_change_status {
            allowed_targets(tappal.status, &self.config.policy())
        } else {
            Vec::new()
        };
        let gaps = path_gaps(&evaluation.history, &tappal.assigned_to);

        Ok(TappalView::Granted(TappalDetail {
            tappal,
            history: evaluation.history,
            capabilities: decision.capabilities,
            grant: decision.grant,
            allowed_statuses,
            path_gaps: gaps,
        }))
    }

    /// Capabilities of the session's officer on a tappal.
    pub async fn capabilities(&self, session: &Session, tappal: &Tappal) -> Result<Capabilities> {
        self.require_token(session).await?;
        let tappal = self.current(tappal).await?;
        Ok(self.evaluate(session.officer(), &tappal).await?.decision.capabilities)
    }

    /// Forward a tappal to another officer.
    ///
    /// The movement append and the reassignment are committed together; on
    /// any error neither has happened.
    pub async fn forward(
        &self,
        session: &Session,
        tappal: &Tappal,
        to_officer_id: &str,
        reason: &str,
    ) -> Result<ForwardOutcome> {
        self.require_token(session).await?;
        let requester = session.officer();

        let max_reason_len = self.config.lifecycle.max_reason_len;
        check_request(requester, tappal, to_officer_id, reason, max_reason_len)?;

        let tappal = &self.current(tappal).await?;
        check_request(requester, tappal, to_officer_id, reason, max_reason_len)?;

        let evaluation = self.evaluate(requester, tappal).await?;
        self.require(evaluation.decision.capabilities.can_forward, requester, tappal, Action::Forward)?;

        let target = self
            .directory
            .lookup(to_officer_id)
            .await?
            .ok_or_else(|| ForwardError::UnknownOfficer(to_officer_id.to_string()))?;
        check_target(self.evaluator.hierarchy(), &target)?;

        let holder = evaluation
            .assignee
            .ok_or_else(|| RoutingError::OfficerNotFound(tappal.assigned_to.clone()))?;

        let receipt = self
            .store
            .commit_forward(ForwardCommit {
                tappal_id: tappal.id.clone(),
                expected_version: tappal.version,
                from: holder.snapshot(),
                to: target.snapshot(),
                reason: reason.trim().to_string(),
            })
            .await
            .map_err(|e| self.commit_failed(tappal, e))?;

        info!(
            tappal_id = %tappal.id,
            officer_id = %requester.id,
            from = %holder.id,
            to = %target.id,
            movement_id = %receipt.movement.id,
            "Tappal forwarded"
        );

        // the version check held the chain still, so this is the committed history
        let mut history = evaluation.history;
        history.push(receipt.movement.clone());
        let capabilities = self
            .evaluator
            .evaluate(requester, &receipt.tappal, Some(&target), &history)
            .capabilities;
        let gaps = path_gaps(&history, &receipt.tappal.assigned_to);

        Ok(ForwardOutcome {
            tappal: receipt.tappal,
            movement: receipt.movement,
            capabilities,
            path_gaps: gaps,
        })
    }

    /// Officers the session's officer may forward a tappal to. Empty when
    /// forwarding is not permitted.
    pub async fn forward_targets(&self, session: &Session, tappal: &Tappal) -> Result<Vec<Officer>> {
        self.require_token(session).await?;
        let requester = session.officer();

        let tappal = self.current(tappal).await?;
        let evaluation = self.evaluate(requester, &tappal).await?;
        if !evaluation.decision.capabilities.can_forward {
            return Ok(Vec::new());
        }

        let officers = self.directory.list().await?;
        Ok(eligible_targets(self.evaluator.hierarchy(), requester, &tappal, &officers)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Change a tappal's status.
    pub async fn transition(
        &self,
        session: &Session,
        tappal: &Tappal,
        status: TappalStatus,
        reason: &str,
    ) -> Result<TransitionOutcome> {
        self.require_token(session).await?;
        let requester = session.officer();

        let policy = self.config.policy();
        check_transition(tappal, status, reason, &policy)?;

        let tappal = &self.current(tappal).await?;
        check_transition(tappal, status, reason, &policy)?;

        let evaluation = self.evaluate(requester, tappal).await?;
        self.require(
            evaluation.decision.capabilities.can_change_status,
            requester,
            tappal,
            Action::ChangeStatus,
        )?;

        let at = Utc::now();
        let proposed = apply_transition(tappal, status, at);

        let updated = self
            .store
            .update_status(StatusCommit {
                tappal_id: tappal.id.clone(),
                expected_version: tappal.version,
                from_status: tappal.status,
                status: proposed.status,
                completed_at: proposed.completed_at,
                reason: reason.trim().to_string(),
                changed_by: requester.id.clone(),
                at,
            })
            .await
            .map_err(|e| self.commit_failed(tappal, e))?;

        info!(
            tappal_id = %tappal.id,
            officer_id = %requester.id,
            from = %tappal.status,
            to = %updated.status,
            "Tappal status changed"
        );

        let capabilities = self
            .evaluator
            .evaluate(
                requester,
                &updated,
                evaluation.assignee.as_ref(),
                &evaluation.history,
            )
            .capabilities;

        Ok(TransitionOutcome {
            tappal: updated,
            capabilities,
        })
    }

    /// Recorded status changes for a tappal the officer can view.
    pub async fn status_history(&self, session: &Session, tappal: &Tappal) -> Result<Vec<StatusChange>> {
        self.require_token(session).await?;
        let tappal = &self.current(tappal).await?;
        let evaluation = self.evaluate(session.officer(), tappal).await?;
        self.require(evaluation.decision.capabilities.can_view, session.officer(), tappal, Action::View)?;
        Ok(self.store.status_history(&tappal.id).await?)
    }

    /// Comments on a tappal the officer can view.
    pub async fn comments(&self, session: &Session, tappal: &Tappal) -> Result<Vec<Comment>> {
        let token = self.require_token(session).await?;
        let tappal = &self.current(tappal).await?;
        let evaluation = self.evaluate(session.officer(), tappal).await?;
        self.require(evaluation.decision.capabilities.can_view, session.officer(), tappal, Action::View)?;

        let result = self.comments.list(&token, &tappal.id).await;
        self.remote(session, result).await
    }

    /// Add a comment to a tappal the officer can view.
    pub async fn add_comment(&self, session: &Session, tappal: &Tappal, body: &str) -> Result<Comment> {
        let token = self.require_token(session).await?;
        let author = session.officer();

        let body = body.trim();
        if body.is_empty() {
            return Err(RoutingError::InvalidComment("comment body is empty".to_string()));
        }
        let max = self.config.comments.max_body_len;
        if body.chars().count() > max {
            return Err(RoutingError::InvalidComment(format!(
                "comment exceeds {} characters",
                max
            )));
        }

        let tappal = &self.current(tappal).await?;
        let evaluation = self.evaluate(author, tappal).await?;
        self.require(evaluation.decision.capabilities.can_view, author, tappal, Action::Comment)?;

        let result = self.comments.create(&token, Comment::new(&tappal.id, author, body)).await;
        let comment = self.remote(session, result).await?;

        info!(tappal_id = %tappal.id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }

    /// Delete a comment. Only its author or an administrator may.
    pub async fn delete_comment(&self, session: &Session, comment_id: &str) -> Result<()> {
        let token = self.require_token(session).await?;
        let officer = session.officer();

        let result = self.comments.get(&token, comment_id).await;
        let comment = self
            .remote(session, result)
            .await?
            .ok_or_else(|| RoutingError::CommentNotFound(comment_id.to_string()))?;

        if !can_delete(self.evaluator.hierarchy(), officer, &comment) {
            error!(
                officer_id = %officer.id,
                comment_id = %comment_id,
                "Comment deletion outside capability set"
            );
            return Err(RoutingError::CapabilityViolation {
                officer_id: officer.id.clone(),
                tappal_id: comment.tappal_id,
                action: Action::DeleteComment,
            });
        }

        let result = self.comments.delete(&token, comment_id).await;
        if !self.remote(session, result).await? {
            return Err(RoutingError::CommentNotFound(comment_id.to_string()));
        }

        info!(tappal_id = %comment.tappal_id, comment_id = %comment_id, "Comment deleted");
        Ok(())
    }

    /// Register a newly received tappal with its first holder.
    pub async fn intake(&self, session: &Session, mut tappal: Tappal) -> Result<Tappal> {
        self.require_token(session).await?;

        if self.directory.lookup(&tappal.assigned_to).await?.is_none() {
            return Err(RoutingError::OfficerNotFound(tappal.assigned_to));
        }

        tappal.status = TappalStatus::Pending;
        tappal.completed_at = None;
        tappal.version = 0;

        let stored = self.store.insert(tappal).await?;
        info!(
            tappal_id = %stored.id,
            officer_id = %session.officer().id,
            assigned_to = %stored.assigned_to,
            "Tappal registered"
        );
        Ok(stored)
    }

    async fn require_token(&self, session: &Session) -> Result<String> {
        session.token().await.ok_or(RoutingError::Unauthenticated)
    }

    async fn load(&self, tappal_id: &str) -> Result<Tappal> {
        self.store
            .load(tappal_id)
            .await?
            .ok_or_else(|| RoutingError::NotFound(tappal_id.to_string()))
    }

    /// Stored record for a caller's copy, provided the copy is not stale.
    async fn current(&self, copy: &Tappal) -> Result<Tappal> {
        let stored = self.load(&copy.id).await?;
        if stored.version != copy.version {
            warn!(
                tappal_id = %copy.id,
                expected = copy.version,
                actual = stored.version,
                "Stale tappal, reload required"
            );
            return Err(RoutingError::Conflict {
                tappal_id: copy.id.clone(),
                expected: copy.version,
                actual: stored.version,
            });
        }
        Ok(stored)
    }

    async fn evaluate(&self, requester: &Officer, tappal: &Tappal) -> Result<Evaluation> {
        let assignee = self.directory.lookup(&tappal.assigned_to).await?;
        if assignee.is_none() {
            debug!(
                tappal_id = %tappal.id,
                assigned_to = %tappal.assigned_to,
                "Assignee not in directory"
            );
        }
        let history = self.store.history(&tappal.id).await?;
        let decision = self
            .evaluator
            .evaluate(requester, tappal, assignee.as_ref(), &history);

        Ok(Evaluation {
            decision,
            assignee,
            history,
        })
    }

    fn require(&self, granted: bool, officer: &Officer, tappal: &Tappal, action: Action) -> Result<()> {
        if granted {
            return Ok(());
        }
        error!(
            tappal_id = %tappal.id,
            officer_id = %officer.id,
            action = %action,
            "Action outside capability set"
        );
        Err(RoutingError::CapabilityViolation {
            officer_id: officer.id.clone(),
            tappal_id: tappal.id.clone(),
            action,
        })
    }

    fn commit_failed(&self, tappal: &Tappal, err: StoreError) -> RoutingError {
        match &err {
            StoreError::Conflict { expected, actual, .. } => {
                warn!(tappal_id = %tappal.id, expected, actual, "Stale tappal, reload required");
            }
            StoreError::Diverged { field, expected, actual, .. } => {
                warn!(tappal_id = %tappal.id, field, %expected, %actual, "Commit diverged from stored tappal");
            }
            other => {
                warn!(tappal_id = %tappal.id, error = %other, "Commit failed");
            }
        }
        err.into()
    }

    async fn remote<T>(&self, session: &Session, result: std::result::Result<T, RemoteError>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.invalidates_session() {
                    session.invalidate().await;
                }
                Err(err.into())
            }
        }
    }
}
