//! Session initialization.
//!
//! The init message is submitted first, then the session is flagged pending,
//! then the project's session quota is consulted. A failing step stops the
//! sequence without undoing earlier steps, and an exhausted quota only
//! changes the response: the session is already on its way downstream.
//! A verbose id that does not resolve fails before anything is submitted.

use crate::errors::{PublicGraphError, Result};
use crate::metrics_defs::{PENDING_FLAG_FAILURES, QUOTA_EXCEEDED};
use crate::protocol::{InitializeSessionRequest, InitializeSessionResponse, RequestContext};
use crate::resolver::PublicGraph;
use crate::store::ProductType;
use chrono::Utc;
use queue::Message;
use queue::message::InitializeSessionArgs;
use shared::counter;

impl PublicGraph {
    pub async fn initialize_session(
        &self,
        req: InitializeSessionRequest,
        context: RequestContext,
    ) -> Result<InitializeSessionResponse> {
        let Some(project_id) = self.projects.resolve(&req.organization_verbose_id) else {
            tracing::error!(
                verbose_id = %req.organization_verbose_id,
                client_config = %req.client_config,
                "An unsupported verbose id was used"
            );
            return Err(PublicGraphError::UnsupportedVerboseId {
                verbose_id: req.organization_verbose_id,
                response: InitializeSessionResponse {
                    secure_id: req.session_secure_id,
                    project_id: 0,
                },
            });
        };

        let secure_id = req.session_secure_id.clone();
        let message = Message::InitializeSession(InitializeSessionArgs {
            session_secure_id: req.session_secure_id,
            created_at: Utc::now(),
            project_verbose_id: req.organization_verbose_id,
            enable_strict_privacy: req.enable_strict_privacy,
            privacy_setting: req.privacy_setting,
            enable_recording_network_contents: req.enable_recording_network_contents,
            client_version: req.client_version,
            firstload_version: req.firstload_version,
            client_config: req.client_config,
            environment: req.environment,
            app_version: req.app_version,
            service_name: req.service_name.unwrap_or_default(),
            fingerprint: req.fingerprint,
            user_agent: context.user_agent,
            accept_language: context.accept_language,
            ip: context.ip,
            client_id: req.client_id,
            network_recording_domains: req.network_recording_domains,
            disable_session_recording: req.disable_session_recording,
        });
        self.submit(&secure_id, vec![message]).await?;

        if let Err(e) = self.store.set_pending_session(&secure_id, true).await {
            counter!(PENDING_FLAG_FAILURES).increment(1);
            tracing::error!(secure_id = %secure_id, error = %e, "Failed to mark session pending");
            return Err(e.into());
        }

        let response = InitializeSessionResponse {
            secure_id,
            project_id,
        };

        match self
            .store
            .is_billing_quota_exceeded(project_id, ProductType::Sessions)
            .await
        {
            Ok(true) => {
                counter!(QUOTA_EXCEEDED, "product" => ProductType::Sessions.as_str()).increment(1);
                tracing::info!(
                    secure_id = %response.secure_id,
                    project_id,
                    "Session quota exceeded"
                );
                Err(PublicGraphError::BillingQuotaExceeded { response })
            }
            Ok(false) => Ok(response),
            Err(e) => {
                tracing::warn!(project_id, error = %e, "Quota check failed, allowing session");
                Ok(response)
            }
        }
    }
}
