//! JSON-RPC request handler for Unix socket transport

use std::sync::Arc;

use tracing::debug;

use crate::{
    core::{bridge::MobileAccessBridge, error::BridgeResult},
    protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, Request, RequestId, Response},
    sdk::access_sdk::SdkProvider,
};

/// JSON-RPC request handler
pub struct RequestHandler<P: SdkProvider> {
    bridge: Arc<MobileAccessBridge<P>>,
}

impl<P: SdkProvider> Clone for RequestHandler<P> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
        }
    }
}

impl<P: SdkProvider> RequestHandler<P> {
    /// Create a new request handler
    pub fn new(bridge: Arc<MobileAccessBridge<P>>) -> Self {
        Self { bridge }
    }

    /// Handle a JSON-RPC request
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!(id = ?request.id, request = ?request.request, "Handling request");
        let result = self.dispatch(request.request).await;
        Self::respond(result, request.id)
    }

    async fn dispatch(&self, request: Request) -> BridgeResult<Response> {
        let bridge = &self.bridge;
        match request {
            Request::Configure(params) => {
                bridge.configure(&params);
                Ok(Response::ack())
            }
            Request::SetAutomaticAccessEnabled(params) => {
                bridge.set_automatic_access_enabled(params.enabled);
                Ok(Response::ack())
            }
            Request::SetScanning(params) => {
                bridge.set_scanning(params.enabled);
                Ok(Response::ack())
            }
            Request::SetBackgroundScanningMode(params) => {
                bridge.set_background_scanning_mode(&params.mode);
                Ok(Response::ack())
            }
            Request::ResolveInvitationUrl(params) => bridge
                .resolve_invitation_url(&params.host, &params.invitation_code)
                .map(Response::Url),
            Request::RegisterCredential(params) => bridge
                .register_credential(&params.url)
                .await
                .map(Response::Registration),
            Request::RegisterCredentialContinue(params) => bridge
                .register_credential_continue(
                    &params.continuation_point,
                    params.second_factor_selected,
                    &params.authentication_type,
                )
                .await
                .map(Response::Registration),
            Request::GetStates => bridge.states().map(Response::States),
            Request::GetCredentials => bridge.credentials().map(Response::Credentials),
            Request::DeleteCredential(params) => bridge
                .delete_credential(&params.credential_id)
                .await
                .map(Response::Credential),
        }
    }

    fn respond(result: BridgeResult<Response>, id: RequestId) -> JsonRpcResponse {
        match result {
            Ok(response) => JsonRpcResponse::success(response, id),
            Err(e) => {
                debug!(kind = e.kind(), error = %e, "Request failed");
                JsonRpcResponse::error(JsonRpcError::from_bridge(&e), id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{registration::CONTINUATION_TTL, types::ConfigureParams},
        protocol::{RegisterCredentialContinueParams, RegisterCredentialParams},
        sdk::simulated::{
            RegistrationOutcome, RegistrationScript, SimulatedSdk, SimulatedSdkProvider,
        },
    };

    fn handler() -> (RequestHandler<SimulatedSdkProvider>, Arc<SimulatedSdk>) {
        let sdk = Arc::new(SimulatedSdk::new());
        let bridge = MobileAccessBridge::new(
            SimulatedSdkProvider::new(sdk.clone()),
            CONTINUATION_TTL,
            16,
        );
        (RequestHandler::new(Arc::new(bridge)), sdk)
    }

    async fn call(
        handler: &RequestHandler<SimulatedSdkProvider>,
        request: Request,
    ) -> JsonRpcResponse {
        handler
            .handle_request(JsonRpcRequest::new(request, RequestId::Number(1)))
            .await
    }

    #[tokio::test]
    async fn test_get_states_before_configure() {
        let (handler, _sdk) = handler();

        let response = call(&handler, Request::GetStates).await;

        assert!(response.result.is_none());
        let error = response.error.unwrap();
        assert_eq!(error.code, JsonRpcError::NOT_CONFIGURED);
        assert_eq!(error.kind(), Some("not_configured"));
        assert_eq!(response.id, RequestId::Number(1));
    }

    #[tokio::test]
    async fn test_configure_then_get_credentials() {
        let (handler, _sdk) = handler();

        let response = call(&handler, Request::Configure(ConfigureParams::default())).await;
        assert_eq!(response.result, Some(Response::ack()));

        let response = call(&handler, Request::GetCredentials).await;
        assert_eq!(response.result, Some(Response::Credentials(vec![])));
    }

    #[tokio::test]
    async fn test_two_step_registration() {
        let (handler, sdk) = handler();
        sdk.set_second_factor_required(true);
        call(&handler, Request::Configure(ConfigureParams::default())).await;

        let response = call(
            &handler,
            Request::RegisterCredential(RegisterCredentialParams {
                url: "https://cloud.example.com/invite/ABC".to_string(),
            }),
        )
        .await;
        let Some(Response::Registration(first)) = response.result else {
            panic!("expected registration result");
        };
        assert!(!first.completed);

        let response = call(
            &handler,
            Request::RegisterCredentialContinue(RegisterCredentialContinueParams {
                continuation_point: first.continuation_point.unwrap(),
                second_factor_selected: true,
                authentication_type: "fingerprint".to_string(),
            }),
        )
        .await;
        let Some(Response::Registration(second)) = response.result else {
            panic!("expected registration result");
        };
        assert!(second.completed);
        assert_eq!(second.credential.unwrap().facility_name, "cloud.example.com");
    }

    #[tokio::test]
    async fn test_registration_failure_kind() {
        let (handler, sdk) = handler();
        sdk.push_registration(RegistrationScript::Immediate(RegistrationOutcome::Fail(
            "invitation expired".to_string(),
        )));
        call(&handler, Request::Configure(ConfigureParams::default())).await;

        let response = call(
            &handler,
            Request::RegisterCredential(RegisterCredentialParams {
                url: "https://cloud.example.com/invite/ABC".to_string(),
            }),
        )
        .await;

        let error = response.error.unwrap();
        assert_eq!(error.kind(), Some("registration_failed"));
        assert_eq!(error.message, "invitation expired");
    }
}
