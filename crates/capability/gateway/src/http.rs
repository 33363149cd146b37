//! HTTP 网关实现
//!
//! 路径相对于 `api_base`（例如 `http://127.0.0.1:8080/api`）。操作员身份通过
//! `X-User-Id` 请求头传递，每个请求附带 `x-request-id` / `x-trace-id`。

use crate::error::GatewayError;
use crate::traits::RemoteGateway;
use api_contract::{
    AlertStatsDto, ApiError, AuditLogDto, BulkOutcomeDto, BulkRegisterRequest, CsvValidationDto,
    DepartmentDto, FacilityDto, FleetEntryDto, NodeStatusDto, RegistrationRequestDto,
    ResourcesDto, SecurityAlertDto, TempPasswordDto, UpdateEntryRequest,
};
use async_trait::async_trait;
use domain::{
    AlertStats, AuditLogEntry, BulkOutcome, CsvValidation, Department, EntryId, EntryUpdate,
    Facility, FleetEntry, NodeStatus, OperatorContext, RegistrationRequest, ResourcePatch,
    SecurityAlert, TemporaryCredential,
};
use fleet_telemetry::{new_request_ids, record_gateway_latency_ms};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// 基于 reqwest 的远端网关。
#[derive(Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    api_base: String,
}

impl HttpGateway {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str, ctx: Option<&OperatorContext>) -> RequestBuilder {
        let ids = new_request_ids();
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header("x-request-id", ids.request_id)
            .header("x-trace-id", ids.trace_id);
        if let Some(ctx) = ctx {
            builder = builder.header("X-User-Id", ctx.operator_id.to_string());
        }
        builder
    }

    /// 发送请求并把非 2xx 转换为 `Remote`。
    async fn send(&self, path: &str, builder: RequestBuilder) -> Result<Response, GatewayError> {
        let started_at = Instant::now();
        let result = builder.send().await;
        record_gateway_latency_ms(started_at.elapsed().as_millis() as u64);
        let response = result.map_err(|err| {
            warn!(target: "fleet.gateway", path = %path, error = %err, "gateway_transport_failed");
            GatewayError::Transport(err.to_string())
        })?;
        let status = response.status();
        if status.is_success() {
            debug!(target: "fleet.gateway", path = %path, status = status.as_u16(), "gateway_call_ok");
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .ok()
            .and_then(|err| err.message)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        warn!(
            target: "fleet.gateway",
            path = %path,
            status = status.as_u16(),
            message = %message,
            "gateway_remote_failed"
        );
        Err(GatewayError::Remote(message))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: Option<&OperatorContext>,
    ) -> Result<T, GatewayError> {
        let response = self
            .send(path, self.request(Method::GET, path, ctx))
            .await?;
        decode(response).await
    }

    async fn post_json<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: &OperatorContext,
        body: &B,
    ) -> Result<T, GatewayError> {
        let builder = self.request(Method::POST, path, Some(ctx)).json(body);
        let response = self.send(path, builder).await?;
        decode(response).await
    }

    /// 只关心成败、不解析响应体的调用。
    async fn execute(&self, path: &str, builder: RequestBuilder) -> Result<(), GatewayError> {
        self.send(path, builder).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| GatewayError::Decode(err.to_string()))
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn list_fleet(&self, ctx: &OperatorContext) -> Result<Vec<FleetEntry>, GatewayError> {
        let items: Vec<FleetEntryDto> = self.get_json("users", Some(ctx)).await?;
        Ok(items.into_iter().map(FleetEntry::from).collect())
    }

    async fn list_fleet_including_deleted(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<FleetEntry>, GatewayError> {
        let items: Vec<FleetEntryDto> = self
            .get_json("admin/users/all-including-deleted", Some(ctx))
            .await?;
        Ok(items.into_iter().map(FleetEntry::from).collect())
    }

    async fn list_node_statuses(&self) -> Result<Vec<NodeStatus>, GatewayError> {
        let items: Vec<NodeStatusDto> = self.get_json("nodes/status", None).await?;
        Ok(items.into_iter().map(NodeStatus::from).collect())
    }

    async fn get_diagnostics(&self, ctx: &OperatorContext) -> Result<ResourcePatch, GatewayError> {
        let dto: ResourcesDto = self
            .get_json("admin/system/diagnostics", Some(ctx))
            .await?;
        Ok(ResourcePatch::from(dto))
    }

    async fn get_system_resources(
        &self,
        ctx: &OperatorContext,
    ) -> Result<ResourcePatch, GatewayError> {
        let dto: ResourcesDto = self
            .get_json("admin/system/resources", Some(ctx))
            .await?;
        Ok(ResourcePatch::from(dto))
    }

    async fn list_security_alerts(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<SecurityAlert>, GatewayError> {
        let items: Vec<SecurityAlertDto> = self
            .get_json("admin/security/alerts", Some(ctx))
            .await?;
        Ok(items.into_iter().map(SecurityAlert::from).collect())
    }

    async fn get_security_alert_stats(
        &self,
        ctx: &OperatorContext,
    ) -> Result<AlertStats, GatewayError> {
        let dto: AlertStatsDto = self
            .get_json("admin/security/alerts/stats", Some(ctx))
            .await?;
        Ok(AlertStats::from(dto))
    }

    async fn acknowledge_alert(
        &self,
        ctx: &OperatorContext,
        alert_id: i64,
    ) -> Result<(), GatewayError> {
        let path = format!("admin/security/alerts/{}/acknowledge", alert_id);
        self.execute(&path, self.request(Method::POST, &path, Some(ctx)))
            .await
    }

    async fn resolve_alert(
        &self,
        ctx: &OperatorContext,
        alert_id: i64,
    ) -> Result<(), GatewayError> {
        let path = format!("admin/security/alerts/{}/resolve", alert_id);
        self.execute(&path, self.request(Method::POST, &path, Some(ctx)))
            .await
    }

    async fn list_audit_logs(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<AuditLogEntry>, GatewayError> {
        let items: Vec<AuditLogDto> = self.get_json("admin/audit-logs", Some(ctx)).await?;
        Ok(items.into_iter().map(AuditLogEntry::from).collect())
    }

    async fn list_facilities(&self, ctx: &OperatorContext) -> Result<Vec<Facility>, GatewayError> {
        let items: Vec<FacilityDto> = self.get_json("facilities", Some(ctx)).await?;
        Ok(items.into_iter().map(Facility::from).collect())
    }

    async fn list_departments(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<Department>, GatewayError> {
        let items: Vec<DepartmentDto> = self.get_json("departments", Some(ctx)).await?;
        Ok(items.into_iter().map(Department::from).collect())
    }

    async fn update_entry(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
        update: &EntryUpdate,
    ) -> Result<(), GatewayError> {
        let path = format!("users/{}", entry_id);
        let body = UpdateEntryRequest::from(update);
        self.execute(&path, self.request(Method::PUT, &path, Some(ctx)).json(&body))
            .await
    }

    async fn bulk_delete(
        &self,
        ctx: &OperatorContext,
        ids: &[EntryId],
    ) -> Result<BulkOutcome, GatewayError> {
        let dto: BulkOutcomeDto = self
            .post_json("admin/users/bulk-delete", ctx, ids)
            .await?;
        Ok(BulkOutcome::from(dto))
    }

    async fn bulk_reset_progress(
        &self,
        ctx: &OperatorContext,
        ids: &[EntryId],
    ) -> Result<(), GatewayError> {
        let path = "admin/users/bulk-reset-progress";
        self.execute(path, self.request(Method::POST, path, Some(ctx)).json(ids))
            .await
    }

    async fn restore_entry(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<(), GatewayError> {
        let path = format!("admin/users/{}/restore", entry_id);
        self.execute(&path, self.request(Method::POST, &path, Some(ctx)))
            .await
    }

    async fn validate_bulk_csv(
        &self,
        ctx: &OperatorContext,
        rows: &[RegistrationRequest],
    ) -> Result<CsvValidation, GatewayError> {
        let body: Vec<RegistrationRequestDto> =
            rows.iter().map(RegistrationRequestDto::from).collect();
        let dto: CsvValidationDto = self
            .post_json("admin/users/validate-csv", ctx, &body)
            .await?;
        Ok(CsvValidation::from(dto))
    }

    async fn bulk_register(
        &self,
        ctx: &OperatorContext,
        rows: &[RegistrationRequest],
        restore_ids: &[String],
    ) -> Result<BulkOutcome, GatewayError> {
        let body = BulkRegisterRequest {
            users: rows.iter().map(RegistrationRequestDto::from).collect(),
            restore_ids: restore_ids.to_vec(),
        };
        let dto: BulkOutcomeDto = self
            .post_json("admin/users/bulk-register-v2", ctx, &body)
            .await?;
        Ok(BulkOutcome::from(dto))
    }

    async fn issue_temporary_credential(
        &self,
        ctx: &OperatorContext,
        entry_id: EntryId,
    ) -> Result<TemporaryCredential, GatewayError> {
        let path = format!("users/{}/temp-password", entry_id);
        let response = self
            .send(&path, self.request(Method::POST, &path, Some(ctx)))
            .await?;
        let dto: TempPasswordDto = decode(response).await?;
        Ok(TemporaryCredential::from(dto))
    }

    async fn list_compliance_facilities(
        &self,
        ctx: &OperatorContext,
    ) -> Result<Vec<String>, GatewayError> {
        self.get_json("admin/compliance/facilities", Some(ctx)).await
    }

    async fn export_compliance_csv(
        &self,
        ctx: &OperatorContext,
        facility: Option<&str>,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Vec<u8>, GatewayError> {
        let path = "admin/compliance/export/csv";
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(facility) = facility {
            params.push(("facility", facility));
        }
        if let Some(start) = start_date {
            params.push(("start", start));
        }
        if let Some(end) = end_date {
            params.push(("end", end));
        }
        let builder = self.request(Method::GET, path, Some(ctx)).query(&params);
        let response = self.send(path, builder).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
