//! NextDNS wire types

use dnsync_core::RemoteEntry;
use serde::{Deserialize, Serialize};

/// `{"data": [...]}`
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default)]
    pub data: Vec<T>,
}

/// `{"data": {...}}`
#[derive(Debug, Deserialize)]
pub struct SingleResponse<T> {
    pub data: T,
}

/// Denylist item; the id is the domain itself
#[derive(Debug, Clone, Deserialize)]
pub struct DenyDto {
    pub id: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Rewrite item
#[derive(Debug, Clone, Deserialize)]
pub struct RewriteDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub record_type: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateDenyDto<'a> {
    pub id: &'a str,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateRewriteDto<'a> {
    pub name: &'a str,
    pub content: String,
}

fn default_active() -> bool {
    true
}

impl From<DenyDto> for RemoteEntry {
    fn from(dto: DenyDto) -> Self {
        RemoteEntry::deny(dto.id.clone(), dto.id, dto.active)
    }
}

impl From<RewriteDto> for RemoteEntry {
    fn from(dto: RewriteDto) -> Self {
        RemoteEntry::rewrite(dto.id, dto.name, dto.content)
    }
}
