//! API 클라이언트 생성

use anyhow::Context as _;
use dct_client::{ApiClient, ClientFactory, ProfileStore};

use crate::context::EffectiveContext;

/// 프로필 파일과 컨텍스트로 컨트롤 플레인 클라이언트 생성
pub fn control_plane(ctx: &EffectiveContext) -> anyhow::Result<ApiClient> {
    let profiles = ProfileStore::load_default().context("failed to load profiles")?;
    let client = ClientFactory::create_client(&profiles, ctx.client_options())?;
    Ok(client)
}
