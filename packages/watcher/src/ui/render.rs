//! CycleResult → StatusView の描画
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - StatusRenderer::render() の状態判定（Active / Idle / Degraded）
//! - サーバ行の内容（国コード、鍵、プレイヤーの並び順）
//!
//! ### どのような状況を想定しているか
//! - 正常系：プレイヤーのいるサーバが 1 台以上ある
//! - エッジケース：対象サーバが空、マスター失敗が閾値を超えた、国コード不明
//!
//! 乱数に依存する部分は確率 0 / 1 の設定で決定的にしてテストする。

use std::sync::Arc;

use arena_watch_shared::time::{Clock, timestamp_to_utc_rfc3339};
use rand::{Rng, seq::SliceRandom};

use super::view::{Banner, BoardState, PlayerLine, ServerLine, StatusView};
use crate::{
    config::PresentationConfig,
    domain::{CycleResult, GeoLocator, ServerSnapshot},
};

/// Returns `true` with probability 1/`n`. `n == 0` never fires.
fn one_in(rng: &mut impl Rng, n: u32) -> bool {
    n > 0 && rng.gen_range(0..n) == 0
}

/// ステータスボードの描画
pub struct StatusRenderer {
    presentation: PresentationConfig,
    degraded_threshold: u32,
    hide_empty_servers: bool,
    geo: Arc<dyn GeoLocator>,
    clock: Arc<dyn Clock>,
}

impl StatusRenderer {
    pub fn new(
        presentation: PresentationConfig,
        degraded_threshold: u32,
        hide_empty_servers: bool,
        geo: Arc<dyn GeoLocator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            presentation,
            degraded_threshold,
            hide_empty_servers,
            geo,
            clock,
        }
    }

    pub fn presentation(&self) -> &PresentationConfig {
        &self.presentation
    }

    pub fn set_presentation(&mut self, presentation: PresentationConfig) {
        self.presentation = presentation;
    }

    pub fn render(&self, result: &CycleResult, rng: &mut impl Rng) -> StatusView {
        let p = &self.presentation;

        let servers: Vec<ServerLine> = result
            .relevant_servers
            .iter()
            .filter(|server| !self.hide_empty_servers || server.human_count() > 0)
            .map(|server| self.server_line(server))
            .collect();

        let (state, thumbnail, banner) =
            if result.consecutive_master_failures > self.degraded_threshold {
                (
                    BoardState::Degraded,
                    p.thumbnails.dead.clone(),
                    Some(Banner {
                        title: p.degraded_title.clone(),
                        text: p.degraded_text.clone(),
                    }),
                )
            } else if servers.is_empty() {
                let text = if one_in(rng, p.idle_meme_one_in) {
                    p.idle_memes.choose(rng).cloned().unwrap_or_default()
                } else {
                    String::new()
                };
                let thumbnail = if one_in(rng, p.thumbnail_meme_one_in) {
                    p.thumbnails
                        .memes
                        .choose(rng)
                        .cloned()
                        .or_else(|| p.thumbnails.inactive.clone())
                } else {
                    p.thumbnails.inactive.clone()
                };
                (
                    BoardState::Idle,
                    thumbnail,
                    Some(Banner {
                        title: p.idle_title.clone(),
                        text,
                    }),
                )
            } else {
                (BoardState::Active, p.thumbnails.active.clone(), None)
            };

        StatusView {
            title: p.title.clone(),
            author: p.author.clone(),
            icon_url: p.icon_url.clone(),
            state,
            color: state.color(),
            thumbnail,
            servers,
            banner,
            footer: p.footer.clone(),
            updated_at: timestamp_to_utc_rfc3339(self.clock.now_utc_millis()),
        }
    }

    fn server_line(&self, server: &ServerSnapshot) -> ServerLine {
        let mut humans: Vec<&str> = Vec::new();
        let mut bots: Vec<&str> = Vec::new();
        for player in &server.players {
            if player.is_bot {
                bots.push(&player.name);
            } else {
                humans.push(&player.name);
            }
        }
        humans.sort_unstable();
        bots.sort_unstable();

        let players = humans
            .into_iter()
            .map(|name| PlayerLine {
                name: name.to_string(),
                is_bot: false,
            })
            .chain(bots.into_iter().map(|name| PlayerLine {
                name: name.to_string(),
                is_bot: true,
            }))
            .collect();

        let human_count = server.human_count();
        ServerLine {
            address: server.address.to_string(),
            country: self.geo.country_code(server.address.host()),
            locked: server.password_protected,
            name: server.name.clone(),
            map: server.map_name.clone(),
            online: human_count > 0,
            humans: human_count,
            players,
        }
    }
}
